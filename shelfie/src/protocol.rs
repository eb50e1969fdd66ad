use serde::{Deserialize, Serialize};

use crate::{Position, Tile, TurnPhase};

/// A request from a client.
///
/// Every intent names the player and session it claims to come from. On the
/// wire, the fields of the [`Action`] sit next to these two, e.g.
/// `{"nickname":"alice","session_id":"s1","type":"SelectTiles","positions":[...]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub nickname: String,
    pub session_id: String,
    #[serde(flatten)]
    pub action: Action,
}

impl Intent {
    pub fn new(nickname: &str, session_id: &str, action: Action) -> Self {
        Self {
            nickname: String::from(nickname),
            session_id: String::from(session_id),
            action,
        }
    }
}

/// What a client wants to do.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    /// Join the session, or take back a seat after a crash.
    Login,
    /// Only the first player in the waiting room may send this.
    SetLobbySize { size: usize },
    SelectTiles { positions: Vec<Position> },
    /// The tiles must be the selected ones, in the order they should be
    /// inserted (the first one ends up lowest).
    InsertTiles { column: usize, tiles: Vec<Tile> },
    /// A message to everyone, or only to `recipient`.
    Chat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recipient: Option<String>,
        content: String,
    },
    /// Keep-alive. Clients should send this whenever they get a [`Update::Heartbeat`].
    Ping,
}

/// A state delta or notification pushed to a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Update {
    LoginAccepted {
        nickname: String,
        session_id: String,
    },
    /// Sent to the first player of a session, who decides how many players to wait for.
    AskLobbySize,
    WaitingRoom {
        players: Vec<String>,
        lobby_size: Option<usize>,
    },
    /// The full state of the game, sent at the start and on reconnect.
    Snapshot { game: GameView },
    Board { board: BoardView },
    Player { player: PlayerView },
    CommonGoal { goal: GoalView },
    Chat { message: ChatMessage },
    NewTurn { nickname: String, last_round: bool },
    TilesSelected {
        nickname: String,
        positions: Vec<Position>,
        tiles: Vec<Tile>,
    },
    InsertOutcome { success: bool },
    /// The result of a request, sent only to the client that made it.
    Outcome { success: bool, message: String },
    EndGame {
        /// Highest score first.
        ranking: Vec<Rank>,
        winners: Vec<String>,
    },
    PlayerCrashed { nickname: String },
    PlayerReloaded { nickname: String },
    SessionAborted { reason: String },
    Heartbeat,
}

impl Update {
    pub fn failure(message: impl std::fmt::Display) -> Self {
        Update::Outcome {
            success: false,
            message: message.to_string(),
        }
    }

    pub fn end_game(ranking: Vec<Rank>) -> Self {
        let winners = Rank::winners(&ranking)
            .iter()
            .map(|rank| rank.nickname.clone())
            .collect();
        Update::EndGame { ranking, winners }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: String,
    /// `None` for a message to everyone.
    pub recipient: Option<String>,
    pub content: String,
}

/// One line of the final ranking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    pub nickname: String,
    pub total_score: u32,
}

impl Rank {
    /// Everybody tied for first place. Expects a ranking sorted by score, highest first.
    pub fn winners(ranking: &[Rank]) -> &[Rank] {
        let Some(first) = ranking.first() else {
            return ranking;
        };
        let num_winners = ranking
            .iter()
            .take_while(|rank| rank.total_score == first.total_score)
            .count();
        &ranking[..num_winners]
    }
}

/// The living-room board, top row first. Unused and empty cells are both `null`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    pub cells: Vec<Vec<Option<Tile>>>,
    pub tiles_in_bag: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub nickname: String,
    pub online: bool,
    /// Top row first.
    pub shelf: Vec<Vec<Option<Tile>>>,
    pub shared_score: u32,
    pub end_game_token: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalView {
    pub id: u32,
    pub description: String,
    /// What the next player to accomplish the goal gets.
    pub top_token: u32,
    pub tokens_left: usize,
    pub accomplished: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub players: Vec<PlayerView>,
    pub board: BoardView,
    pub goals: Vec<GoalView>,
    pub current_player: String,
    pub phase: TurnPhase,
    /// Tiles the current player picked and has yet to insert.
    pub selection: Vec<Position>,
    pub last_round: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile;

    #[test]
    fn intent_wire_format() {
        let intent = Intent::new(
            "alice",
            "s1",
            Action::InsertTiles {
                column: 2,
                tiles: vec![tile!("G"), tile!("P")],
            },
        );
        let json = serde_json::to_string(&intent).unwrap();
        assert_eq!(
            json,
            r#"{"nickname":"alice","session_id":"s1","type":"InsertTiles","column":2,"tiles":[{"color":"green"},{"color":"pink"}]}"#
        );
        assert_eq!(serde_json::from_str::<Intent>(&json).unwrap(), intent);

        let ping: Intent =
            serde_json::from_str(r#"{"type":"Ping","nickname":"bob","session_id":"s1"}"#).unwrap();
        assert_eq!(ping.action, Action::Ping);

        let chat: Intent = serde_json::from_str(
            r#"{"type":"Chat","nickname":"bob","session_id":"s1","content":"hi"}"#,
        )
        .unwrap();
        assert_eq!(
            chat.action,
            Action::Chat {
                recipient: None,
                content: String::from("hi")
            }
        );
    }

    #[test]
    fn winners_include_ties() {
        let rank = |nickname: &str, total_score| Rank {
            nickname: String::from(nickname),
            total_score,
        };
        let ranking = vec![rank("a", 12), rank("b", 12), rank("c", 3)];
        assert_eq!(Rank::winners(&ranking), &ranking[..2]);
        assert!(Rank::winners(&[]).is_empty());

        let Update::EndGame { winners, .. } = Update::end_game(ranking) else {
            unreachable!()
        };
        assert_eq!(winners, ["a", "b"]);
    }
}
