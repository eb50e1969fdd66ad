use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use shelfie::{
    Action, ChatMessage, Game, GoalConfig, Intent, PhaseSignal, Position, SetupError, Tile,
    TurnViolation, Update, MAX_PLAYERS, MIN_PLAYERS,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::{ServerConfig, GOALS_PER_GAME};

/// Identifies one client connection for as long as the server runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The queue of updates waiting to be pushed to one connection.
pub type Outbound = mpsc::UnboundedSender<Update>;

pub enum SessionEvent {
    Intent {
        conn: ConnectionId,
        /// Where replies to this intent go.
        outbound: Outbound,
        intent: Intent,
    },
    /// The connection crashed, timed out or hung up.
    Disconnected { conn: ConnectionId },
}

/// A way to talk to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    events: mpsc::UnboundedSender<SessionEvent>,
    ended: watch::Receiver<bool>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queues an event. Returns `false` if the session is gone.
    pub fn send(&self, event: SessionEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Becomes `true` when the session is over.
    pub fn ended(&self) -> watch::Receiver<bool> {
        self.ended.clone()
    }

    /// Also `true` while a finished session is still shutting down.
    pub fn is_ended(&self) -> bool {
        self.events.is_closed() || *self.ended.borrow()
    }
}

/// Starts a new session in the waiting stage.
pub fn spawn_session(id: &str, config: Arc<ServerConfig>, rng: StdRng) -> SessionHandle {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (ended_tx, ended_rx) = watch::channel(false);
    let session = Session {
        id: String::from(id),
        config,
        rng,
        seats: Vec::new(),
        stage: Stage::Waiting { lobby_size: None },
    };
    tokio::spawn(session.run(events_rx, ended_tx));
    SessionHandle {
        id: String::from(id),
        events: events_tx,
        ended: ended_rx,
    }
}

struct Seat {
    nickname: String,
    /// `None` while the player is offline.
    conn: Option<(ConnectionId, Outbound)>,
}

enum Stage {
    Waiting { lobby_size: Option<usize> },
    /// The seats are in the same order as the players of the game.
    Playing(Game),
    Finished,
}

/// The owner of one game and everyone connected to it.
///
/// Events are handled one at a time, and every update that results from an
/// event is queued for all recipients before the next event is looked at. So
/// all clients see the same updates in the same order.
struct Session {
    id: String,
    config: Arc<ServerConfig>,
    rng: StdRng,
    seats: Vec<Seat>,
    stage: Stage,
}

fn reply(outbound: &Outbound, update: Update) {
    if outbound.send(update).is_err() {
        debug!("Dropped an update for a closed connection");
    }
}

impl Session {
    async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
        ended: watch::Sender<bool>,
    ) {
        info!(session_id = %self.id, "Session created");
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Intent {
                    conn,
                    outbound,
                    intent,
                } => self.handle_intent(conn, &outbound, intent),
                SessionEvent::Disconnected { conn } => self.disconnected(conn),
            }
            if matches!(self.stage, Stage::Finished) {
                break;
            }
        }
        // New intents are refused from here on, so the lobby starts a fresh session
        events.close();
        while let Ok(event) = events.try_recv() {
            if let SessionEvent::Intent { outbound, .. } = event {
                reply(&outbound, Update::failure("The session is over"));
            }
        }
        // Closes the update queues, so the connections can flush and stop
        self.seats.clear();
        ended.send_replace(true);
        info!(session_id = %self.id, "Session ended");
    }

    fn handle_intent(&mut self, conn: ConnectionId, outbound: &Outbound, intent: Intent) {
        let Intent {
            nickname,
            session_id,
            action,
        } = intent;
        if session_id != self.id {
            reply(
                outbound,
                Update::failure(TurnViolation::IdentityMismatch { claimed: nickname }),
            );
            return;
        }
        if action == Action::Login {
            self.login(conn, outbound, nickname);
            return;
        }

        let idx = match self.seat_of(conn) {
            Some(idx) if self.seats[idx].nickname == nickname => idx,
            _ => {
                reply(
                    outbound,
                    Update::failure(TurnViolation::IdentityMismatch { claimed: nickname }),
                );
                return;
            }
        };
        match action {
            Action::SetLobbySize { size } => self.set_lobby_size(idx, outbound, size),
            Action::SelectTiles { positions } => self.select_tiles(idx, outbound, &positions),
            Action::InsertTiles { column, tiles } => {
                self.insert_tiles(idx, outbound, column, &tiles)
            }
            Action::Chat { recipient, content } => self.chat(idx, outbound, recipient, content),
            Action::Login | Action::Ping => {}
        }
    }

    fn seat_of(&self, conn: ConnectionId) -> Option<usize> {
        self.seats
            .iter()
            .position(|seat| seat.conn.as_ref().is_some_and(|(c, _)| *c == conn))
    }

    fn broadcast(&self, update: Update) {
        for seat in &self.seats {
            if let Some((_, outbound)) = &seat.conn {
                reply(outbound, update.clone());
            }
        }
    }

    fn login(&mut self, conn: ConnectionId, outbound: &Outbound, nickname: String) {
        if nickname.trim().is_empty() {
            reply(outbound, Update::failure(SetupError::BlankNickname));
            return;
        }
        if let Some(idx) = self.seat_of(conn) {
            let message = format!("Already logged in as {}", self.seats[idx].nickname);
            reply(outbound, Update::failure(message));
            return;
        }
        match &self.stage {
            Stage::Waiting { lobby_size } => {
                let lobby_size = *lobby_size;
                self.join_waiting_room(conn, outbound, nickname, lobby_size)
            }
            Stage::Playing(_) => self.rejoin(conn, outbound, nickname),
            Stage::Finished => reply(outbound, Update::failure(TurnViolation::GameNotRunning)),
        }
    }

    fn join_waiting_room(
        &mut self,
        conn: ConnectionId,
        outbound: &Outbound,
        nickname: String,
        lobby_size: Option<usize>,
    ) {
        if self.seats.iter().any(|seat| seat.nickname == nickname) {
            let message = format!("The nickname {} is already in use", nickname);
            reply(outbound, Update::failure(message));
            return;
        }
        if self.seats.len() >= lobby_size.unwrap_or(MAX_PLAYERS) {
            reply(outbound, Update::failure("The session is full"));
            return;
        }

        info!(session_id = %self.id, %conn, nickname, "Player joined");
        self.seats.push(Seat {
            nickname: nickname.clone(),
            conn: Some((conn, outbound.clone())),
        });
        reply(
            outbound,
            Update::LoginAccepted {
                nickname,
                session_id: self.id.clone(),
            },
        );
        if self.seats.len() == 1 && lobby_size.is_none() {
            reply(outbound, Update::AskLobbySize);
        }
        self.broadcast_waiting_room();
        self.start_if_ready();
    }

    /// Gives an offline seat back to a reconnecting player.
    fn rejoin(&mut self, conn: ConnectionId, outbound: &Outbound, nickname: String) {
        let Stage::Playing(game) = &mut self.stage else {
            return;
        };
        let Some(idx) = self.seats.iter().position(|seat| seat.nickname == nickname) else {
            reply(outbound, Update::failure("The session is full"));
            return;
        };
        if self.seats[idx].conn.is_some() {
            let message = format!("The nickname {} is already in use", nickname);
            reply(outbound, Update::failure(message));
            return;
        }

        self.seats[idx].conn = Some((conn, outbound.clone()));
        game.set_online(idx, true);
        info!(session_id = %self.id, %conn, nickname, "Player reconnected");
        reply(
            outbound,
            Update::LoginAccepted {
                nickname: nickname.clone(),
                session_id: self.id.clone(),
            },
        );
        reply(outbound, Update::Snapshot { game: game.view() });
        self.broadcast(Update::PlayerReloaded { nickname });
    }

    fn set_lobby_size(&mut self, idx: usize, outbound: &Outbound, size: usize) {
        let Stage::Waiting { lobby_size } = &mut self.stage else {
            reply(outbound, Update::failure("The game has already started"));
            return;
        };
        if idx != 0 {
            reply(
                outbound,
                Update::failure("Only the first player can set the lobby size"),
            );
            return;
        }
        if lobby_size.is_some() {
            reply(outbound, Update::failure("The lobby size is already set"));
            return;
        }
        let min_size = MIN_PLAYERS.max(self.seats.len());
        if !(min_size..=MAX_PLAYERS).contains(&size) {
            let message = format!(
                "The lobby size must be between {} and {}",
                min_size, MAX_PLAYERS
            );
            reply(outbound, Update::failure(message));
            return;
        }

        *lobby_size = Some(size);
        debug!(session_id = %self.id, size, "Lobby size set");
        reply(
            outbound,
            Update::Outcome {
                success: true,
                message: format!("Waiting for {} players", size),
            },
        );
        self.broadcast_waiting_room();
        self.start_if_ready();
    }

    fn broadcast_waiting_room(&self) {
        let Stage::Waiting { lobby_size } = &self.stage else {
            return;
        };
        self.broadcast(Update::WaitingRoom {
            players: self.seats.iter().map(|seat| seat.nickname.clone()).collect(),
            lobby_size: *lobby_size,
        });
    }

    fn start_if_ready(&mut self) {
        let Stage::Waiting {
            lobby_size: Some(size),
        } = &self.stage
        else {
            return;
        };
        if self.seats.len() < *size {
            return;
        }

        let nicknames: Vec<String> = self.seats.iter().map(|seat| seat.nickname.clone()).collect();
        let goals: Vec<GoalConfig> = self
            .config
            .goals
            .choose_multiple(&mut self.rng, GOALS_PER_GAME)
            .cloned()
            .collect();
        match Game::new(&nicknames, &goals, &mut self.rng) {
            Ok(game) => {
                info!(session_id = %self.id, players = ?nicknames, "Game started");
                let view = game.view();
                let first = game.current_player().nickname.clone();
                self.stage = Stage::Playing(game);
                self.broadcast(Update::Snapshot { game: view });
                self.broadcast(Update::NewTurn {
                    nickname: first,
                    last_round: false,
                });
            }
            Err(err) => self.abort(err.to_string()),
        }
    }

    fn select_tiles(&mut self, idx: usize, outbound: &Outbound, positions: &[Position]) {
        let Stage::Playing(game) = &mut self.stage else {
            reply(outbound, Update::failure(TurnViolation::GameNotRunning));
            return;
        };
        let nickname = self.seats[idx].nickname.clone();
        match game.select_tiles(&nickname, positions) {
            Ok(tiles) => self.broadcast(Update::TilesSelected {
                nickname,
                positions: positions.to_vec(),
                tiles,
            }),
            Err(err) => {
                debug!(session_id = %self.id, nickname, %err, "Selection rejected");
                reply(outbound, Update::failure(err));
            }
        }
    }

    fn insert_tiles(&mut self, idx: usize, outbound: &Outbound, column: usize, tiles: &[Tile]) {
        let Stage::Playing(game) = &mut self.stage else {
            reply(outbound, Update::InsertOutcome { success: false });
            reply(outbound, Update::failure(TurnViolation::GameNotRunning));
            return;
        };
        let nickname = self.seats[idx].nickname.clone();
        let insertion = match game.insert_tiles(&nickname, column, tiles) {
            Ok(insertion) => insertion,
            Err(err) => {
                debug!(session_id = %self.id, nickname, %err, "Insertion rejected");
                reply(outbound, Update::InsertOutcome { success: false });
                reply(outbound, Update::failure(err));
                return;
            }
        };

        reply(outbound, Update::InsertOutcome { success: true });
        let mut updates = vec![
            Update::Board {
                board: game.board_view(),
            },
            Update::Player {
                player: game.player_view(idx),
            },
        ];
        for &(goal_id, points) in &insertion.credited {
            debug!(session_id = %self.id, nickname, goal_id, points, "Goal credited");
            if let Some(goal) = game.goal_view(goal_id) {
                updates.push(Update::CommonGoal { goal });
            }
        }
        for update in updates {
            self.broadcast(update);
        }
        self.after_advance(insertion.next);
    }

    fn chat(
        &mut self,
        idx: usize,
        outbound: &Outbound,
        recipient: Option<String>,
        content: String,
    ) {
        let message = ChatMessage {
            sender: self.seats[idx].nickname.clone(),
            recipient: recipient.clone(),
            content,
        };
        let Some(recipient) = recipient else {
            self.broadcast(Update::Chat { message });
            return;
        };
        let Some(target) = self.seats.iter().position(|seat| seat.nickname == recipient) else {
            let message = format!("There is no player called {}", recipient);
            reply(outbound, Update::failure(message));
            return;
        };

        let update = Update::Chat { message };
        reply(outbound, update.clone());
        if target != idx {
            if let Some((_, target_outbound)) = &self.seats[target].conn {
                reply(target_outbound, update);
            }
        }
    }

    fn disconnected(&mut self, conn: ConnectionId) {
        let Some(idx) = self.seat_of(conn) else {
            return;
        };
        let nickname = self.seats[idx].nickname.clone();
        match &mut self.stage {
            Stage::Waiting { lobby_size } => {
                self.seats.remove(idx);
                info!(session_id = %self.id, %conn, nickname, "Player left the waiting room");
                if self.seats.is_empty() {
                    *lobby_size = None;
                }
                if idx == 0 && lobby_size.is_none() {
                    if let Some((_, first)) = self.seats.first().and_then(|seat| seat.conn.as_ref())
                    {
                        reply(first, Update::AskLobbySize);
                    }
                }
                self.broadcast_waiting_room();
            }
            Stage::Playing(game) => {
                self.seats[idx].conn = None;
                let next = game.set_online(idx, false);
                info!(session_id = %self.id, %conn, nickname, "Player crashed");
                self.broadcast(Update::PlayerCrashed { nickname });
                if let Some(next) = next {
                    self.after_advance(next);
                }
            }
            Stage::Finished => {}
        }
    }

    /// Announces whose turn it is now, or ends the session.
    fn after_advance(&mut self, next: Result<usize, PhaseSignal>) {
        match next {
            Ok(idx) => {
                let last_round =
                    matches!(&self.stage, Stage::Playing(game) if game.turn().is_last_round());
                self.broadcast(Update::NewTurn {
                    nickname: self.seats[idx].nickname.clone(),
                    last_round,
                });
            }
            Err(PhaseSignal::EndOfRotation) => self.finish(),
            Err(signal @ PhaseSignal::NoEligiblePlayers) => self.abort(signal.to_string()),
        }
    }

    fn finish(&mut self) {
        let Stage::Playing(game) = &self.stage else {
            return;
        };
        let ranking = game.ranking();
        info!(session_id = %self.id, ?ranking, "Game over");
        self.broadcast(Update::end_game(ranking));
        self.stage = Stage::Finished;
    }

    fn abort(&mut self, reason: String) {
        error!(session_id = %self.id, reason, "Session aborted");
        self.broadcast(Update::SessionAborted { reason });
        self.stage = Stage::Finished;
    }
}
