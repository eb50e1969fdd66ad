use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::{
    scoring_tokens, ActionError, Board, BoardView, CommonGoal, GameView, GoalConfig, GoalView,
    InvalidGoalCheck, InvalidSelection, PhaseSignal, Player, PlayerView, Position, Rank,
    SetupError, Shelf, Tile, TileBag, TurnPhase, TurnState, TurnViolation,
};

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;

/// What happened after a successful insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Insertion {
    /// `(goal id, points)` for every common goal the player accomplished just now.
    pub credited: Vec<(u32, u32)>,
    pub refilled: bool,
    pub last_round_started: bool,
    /// The seat whose turn it is now, or why there is none.
    pub next: Result<usize, PhaseSignal>,
}

/// A running game: the players, the board and bag, the common goals and the turn.
///
/// All rule checks happen here. A method that returns an error leaves the game unchanged.
#[derive(Clone, Debug)]
pub struct Game {
    players: Vec<Player>,
    board: Board,
    bag: TileBag,
    goals: Vec<CommonGoal>,
    turn: TurnState,
    /// Positions picked in the current turn. They stay on the board until insertion.
    selection: Vec<Position>,
    over: bool,
}

impl Game {
    pub fn new(
        nicknames: &[String],
        goals: &[GoalConfig],
        rng: &mut StdRng,
    ) -> Result<Self, SetupError> {
        Self::with_bag(nicknames, goals, TileBag::new(rng))
    }

    /// Like [`Self::new()`], but draws from the given bag.
    pub fn with_bag(
        nicknames: &[String],
        goals: &[GoalConfig],
        mut bag: TileBag,
    ) -> Result<Self, SetupError> {
        let count = nicknames.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return Err(SetupError::PlayerCount { count });
        }
        for (idx, nickname) in nicknames.iter().enumerate() {
            if nickname.trim().is_empty() {
                return Err(SetupError::BlankNickname);
            }
            if nicknames[..idx].contains(nickname) {
                return Err(SetupError::DuplicateNickname {
                    nickname: nickname.clone(),
                });
            }
        }

        let mut board = Board::new(count);
        board.refill(&mut bag);
        let goals = goals
            .iter()
            .map(|config| CommonGoal::new(config.clone(), scoring_tokens(count)))
            .collect();
        Ok(Self {
            players: nicknames.iter().map(|n| Player::new(n)).collect(),
            board,
            bag,
            goals,
            turn: TurnState::new(count),
            selection: Vec::new(),
            over: false,
        })
    }

    /// Replaces the shelves of the first players, in seat order, e.g. to
    /// resume from a known position.
    pub fn with_shelves(mut self, shelves: impl IntoIterator<Item = Shelf>) -> Self {
        for (player, shelf) in self.players.iter_mut().zip(shelves) {
            player.shelf = shelf;
        }
        self
    }

        pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn bag(&self) -> &TileBag {
        &self.bag
    }

    pub fn goals(&self) -> &[CommonGoal] {
        &self.goals
    }

    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.turn.current()]
    }

    pub fn selection(&self) -> &[Position] {
        &self.selection
    }

    /// Whether the game has ended, either normally or because everyone left.
    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn player_index(&self, nickname: &str) -> Option<usize> {
        self.players.iter().position(|p| p.nickname == nickname)
    }

    fn ensure_turn(&self, nickname: &str, phase: TurnPhase) -> Result<usize, TurnViolation> {
        if self.over {
            return Err(TurnViolation::GameNotRunning);
        }
        let current = &self.current_player().nickname;
        let idx = self
            .player_index(nickname)
            .ok_or_else(|| TurnViolation::NotYourTurn {
                current: current.clone(),
            })?;
        self.turn.ensure_turn(idx, phase, current)?;
        Ok(idx)
    }

    /// Picks up to three tiles from the board. Returns the tiles, in the order
    /// of the positions.
    pub fn select_tiles(
        &mut self,
        nickname: &str,
        positions: &[Position],
    ) -> Result<Vec<Tile>, ActionError> {
        let idx = self.ensure_turn(nickname, TurnPhase::Picking)?;
        self.board
            .check_selection(positions, self.players[idx].shelf.max_insertable())?;
        self.selection = positions.to_vec();
        self.turn.tiles_selected();
        debug!(nickname, ?positions, "Tiles selected");
        Ok(self.selected_tiles())
    }

    fn selected_tiles(&self) -> Vec<Tile> {
        self.selection
            .iter()
            .filter_map(|&pos| self.board.get(pos))
            .collect()
    }

    /// Puts the selected tiles into a column of the player's shelf and ends the turn.
    ///
    /// `tiles` must be the selected tiles, in the order they should go in.
    pub fn insert_tiles(
        &mut self,
        nickname: &str,
        column: usize,
        tiles: &[Tile],
    ) -> Result<Insertion, ActionError> {
        let idx = self.ensure_turn(nickname, TurnPhase::Inserting)?;

        let mut expected = self.selected_tiles();
        let mut given = tiles.to_vec();
        expected.sort_unstable();
        given.sort_unstable();
        if expected != given {
            return Err(InvalidSelection::TilesMismatch.into());
        }
        self.players[idx].shelf.insert(column, tiles)?;
        self.board.take(&self.selection);
        self.selection.clear();
        debug!(nickname, column, "Tiles inserted");

        let credited = self.check_goals_for(idx);

        let mut last_round_started = false;
        if self.players[idx].shelf.is_full() && !self.turn.is_last_round() {
            self.players[idx].end_game_token = true;
            last_round_started = self.turn.trigger_last_round();
            info!(nickname, "Shelf full, last round started");
        }

        let mut refilled = false;
        if self.board.needs_refill() && !self.bag.is_empty() {
            let placed = self.board.refill(&mut self.bag);
            debug!(placed, left = self.bag.len(), "Board refilled");
            refilled = placed > 0;
        }
        if self.goals.iter().all(CommonGoal::is_exhausted)
            && self.board.needs_refill()
            && self.bag.is_empty()
            && self.turn.trigger_last_round()
        {
            info!("Out of tiles and goals, last round started");
            last_round_started = true;
        }

        let next = self.advance();
        Ok(Insertion {
            credited,
            refilled,
            last_round_started,
            next,
        })
    }

    /// Checks every common goal the player hasn't accomplished yet against
    /// their shelf. Returns `(goal id, points)` for each newly accomplished one.
    pub fn check_goals(&mut self, nickname: &str) -> Result<Vec<(u32, u32)>, InvalidGoalCheck> {
        let idx = self
            .player_index(nickname)
            .ok_or_else(|| InvalidGoalCheck::UnknownPlayer {
                nickname: String::from(nickname),
            })?;
        Ok(self.check_goals_for(idx))
    }

    fn check_goals_for(&mut self, idx: usize) -> Vec<(u32, u32)> {
        let player = &mut self.players[idx];
        let mut credited = Vec::new();
        for goal in &mut self.goals {
            if goal.is_accomplished_by(&player.nickname) {
                continue;
            }
            if let Ok(Some(points)) = goal.check(player) {
                credited.push((goal.id(), points));
            }
        }
        credited
    }

    /// Marks a seat as online or offline.
    ///
    /// If the player whose turn it is goes offline, their selection is
    /// dropped and the turn moves on; the result of that is returned.
    /// Coming back online never gives a player a turn out of order.
    pub fn set_online(&mut self, idx: usize, online: bool) -> Option<Result<usize, PhaseSignal>> {
        self.players[idx].online = online;
        if online || self.over || idx != self.turn.current() {
            return None;
        }
        self.selection.clear();
        self.turn.reset_phase();
        Some(self.advance())
    }

    fn advance(&mut self) -> Result<usize, PhaseSignal> {
        let online: Vec<bool> = self.players.iter().map(|p| p.online).collect();
        let next = self.turn.advance(&online);
        if next.is_err() {
            self.over = true;
        }
        next
    }

    /// All players by total score, highest first. Ties keep the seat order.
    pub fn ranking(&self) -> Vec<Rank> {
        let mut ranking: Vec<Rank> = self
            .players
            .iter()
            .map(|p| Rank {
                nickname: p.nickname.clone(),
                total_score: p.total_score(),
            })
            .collect();
        ranking.sort_by(|a, b| b.total_score.cmp(&a.total_score));
        ranking
    }

    pub fn view(&self) -> GameView {
        GameView {
            players: (0..self.players.len()).map(|idx| self.player_view(idx)).collect(),
            board: self.board_view(),
            goals: self.goals.iter().map(goal_view).collect(),
            current_player: self.current_player().nickname.clone(),
            phase: self.turn.phase(),
            selection: self.selection.clone(),
            last_round: self.turn.is_last_round(),
        }
    }

    pub fn board_view(&self) -> BoardView {
        BoardView {
            cells: self.board.rows(),
            tiles_in_bag: self.bag.len(),
        }
    }

    pub fn player_view(&self, idx: usize) -> PlayerView {
        let player = &self.players[idx];
        PlayerView {
            nickname: player.nickname.clone(),
            online: player.online,
            shelf: player.shelf.rows(),
            shared_score: player.shared_score,
            end_game_token: player.end_game_token,
        }
    }

    pub fn goal_view(&self, goal_id: u32) -> Option<GoalView> {
        self.goals.iter().find(|g| g.id() == goal_id).map(goal_view)
    }
}

fn goal_view(goal: &CommonGoal) -> GoalView {
    GoalView {
        id: goal.id(),
        description: String::from(goal.description()),
        top_token: goal.top_token(),
        tokens_left: goal.tokens().len(),
        accomplished: goal.accomplished().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::{tile, GoalPattern, Shelf, ALL_COLORS};

    fn nicknames(names: &[&str]) -> Vec<String> {
        names.iter().map(|&n| String::from(n)).collect()
    }

    fn cross_goal() -> GoalConfig {
        GoalConfig {
            id: 10,
            description: String::from("Five tiles of the same type forming an X."),
            pattern: GoalPattern::Cross { num_group: 1 },
        }
    }

    /// A game whose board holds only green tiles.
    fn green_game(names: &[&str]) -> Game {
        let bag = TileBag::from_tiles(vec![tile!("G"); 60]);
        Game::with_bag(&nicknames(names), &[cross_goal()], bag).unwrap()
    }

    /// Picks and inserts the single tile at `pos` for the current player.
    fn play_single(game: &mut Game, pos: Position, column: usize) -> Insertion {
        let nickname = game.current_player().nickname.clone();
        let tiles = game.select_tiles(&nickname, &[pos]).unwrap();
        game.insert_tiles(&nickname, column, &tiles).unwrap()
    }

    #[test]
    fn setup_validation() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(
            Game::new(&nicknames(&["a"]), &[], &mut rng).unwrap_err(),
            SetupError::PlayerCount { count: 1 }
        );
        assert_eq!(
            Game::new(&nicknames(&["a", "b", "c", "d", "e"]), &[], &mut rng).unwrap_err(),
            SetupError::PlayerCount { count: 5 }
        );
        assert_eq!(
            Game::new(&nicknames(&["a", " "]), &[], &mut rng).unwrap_err(),
            SetupError::BlankNickname
        );
        assert_eq!(
            Game::new(&nicknames(&["a", "a"]), &[], &mut rng).unwrap_err(),
            SetupError::DuplicateNickname {
                nickname: String::from("a")
            }
        );

        let game = Game::new(&nicknames(&["a", "b", "c"]), &[cross_goal()], &mut rng).unwrap();
        assert_eq!(game.board().num_tiles(), 37);
        assert_eq!(game.bag().len(), 132 - 37);
        assert_eq!(game.goals()[0].tokens(), [4, 6, 8]);
        assert_eq!(game.current_player().nickname, "a");
        assert_eq!(game.turn().phase(), TurnPhase::Picking);
    }

    #[test]
    fn turn_order_is_enforced() {
        let mut game = green_game(&["a", "b"]);
        let pos = Position::new(1, 3);
        assert_eq!(
            game.select_tiles("b", &[pos]),
            Err(ActionError::TurnViolation(TurnViolation::NotYourTurn {
                current: String::from("a")
            }))
        );
        assert_eq!(
            game.insert_tiles("a", 0, &[tile!("G")]),
            Err(ActionError::TurnViolation(TurnViolation::WrongPhase {
                expected: TurnPhase::Inserting,
                actual: TurnPhase::Picking
            }))
        );
        let insertion = play_single(&mut game, pos, 0);
        assert_eq!(insertion.next, Ok(1));
        assert_eq!(game.board().get(pos), None);
        assert_eq!(game.players()[0].shelf.get(5, 0), Some(tile!("G")));
    }

    #[test]
    fn failed_insertion_changes_nothing() {
        let mut game = green_game(&["a", "b"]);
        let positions = [Position::new(1, 3), Position::new(1, 4)];
        game.select_tiles("a", &positions).unwrap();
        let before = game.clone();

        assert_eq!(
            game.insert_tiles("a", 7, &[tile!("G"), tile!("G")]),
            Err(ActionError::InvalidSelection(
                InvalidSelection::ColumnOutOfRange { column: 7 }
            ))
        );
        assert_eq!(
            game.insert_tiles("a", 0, &[tile!("G")]),
            Err(ActionError::InvalidSelection(InvalidSelection::TilesMismatch))
        );
        assert_eq!(game.board(), before.board());
        assert_eq!(game.players(), before.players());
        assert_eq!(game.turn(), before.turn());
        assert_eq!(game.selection(), positions);

        game.insert_tiles("a", 0, &[tile!("G"), tile!("G")]).unwrap();
        assert_eq!(game.players()[0].shelf.num_tiles(), 2);
    }

    #[test]
    fn cross_goal_is_credited_on_insertion() {
        let mut game = green_game(&["a", "b"]);
        // Everything but the top-right corner of an X, which is the only free cell of column 2
        game.players[0].shelf = "G.... .GW.. G.G.. W.W.. ..... .....".parse().unwrap();
        let insertion = play_single(&mut game, Position::new(1, 3), 2);
        assert_eq!(insertion.credited, [(10, 8)]);
        assert_eq!(game.players()[0].shared_score, 8);
        assert_eq!(game.goals()[0].tokens(), [4]);
        assert_eq!(
            game.goal_view(10).unwrap().accomplished,
            [String::from("a")]
        );
    }

    #[test]
    fn offline_player_is_skipped() {
        let mut game = green_game(&["a", "b", "c"]);
        // "b" crashes while "a" is picking
        assert_eq!(game.set_online(1, false), None);
        let insertion = play_single(&mut game, Position::new(1, 3), 0);
        assert_eq!(insertion.next, Ok(2));
        // Back online, but not before their next scheduled turn
        assert_eq!(game.set_online(1, true), None);
        assert_eq!(game.current_player().nickname, "c");
        let insertion = play_single(&mut game, Position::new(1, 4), 0);
        assert_eq!(insertion.next, Ok(0));
        let insertion = play_single(&mut game, Position::new(2, 2), 1);
        assert_eq!(insertion.next, Ok(1));
    }

    #[test]
    fn current_player_going_offline_drops_selection() {
        let mut game = green_game(&["a", "b"]);
        game.select_tiles("a", &[Position::new(1, 3)]).unwrap();
        assert_eq!(game.set_online(0, false), Some(Ok(1)));
        assert!(game.selection().is_empty());
        assert_eq!(game.turn().phase(), TurnPhase::Picking);
        assert!(game.board().get(Position::new(1, 3)).is_some());
        assert_eq!(
            game.set_online(1, false),
            Some(Err(PhaseSignal::NoEligiblePlayers))
        );
        assert!(game.is_over());
        assert_eq!(
            game.select_tiles("b", &[Position::new(1, 3)]),
            Err(ActionError::TurnViolation(TurnViolation::GameNotRunning))
        );
    }

    #[test]
    fn last_player_fills_shelf_and_game_ends() {
        let mut game = green_game(&["a", "b", "c"]);
        let almost_full = "....W WWWWW WWWWW WWWWW WWWWW WWWWW";
        game.players[2].shelf = almost_full.parse().unwrap();
        play_single(&mut game, Position::new(1, 3), 0);
        play_single(&mut game, Position::new(1, 4), 0);
        let insertion = play_single(&mut game, Position::new(2, 2), 0);
        assert!(insertion.last_round_started);
        assert!(game.players()[2].shelf.is_full());
        assert!(game.players()[2].end_game_token);
        assert_eq!(insertion.next, Ok(0));

        play_single(&mut game, Position::new(2, 3), 1);
        let insertion = play_single(&mut game, Position::new(2, 4), 1);
        assert!(!insertion.last_round_started);
        assert_eq!(insertion.next, Err(PhaseSignal::EndOfRotation));
        assert!(game.is_over());

        // "c": one white group of 29 and the token; "a" and "b": two greens each
        let ranking = game.ranking();
        assert_eq!(ranking[0].nickname, "c");
        assert_eq!(ranking[0].total_score, 8 + 1);
        assert_eq!(ranking[1].nickname, "a");
        assert_eq!(ranking[2].nickname, "b");
        assert_eq!(ranking[1].total_score, ranking[2].total_score);
    }

    #[test]
    fn board_is_refilled_when_tiles_are_isolated() {
        let mut game = green_game(&["a", "b"]);
        let bag_before = game.bag().len();
        // Only one pair of neighbouring tiles is left
        let keep = [
            Position::new(1, 3),
            Position::new(1, 4),
            Position::new(3, 2),
            Position::new(5, 5),
        ];
        let to_remove: Vec<Position> = game
            .board()
            .usable_positions()
            .filter(|pos| !keep.contains(pos))
            .collect();
        game.board.take(&to_remove);
        assert!(!game.board().needs_refill());

        let insertion = play_single(&mut game, Position::new(1, 3), 0);
        assert!(insertion.refilled);
        assert_eq!(game.board().num_tiles(), 29);
        assert_eq!(game.bag().len(), bag_before - 26);
    }

    #[test]
    fn exhausted_goals_and_empty_bag_start_last_round() {
        let bag = TileBag::from_tiles(
            ALL_COLORS
                .iter()
                .map(|&color| Tile::new(color))
                .cycle()
                .take(29)
                .collect(),
        );
        let mut game = Game::with_bag(&nicknames(&["a", "b"]), &[], bag).unwrap();
        assert!(game.bag().is_empty());
        // Only two neighbouring tiles left
        let to_remove: Vec<Position> = game
            .board()
            .usable_positions()
            .filter(|&pos| pos != Position::new(1, 3) && pos != Position::new(1, 4))
            .collect();
        game.board.take(&to_remove);

        let insertion = play_single(&mut game, Position::new(1, 3), 0);
        assert!(insertion.last_round_started);
        assert_eq!(insertion.next, Ok(1));
        let insertion = play_single(&mut game, Position::new(1, 4), 0);
        assert_eq!(insertion.next, Err(PhaseSignal::EndOfRotation));
    }

    #[test]
    fn check_goals_for_unknown_player() {
        let mut game = green_game(&["a", "b"]);
        assert_eq!(
            game.check_goals("zed"),
            Err(InvalidGoalCheck::UnknownPlayer {
                nickname: String::from("zed")
            })
        );
        assert_eq!(game.check_goals("a"), Ok(vec![]));
    }

    #[test]
    fn view_matches_state() {
        let game = green_game(&["a", "b"]);
        let view = game.view();
        assert_eq!(view.players.len(), 2);
        assert_eq!(view.current_player, "a");
        assert_eq!(view.phase, TurnPhase::Picking);
        assert!(!view.last_round);
        assert_eq!(view.board.tiles_in_bag, 60 - 29);
        assert_eq!(view.players[0].shelf, Shelf::new().rows());
        assert_eq!(view.goals[0].top_token, 8);
        assert!(view.selection.is_empty());
    }

    #[test]
    fn view_shows_pending_selection() {
        let mut game = green_game(&["a", "b"]);
        let positions = [Position::new(1, 3), Position::new(1, 4)];
        game.select_tiles("a", &positions).unwrap();
        let view = game.view();
        assert_eq!(view.phase, TurnPhase::Inserting);
        assert_eq!(view.selection, positions);
    }

    #[test]
    fn prepared_shelves_replace_empty_ones() {
        let shelf: Shelf = "..... ..... ..... ..... ..... GGGGG".parse().unwrap();
        let game = green_game(&["a", "b"]).with_shelves([shelf.clone()]);
        assert_eq!(game.players()[0].shelf, shelf);
        assert_eq!(game.players()[1].shelf, Shelf::new());
    }
}
