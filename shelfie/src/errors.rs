use crate::{Position, TurnPhase};

/// The acting player is not allowed to do this right now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnViolation {
    NotYourTurn { current: String },
    WrongPhase { expected: TurnPhase, actual: TurnPhase },
    /// The nickname in the request is not the one bound to the connection it came from.
    IdentityMismatch { claimed: String },
    GameNotRunning,
}

impl std::error::Error for TurnViolation {}

impl std::fmt::Display for TurnViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnViolation::NotYourTurn { current } => {
                write!(f, "It is not your turn, {} is playing", current)
            }
            TurnViolation::WrongPhase { expected, actual } => write!(
                f,
                "This action is only allowed while {}, but the turn is {}",
                expected, actual
            ),
            TurnViolation::IdentityMismatch { claimed } => {
                write!(f, "This connection is not logged in as {}", claimed)
            }
            TurnViolation::GameNotRunning => write!(f, "The game is not running"),
        }
    }
}

/// The inputs of a move don't satisfy the rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidSelection {
    NoTiles,
    TooManyTiles { max: usize },
    Duplicate { pos: Position },
    OffBoard { pos: Position },
    EmptyCell { pos: Position },
    NoFreeSide { pos: Position },
    NotInLine,
    NotContiguous,
    NotEnoughShelfSpace { requested: usize, available: usize },
    ColumnOutOfRange { column: usize },
    ColumnFull { column: usize, free: usize },
    /// The tiles to insert are not the ones that were selected.
    TilesMismatch,
}

impl std::error::Error for InvalidSelection {}

impl std::fmt::Display for InvalidSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidSelection::NoTiles => write!(f, "No tiles were selected"),
            InvalidSelection::TooManyTiles { max } => {
                write!(f, "At most {} tiles can be picked in one turn", max)
            }
            InvalidSelection::Duplicate { pos } => write!(f, "The tile at {} was selected twice", pos),
            InvalidSelection::OffBoard { pos } => write!(f, "{} is not a cell of the board", pos),
            InvalidSelection::EmptyCell { pos } => write!(f, "There is no tile at {}", pos),
            InvalidSelection::NoFreeSide { pos } => {
                write!(f, "The tile at {} has no free side", pos)
            }
            InvalidSelection::NotInLine => write!(f, "The tiles are not in a straight line"),
            InvalidSelection::NotContiguous => write!(f, "The tiles are not next to each other"),
            InvalidSelection::NotEnoughShelfSpace {
                requested,
                available,
            } => write!(
                f,
                "Selected {} tiles, but no column of the shelf has room for more than {}",
                requested, available
            ),
            InvalidSelection::ColumnOutOfRange { column } => {
                write!(f, "The shelf has no column {}", column)
            }
            InvalidSelection::ColumnFull { column, free } => write!(
                f,
                "Column {} only has room for {} more tiles",
                column, free
            ),
            InvalidSelection::TilesMismatch => {
                write!(f, "The tiles to insert are not the selected tiles")
            }
        }
    }
}

/// The error type for one intent applied to the game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionError {
    TurnViolation(TurnViolation),
    InvalidSelection(InvalidSelection),
}

impl From<TurnViolation> for ActionError {
    fn from(err: TurnViolation) -> Self {
        ActionError::TurnViolation(err)
    }
}

impl From<InvalidSelection> for ActionError {
    fn from(err: InvalidSelection) -> Self {
        ActionError::InvalidSelection(err)
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ActionError::TurnViolation(err) => Some(err),
            ActionError::InvalidSelection(err) => Some(err),
        }
    }
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionError::TurnViolation(err) => write!(f, "{}", err),
            ActionError::InvalidSelection(err) => write!(f, "Invalid move: {}", err),
        }
    }
}

/// The error type for [`CommonGoal::check()`](crate::CommonGoal::check).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidGoalCheck {
    UnknownPlayer { nickname: String },
    AlreadyCredited { nickname: String, goal_id: u32 },
}

impl std::error::Error for InvalidGoalCheck {}

impl std::fmt::Display for InvalidGoalCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidGoalCheck::UnknownPlayer { nickname } => {
                write!(f, "There is no player called {}", nickname)
            }
            InvalidGoalCheck::AlreadyCredited { nickname, goal_id } => write!(
                f,
                "{} was already credited for common goal {}",
                nickname, goal_id
            ),
        }
    }
}

/// Signals from turn advancement that end the normal flow of the game.
///
/// [`PhaseSignal::EndOfRotation`] is how every game ends and must be answered
/// by computing the ranking. [`PhaseSignal::NoEligiblePlayers`] is fatal for the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseSignal {
    EndOfRotation,
    NoEligiblePlayers,
}

impl std::error::Error for PhaseSignal {}

impl std::fmt::Display for PhaseSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseSignal::EndOfRotation => write!(f, "The last round is over"),
            PhaseSignal::NoEligiblePlayers => write!(f, "Every player is offline"),
        }
    }
}

/// The error type for [`Game::new()`](crate::Game::new).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetupError {
    PlayerCount { count: usize },
    BlankNickname,
    DuplicateNickname { nickname: String },
}

impl std::error::Error for SetupError {}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::PlayerCount { count } => write!(
                f,
                "A game needs between {} and {} players, not {}",
                crate::MIN_PLAYERS,
                crate::MAX_PLAYERS,
                count
            ),
            SetupError::BlankNickname => write!(f, "Nicknames can't be blank"),
            SetupError::DuplicateNickname { nickname } => {
                write!(f, "The nickname {} is used twice", nickname)
            }
        }
    }
}
