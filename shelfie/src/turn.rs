use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{PhaseSignal, TurnViolation};

/// The step of the current player's turn.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPhase {
    /// Choosing tiles from the board.
    Picking,
    /// Putting the chosen tiles into the shelf.
    Inserting,
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnPhase::Picking => write!(f, "picking"),
            TurnPhase::Inserting => write!(f, "inserting"),
        }
    }
}

/// Whose turn it is and how far along it is.
///
/// This only holds indices into the player list; liveness is passed in by the
/// caller, so every transition is a plain function of this state and its inputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnState {
    num_players: usize,
    current: usize,
    phase: TurnPhase,
    /// Index of the player whose turn triggered the last round.
    last_round_trigger: Option<usize>,
}

impl TurnState {
    /// The first player starts picking.
    ///
    /// Panics if there are no players.
    pub fn new(num_players: usize) -> Self {
        assert!(num_players > 0);
        Self {
            num_players,
            current: 0,
            phase: TurnPhase::Picking,
            last_round_trigger: None,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_last_round(&self) -> bool {
        self.last_round_trigger.is_some()
    }

    pub fn last_round_trigger(&self) -> Option<usize> {
        self.last_round_trigger
    }

    /// Checks that `player` may act in `phase` right now.
    pub fn ensure_turn(
        &self,
        player: usize,
        phase: TurnPhase,
        current_nickname: &str,
    ) -> Result<(), TurnViolation> {
        if player != self.current {
            return Err(TurnViolation::NotYourTurn {
                current: String::from(current_nickname),
            });
        }
        if phase != self.phase {
            return Err(TurnViolation::WrongPhase {
                expected: phase,
                actual: self.phase,
            });
        }
        Ok(())
    }

    /// `Picking → Inserting`.
    pub fn tiles_selected(&mut self) {
        debug_assert_eq!(self.phase, TurnPhase::Picking);
        self.phase = TurnPhase::Inserting;
    }

    /// Drops back to `Picking` without changing the player, e.g. when the
    /// selection has to be discarded.
    pub fn reset_phase(&mut self) {
        self.phase = TurnPhase::Picking;
    }

    /// Starts the last round, with the current player as the trigger.
    ///
    /// Returns `false` if the last round had already started.
    pub fn trigger_last_round(&mut self) -> bool {
        if self.last_round_trigger.is_some() {
            return false;
        }
        debug!(trigger = self.current, "Last round triggered");
        self.last_round_trigger = Some(self.current);
        true
    }

    /// Moves the turn to the next online player and resets the phase to `Picking`.
    ///
    /// During the last round, getting back around to the player who triggered it
    /// ends the game with [`PhaseSignal::EndOfRotation`]. If nobody is online,
    /// the result is [`PhaseSignal::NoEligiblePlayers`].
    ///
    /// Panics if `online` doesn't have one entry per player.
    pub fn advance(&mut self, online: &[bool]) -> Result<usize, PhaseSignal> {
        assert_eq!(online.len(), self.num_players);
        for step in 1..=self.num_players {
            let idx = (self.current + step) % self.num_players;
            if self.last_round_trigger == Some(idx) {
                return Err(PhaseSignal::EndOfRotation);
            }
            if online[idx] {
                self.current = idx;
                self.phase = TurnPhase::Picking;
                return Ok(idx);
            }
        }
        Err(PhaseSignal::NoEligiblePlayers)
    }
}
