mod cross;
mod groups;

pub use cross::*;
pub use groups::*;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{InvalidGoalCheck, Player, Shelf};

/// The static definition of a common goal, as loaded from the goal configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalConfig {
    pub id: u32,
    pub description: String,
    pub pattern: GoalPattern,
}

/// The pattern a shelf must contain to accomplish a common goal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GoalPattern {
    /// At least `num_group` interior tiles whose four diagonal neighbours share their color.
    Cross { num_group: usize },
    /// At least `num_group` separate groups of `num_adjacent` or more
    /// orthogonally connected tiles of one color.
    AdjacentGroups { num_group: usize, num_adjacent: usize },
}

impl GoalPattern {
    pub fn is_satisfied_by(&self, shelf: &Shelf) -> bool {
        match *self {
            GoalPattern::Cross { num_group } => count_crosses(shelf) >= num_group,
            GoalPattern::AdjacentGroups {
                num_group,
                num_adjacent,
            } => scan_groups(shelf, num_adjacent, num_group).groups >= num_group,
        }
    }
}

/// The scoring tokens for a game with this many players, lowest first.
///
/// The last token is the one handed out first.
pub fn scoring_tokens(num_players: usize) -> Vec<u32> {
    match num_players {
        0..=2 => vec![4, 8],
        3 => vec![4, 6, 8],
        _ => vec![2, 4, 6, 8],
    }
}

/// A session-wide objective that pays out a shrinking stack of tokens to the
/// players that accomplish it, in the order they do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommonGoal {
    config: GoalConfig,
    tokens: Vec<u32>,
    accomplished: Vec<String>,
}

impl CommonGoal {
    pub fn new(config: GoalConfig, tokens: Vec<u32>) -> Self {
        Self {
            config,
            tokens,
            accomplished: Vec::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.config.id
    }

    pub fn description(&self) -> &str {
        &self.config.description
    }

    pub fn pattern(&self) -> GoalPattern {
        self.config.pattern
    }

    /// The remaining tokens, lowest first.
    pub fn tokens(&self) -> &[u32] {
        &self.tokens
    }

    /// What the next player to accomplish the goal would get.
    pub fn top_token(&self) -> u32 {
        self.tokens.last().copied().unwrap_or(0)
    }

    pub fn is_exhausted(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Nicknames of the players that accomplished the goal, in order.
    pub fn accomplished(&self) -> &[String] {
        &self.accomplished
    }

    pub fn is_accomplished_by(&self, nickname: &str) -> bool {
        self.accomplished.iter().any(|n| n == nickname)
    }

    /// Checks the player's shelf against the pattern and credits them if it matches.
    ///
    /// Returns the points awarded, or `None` if the pattern was not found.
    /// Once the token stack is empty, qualifying players are still recorded
    /// but get 0 points.
    pub fn check(&mut self, player: &mut Player) -> Result<Option<u32>, InvalidGoalCheck> {
        if self.is_accomplished_by(&player.nickname) {
            return Err(InvalidGoalCheck::AlreadyCredited {
                nickname: player.nickname.clone(),
                goal_id: self.config.id,
            });
        }
        if !self.config.pattern.is_satisfied_by(&player.shelf) {
            return Ok(None);
        }
        let points = self.tokens.pop().unwrap_or(0);
        self.accomplished.push(player.nickname.clone());
        player.shared_score += points;
        info!(
            nickname = %player.nickname,
            goal_id = self.config.id,
            points,
            "Common goal accomplished"
        );
        Ok(Some(points))
    }
}
