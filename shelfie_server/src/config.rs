use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use shelfie::{GoalConfig, GoalPattern};

/// How many common goals are drawn from the pool for every game.
pub const GOALS_PER_GAME: usize = 2;

/// Everything a server needs to run sessions. Passed explicitly to the lobby
/// and every session it creates.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// How often an idle connection gets a heartbeat.
    pub heartbeat_interval: Duration,
    /// A connection that sends nothing for this long counts as crashed.
    pub liveness_timeout: Duration,
    /// The pool the common goals of each game are drawn from.
    pub goals: Vec<GoalConfig>,
    /// Seed for the tile bags and goal draws. Each session derives its own RNG from it.
    pub seed: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(2),
            liveness_timeout: Duration::from_secs(10),
            goals: default_goals(),
            seed: 0,
        }
    }
}

/// Reads a JSON array of goal definitions.
pub fn load_goals(path: &Path) -> anyhow::Result<Vec<GoalConfig>> {
    let file = File::open(path)
        .with_context(|| format!("Could not open goal file {}", path.display()))?;
    let goals: Vec<GoalConfig> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Could not parse goal file {}", path.display()))?;
    anyhow::ensure!(
        goals.len() >= GOALS_PER_GAME,
        "The goal file {} needs at least {} goals",
        path.display(),
        GOALS_PER_GAME
    );
    Ok(goals)
}

pub fn default_goals() -> Vec<GoalConfig> {
    vec![
        GoalConfig {
            id: 1,
            description: String::from(
                "Six separate groups each containing at least 2 tiles of the same type.",
            ),
            pattern: GoalPattern::AdjacentGroups {
                num_group: 6,
                num_adjacent: 2,
            },
        },
        GoalConfig {
            id: 2,
            description: String::from(
                "Four separate groups each containing at least 4 tiles of the same type.",
            ),
            pattern: GoalPattern::AdjacentGroups {
                num_group: 4,
                num_adjacent: 4,
            },
        },
        GoalConfig {
            id: 3,
            description: String::from("Five tiles of the same type forming an X."),
            pattern: GoalPattern::Cross { num_group: 1 },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_goal_file_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("goals.json");
        assert_eq!(load_goals(&path).unwrap(), default_goals());
    }

    #[test]
    fn missing_goal_file() {
        let err = load_goals(Path::new("does/not/exist.json")).unwrap_err();
        assert!(err.to_string().starts_with("Could not open goal file"));
    }
}
