use crate::Shelf;

/// Points for the player who fills their shelf first.
pub const END_GAME_TOKEN_POINTS: u32 = 1;

/// A seat in the game.
///
/// Players are never removed from a running game: going offline only makes
/// turn advancement skip them, and their shelf stays where it is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub nickname: String,
    pub online: bool,
    pub shelf: Shelf,
    /// Sum of the common-goal tokens this player collected.
    pub shared_score: u32,
    pub end_game_token: bool,
}

impl Player {
    pub fn new(nickname: &str) -> Self {
        Self {
            nickname: String::from(nickname),
            online: true,
            shelf: Shelf::new(),
            shared_score: 0,
            end_game_token: false,
        }
    }

    pub fn total_score(&self) -> u32 {
        let token = if self.end_game_token {
            END_GAME_TOKEN_POINTS
        } else {
            0
        };
        self.shared_score + self.shelf.adjacency_score() + token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_score_adds_everything() {
        let mut player = Player::new("alice");
        assert_eq!(player.total_score(), 0);
        player.shared_score = 8;
        player.end_game_token = true;
        player.shelf = "GGG.. ..... .....".parse().unwrap();
        assert_eq!(player.total_score(), 8 + 2 + 1);
    }
}
