use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How many tiles of each color the bag holds at the start of a game.
pub const TILES_PER_COLOR: usize = 22;

/// A single item tile, as drawn from the bag and placed on the board or a shelf.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub color: Color,
}

/// The color of a [tile](Tile). Every color stands for one kind of item.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Color {
    /// Cats.
    Green,
    /// Books.
    White,
    /// Games.
    Yellow,
    /// Frames.
    Blue,
    /// Trophies.
    Cyan,
    /// Plants.
    Pink,
}

pub const ALL_COLORS: [Color; 6] = [
    Color::Green,
    Color::White,
    Color::Yellow,
    Color::Blue,
    Color::Cyan,
    Color::Pink,
];

impl Tile {
    pub const fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Color {
    /// The single-letter abbreviation used in text renderings and in [`tile!`](crate::tile).
    pub fn letter(self) -> char {
        match self {
            Color::Green => 'G',
            Color::White => 'W',
            Color::Yellow => 'Y',
            Color::Blue => 'B',
            Color::Cyan => 'C',
            Color::Pink => 'P',
        }
    }
}

impl std::fmt::Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.color.letter())
    }
}

/// The error type for the [`FromStr`] instance of [`Tile`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileFromStrErr {
    NotOneChar,
    InvalidColor,
}

impl FromStr for Tile {
    type Err = TileFromStrErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return Err(TileFromStrErr::NotOneChar);
        };
        ALL_COLORS
            .into_iter()
            .find(|color| color.letter() == c.to_ascii_uppercase())
            .map(Tile::new)
            .ok_or(TileFromStrErr::InvalidColor)
    }
}

/// Shorthand for writing tiles in tests and fixtures, e.g. `tile!("G")`.
#[macro_export]
macro_rules! tile {
    ($s:literal) => {
        <$crate::Tile as ::std::str::FromStr>::from_str($s).unwrap()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tiles() {
        assert_eq!(tile!("G"), Tile::new(Color::Green));
        assert_eq!(tile!("p"), Tile::new(Color::Pink));
        assert_eq!("GG".parse::<Tile>(), Err(TileFromStrErr::NotOneChar));
        assert_eq!("X".parse::<Tile>(), Err(TileFromStrErr::InvalidColor));
    }

    #[test]
    fn letters_are_unique() {
        for (idx, a) in ALL_COLORS.iter().enumerate() {
            for b in &ALL_COLORS[idx + 1..] {
                assert_ne!(a.letter(), b.letter());
            }
        }
    }
}
