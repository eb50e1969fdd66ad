use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::{Tile, ALL_COLORS, TILES_PER_COLOR};

/// The tiles that have not been put on the board yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileBag {
    tiles: Vec<Tile>,
}

impl TileBag {
    /// A full, shuffled bag.
    pub fn new(rng: &mut StdRng) -> Self {
        let mut tiles: Vec<Tile> = ALL_COLORS
            .iter()
            .flat_map(|&color| std::iter::repeat(Tile::new(color)).take(TILES_PER_COLOR))
            .collect();
        tiles.shuffle(rng);
        Self { tiles }
    }

    /// A bag holding exactly these tiles. The last tile is drawn first.
    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        Self { tiles }
    }

    pub fn draw(&mut self) -> Option<Tile> {
        self.tiles.pop()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
