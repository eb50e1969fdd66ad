mod bag;

pub use bag::*;

use serde::{Deserialize, Serialize};

use crate::{InvalidSelection, Tile, MAX_TILES_PER_TURN};

pub const BOARD_SIZE: usize = 9;

/// Minimum number of players from which a cell of the living room is in use.
/// `0` marks cells that are never used.
const LAYOUT: [[u8; BOARD_SIZE]; BOARD_SIZE] = [
    [0, 0, 0, 3, 4, 0, 0, 0, 0],
    [0, 0, 0, 2, 2, 4, 0, 0, 0],
    [0, 0, 3, 2, 2, 2, 3, 0, 0],
    [0, 4, 2, 2, 2, 2, 2, 2, 3],
    [4, 2, 2, 2, 2, 2, 2, 2, 4],
    [3, 2, 2, 2, 2, 2, 2, 4, 0],
    [0, 0, 3, 2, 2, 2, 3, 0, 0],
    [0, 0, 0, 4, 2, 2, 0, 0, 0],
    [0, 0, 0, 0, 4, 3, 0, 0, 0],
];

/// A cell of the living-room board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    fn neighbours(self) -> [Option<Position>; 4] {
        let Position { row, column } = self;
        [
            row.checked_sub(1).map(|r| Position::new(r, column)),
            Some(Position::new(row + 1, column)),
            column.checked_sub(1).map(|c| Position::new(row, c)),
            Some(Position::new(row, column + 1)),
        ]
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// The shared living-room board that players pick tiles from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    num_players: usize,
    cells: [[Option<Tile>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// An empty board with the cells in use for this many players.
    pub fn new(num_players: usize) -> Self {
        Self {
            num_players,
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Whether the cell is part of the board for the current number of players.
    pub fn is_usable(&self, pos: Position) -> bool {
        pos.row < BOARD_SIZE
            && pos.column < BOARD_SIZE
            && LAYOUT[pos.row][pos.column] != 0
            && usize::from(LAYOUT[pos.row][pos.column]) <= self.num_players
    }

    pub fn get(&self, pos: Position) -> Option<Tile> {
        if self.is_usable(pos) {
            self.cells[pos.row][pos.column]
        } else {
            None
        }
    }

    /// Puts a tile on a usable cell, replacing whatever was there.
    ///
    /// Panics if the cell is not usable.
    pub fn place(&mut self, pos: Position, tile: Tile) {
        assert!(self.is_usable(pos), "cell {} is not in use", pos);
        self.cells[pos.row][pos.column] = Some(tile);
    }

    pub fn usable_positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..BOARD_SIZE)
            .flat_map(|row| (0..BOARD_SIZE).map(move |column| Position::new(row, column)))
            .filter(|&pos| self.is_usable(pos))
    }

    pub fn num_tiles(&self) -> usize {
        self.usable_positions()
            .filter(|&pos| self.get(pos).is_some())
            .count()
    }

    /// A tile can only be picked up if at least one of its sides is free.
    pub fn has_free_side(&self, pos: Position) -> bool {
        pos.neighbours()
            .into_iter()
            .any(|n| n.map_or(true, |n| self.get(n).is_none()))
    }

    fn has_neighbour(&self, pos: Position) -> bool {
        pos.neighbours()
            .into_iter()
            .flatten()
            .any(|n| self.get(n).is_some())
    }

    /// The board is refilled once no tile touches another one (this includes
    /// the empty board), since then only single tiles could be picked.
    pub fn needs_refill(&self) -> bool {
        self.usable_positions()
            .filter(|&pos| self.get(pos).is_some())
            .all(|pos| !self.has_neighbour(pos))
    }

    /// Fills every empty usable cell from the bag, row by row, until either
    /// the board or the bag runs out. Returns the number of tiles placed.
    pub fn refill(&mut self, bag: &mut TileBag) -> usize {
        let empty: Vec<Position> = self
            .usable_positions()
            .filter(|&pos| self.get(pos).is_none())
            .collect();
        let mut placed = 0;
        for pos in empty {
            let Some(tile) = bag.draw() else {
                break;
            };
            self.cells[pos.row][pos.column] = Some(tile);
            placed += 1;
        }
        placed
    }

    /// Checks that the tiles at these positions can be picked up together.
    ///
    /// `shelf_space` is the most tiles the picking player's shelf can take in one column.
    pub fn check_selection(
        &self,
        positions: &[Position],
        shelf_space: usize,
    ) -> Result<(), InvalidSelection> {
        if positions.is_empty() {
            return Err(InvalidSelection::NoTiles);
        }
        if positions.len() > MAX_TILES_PER_TURN {
            return Err(InvalidSelection::TooManyTiles {
                max: MAX_TILES_PER_TURN,
            });
        }
        for (idx, &pos) in positions.iter().enumerate() {
            if positions[..idx].contains(&pos) {
                return Err(InvalidSelection::Duplicate { pos });
            }
            if !self.is_usable(pos) {
                return Err(InvalidSelection::OffBoard { pos });
            }
            if self.get(pos).is_none() {
                return Err(InvalidSelection::EmptyCell { pos });
            }
            if !self.has_free_side(pos) {
                return Err(InvalidSelection::NoFreeSide { pos });
            }
        }

        let same_row = positions.iter().all(|p| p.row == positions[0].row);
        let same_column = positions.iter().all(|p| p.column == positions[0].column);
        let mut along_line: Vec<usize> = if same_row {
            positions.iter().map(|p| p.column).collect()
        } else if same_column {
            positions.iter().map(|p| p.row).collect()
        } else {
            return Err(InvalidSelection::NotInLine);
        };
        along_line.sort_unstable();
        if along_line.windows(2).any(|w| w[1] != w[0] + 1) {
            return Err(InvalidSelection::NotContiguous);
        }

        if positions.len() > shelf_space {
            return Err(InvalidSelection::NotEnoughShelfSpace {
                requested: positions.len(),
                available: shelf_space,
            });
        }
        Ok(())
    }

    /// Removes the tiles at these positions and returns them in the same order.
    ///
    /// Callers validate the positions with [`Self::check_selection()`] first.
    pub(crate) fn take(&mut self, positions: &[Position]) -> Vec<Tile> {
        positions
            .iter()
            .filter_map(|pos| self.cells[pos.row][pos.column].take())
            .collect()
    }

    /// A copy of the grid, top row first. Unused cells are `None`.
    pub fn rows(&self) -> Vec<Vec<Option<Tile>>> {
        (0..BOARD_SIZE)
            .map(|row| {
                (0..BOARD_SIZE)
                    .map(|column| self.get(Position::new(row, column)))
                    .collect()
            })
            .collect()
    }
}
