use std::str::FromStr;

use crate::{InvalidSelection, Tile};

pub const SHELF_ROWS: usize = 6;
pub const SHELF_COLUMNS: usize = 5;
/// No more than this many tiles can be picked up in one turn.
pub const MAX_TILES_PER_TURN: usize = 3;

/// A player's private grid of tiles.
///
/// Row 0 is the top of the shelf and the last row is the bottom. Tiles that are
/// inserted into a column fall down to the lowest free cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shelf {
    rows: usize,
    columns: usize,
    /// Row-major, `rows * columns` entries.
    cells: Vec<Option<Tile>>,
}

impl Default for Shelf {
    fn default() -> Self {
        Self::new()
    }
}

impl Shelf {
    /// An empty shelf with the standard dimensions.
    pub fn new() -> Self {
        Self::with_dimensions(SHELF_ROWS, SHELF_COLUMNS)
    }

    /// An empty shelf with custom dimensions.
    ///
    /// Panics if either dimension is zero.
    pub fn with_dimensions(rows: usize, columns: usize) -> Self {
        assert!(rows > 0 && columns > 0);
        Self {
            rows,
            columns,
            cells: vec![None; rows * columns],
        }
    }

    /// Creates a shelf from a list of rows, top row first.
    ///
    /// Panics if the rows are empty or don't all have the same length.
    pub fn from_rows(rows: &[Vec<Option<Tile>>]) -> Self {
        assert!(!rows.is_empty() && !rows[0].is_empty());
        let columns = rows[0].len();
        assert!(rows.iter().all(|row| row.len() == columns));
        Self {
            rows: rows.len(),
            columns,
            cells: rows.iter().flatten().copied().collect(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns
    }

    /// The tile at the given cell. Cells outside the shelf are treated as empty.
    pub fn get(&self, row: usize, column: usize) -> Option<Tile> {
        if row < self.rows && column < self.columns {
            self.cells[row * self.columns + column]
        } else {
            None
        }
    }

    /// Number of empty cells above the topmost tile of the column.
    pub fn free_cells_in_column(&self, column: usize) -> usize {
        (0..self.rows)
            .take_while(|&row| self.get(row, column).is_none())
            .count()
    }

    /// The most tiles that could currently be inserted into any one column.
    pub fn max_insertable(&self) -> usize {
        (0..self.columns)
            .map(|column| self.free_cells_in_column(column))
            .max()
            .unwrap_or(0)
            .min(MAX_TILES_PER_TURN)
    }

    pub fn num_tiles(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Drops the tiles into the column, in order: the first tile ends up lowest.
    ///
    /// Nothing is changed if the column doesn't exist or can't take all tiles.
    pub fn insert(&mut self, column: usize, tiles: &[Tile]) -> Result<(), InvalidSelection> {
        if column >= self.columns {
            return Err(InvalidSelection::ColumnOutOfRange { column });
        }
        let free = self.free_cells_in_column(column);
        if free < tiles.len() {
            return Err(InvalidSelection::ColumnFull { column, free });
        }
        for (offset, &tile) in tiles.iter().enumerate() {
            let row = free - 1 - offset;
            self.cells[row * self.columns + column] = Some(tile);
        }
        Ok(())
    }

    /// A copy of the grid, top row first.
    pub fn rows(&self) -> Vec<Vec<Option<Tile>>> {
        self.cells.chunks(self.columns).map(<[_]>::to_vec).collect()
    }

    /// Points for the groups of same-colored adjacent tiles, counted at the end of the game.
    pub fn adjacency_score(&self) -> u32 {
        let mut visited = vec![false; self.cells.len()];
        let mut score = 0;
        for row in 0..self.rows {
            for column in 0..self.columns {
                score += match fill_group(self, &mut visited, row, column) {
                    0..=2 => 0,
                    3 => 2,
                    4 => 3,
                    5 => 5,
                    _ => 8,
                };
            }
        }
        score
    }
}

/// Flood-fills the group of same-colored tiles containing `(row, column)`
/// along the four orthogonal directions and returns its size.
///
/// Every tile of the group is marked in `visited` (row-major, one entry per
/// cell). Returns 0 and marks nothing new if the cell is empty or was already
/// visited, so repeated calls never count a tile twice.
pub(crate) fn fill_group(shelf: &Shelf, visited: &mut [bool], row: usize, column: usize) -> usize {
    let Some(Tile { color }) = shelf.get(row, column) else {
        return 0;
    };
    let idx = |row: usize, column: usize| row * shelf.columns + column;
    if visited[idx(row, column)] {
        return 0;
    }

    let mut count = 0;
    let mut stack = vec![(row, column)];
    visited[idx(row, column)] = true;
    while let Some((i, j)) = stack.pop() {
        count += 1;
        let neighbours = [
            (i.wrapping_sub(1), j),
            (i + 1, j),
            (i, j.wrapping_sub(1)),
            (i, j + 1),
        ];
        for (ni, nj) in neighbours {
            // Out-of-range coordinates (including wrapped ones) read as empty
            if shelf.get(ni, nj).is_some_and(|tile| tile.color == color)
                && !visited[idx(ni, nj)]
            {
                visited[idx(ni, nj)] = true;
                stack.push((ni, nj));
            }
        }
    }
    count
}

/// The error type for the [`FromStr`] instance of [`Shelf`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShelfFromStrErr {
    NoRows,
    RaggedRows,
    InvalidTile { row: usize, column: usize },
}

/// Parses whitespace-separated rows, top row first, with `.` for an empty cell,
/// e.g. `"G.... GW... GWB.."`.
impl FromStr for Shelf {
    type Err = ShelfFromStrErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rows = Vec::new();
        for (row, line) in s.split_whitespace().enumerate() {
            let cells = line
                .chars()
                .enumerate()
                .map(|(column, c)| match c {
                    '.' => Ok(None),
                    _ => Tile::from_str(c.encode_utf8(&mut [0; 4]))
                        .map(Some)
                        .map_err(|_| ShelfFromStrErr::InvalidTile { row, column }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(cells);
        }
        if rows.is_empty() || rows[0].is_empty() {
            return Err(ShelfFromStrErr::NoRows);
        }
        if rows.iter().any(|row| row.len() != rows[0].len()) {
            return Err(ShelfFromStrErr::RaggedRows);
        }
        Ok(Shelf::from_rows(&rows))
    }
}

impl std::fmt::Display for Shelf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            for cell in row {
                match cell {
                    Some(tile) => write!(f, "{}", tile)?,
                    None => write!(f, ".")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;

    use super::*;
    use crate::arbitrary::ArbitraryShelf;
    use crate::tile;

    quickcheck! {
        fn groups_partition_the_tiles(input: ArbitraryShelf) -> bool {
            let shelf = input.0;
            let mut visited = vec![false; shelf.num_rows() * shelf.num_columns()];
            let mut total = 0;
            for row in (0..shelf.num_rows()).rev() {
                for column in 0..shelf.num_columns() {
                    total += fill_group(&shelf, &mut visited, row, column);
                }
            }
            total == shelf.num_tiles()
        }
    }

    #[test]
    fn insert_falls_to_the_bottom() {
        let mut shelf = Shelf::new();
        shelf.insert(2, &[tile!("G"), tile!("W")]).unwrap();
        assert_eq!(shelf.get(5, 2), Some(tile!("G")));
        assert_eq!(shelf.get(4, 2), Some(tile!("W")));
        assert_eq!(shelf.free_cells_in_column(2), 4);
        shelf.insert(2, &[tile!("Y")]).unwrap();
        assert_eq!(shelf.get(3, 2), Some(tile!("Y")));
    }

    #[test]
    fn insert_into_full_column_changes_nothing() {
        let mut shelf: Shelf = "G.... W.... Y.... B.... C.... P....".parse().unwrap();
        let before = shelf.clone();
        assert_eq!(
            shelf.insert(0, &[tile!("G")]),
            Err(InvalidSelection::ColumnFull { column: 0, free: 0 })
        );
        assert_eq!(
            shelf.insert(5, &[tile!("G")]),
            Err(InvalidSelection::ColumnOutOfRange { column: 5 })
        );
        assert_eq!(shelf, before);
    }

    #[test]
    fn max_insertable_is_capped() {
        let shelf = Shelf::new();
        assert_eq!(shelf.max_insertable(), MAX_TILES_PER_TURN);
        let shelf: Shelf = "..... G.GGG GGGGG GGGGG GGGGG GGGGG".parse().unwrap();
        assert_eq!(shelf.max_insertable(), 2);
        assert!(!shelf.is_full());
    }

    #[test]
    fn parse_and_display() {
        let text = "G.... WG... YWG..";
        let shelf: Shelf = text.parse().unwrap();
        assert_eq!(shelf.num_rows(), 3);
        assert_eq!(shelf.to_string(), "G....\nWG...\nYWG..\n");
        assert_eq!("G.. W".parse::<Shelf>(), Err(ShelfFromStrErr::RaggedRows));
        assert_eq!(
            "G.X".parse::<Shelf>(),
            Err(ShelfFromStrErr::InvalidTile { row: 0, column: 2 })
        );
    }

    #[test]
    fn adjacency_score_counts_groups() {
        // A group of 3 greens (2 points) and a group of 4 pinks (3 points)
        let shelf: Shelf = "GG... G.PP. ..PP.".parse().unwrap();
        assert_eq!(shelf.adjacency_score(), 5);
        // One group covering the whole shelf
        let shelf: Shelf = "BBB BBB BBB".parse().unwrap();
        assert_eq!(shelf.adjacency_score(), 8);
    }
}
