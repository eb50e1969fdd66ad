use quickcheck::{Arbitrary, Gen};

use crate::{Color, Shelf, Tile, ALL_COLORS};

impl Arbitrary for Color {
    fn arbitrary(g: &mut Gen) -> Self {
        *g.choose(&ALL_COLORS).unwrap()
    }
}

impl Arbitrary for Tile {
    fn arbitrary(g: &mut Gen) -> Self {
        Tile::new(Color::arbitrary(g))
    }
}

/// A shelf of random size with random tiles.
///
/// The tiles don't respect gravity, and each shelf only uses a few colors so
/// that groups and crosses actually show up.
#[derive(Clone, Debug)]
pub struct ArbitraryShelf(pub Shelf);

impl Arbitrary for ArbitraryShelf {
    fn arbitrary(g: &mut Gen) -> Self {
        let num_rows = usize::from(u8::arbitrary(g) % 7) + 1;
        let num_columns = usize::from(u8::arbitrary(g) % 6) + 1;
        let num_colors = usize::from(u8::arbitrary(g) % 3) + 1;
        let palette = &ALL_COLORS[..num_colors];

        let rows: Vec<Vec<Option<Tile>>> = (0..num_rows)
            .map(|_| {
                (0..num_columns)
                    .map(|_| {
                        if u8::arbitrary(g) % 4 == 0 {
                            None
                        } else {
                            Some(Tile::new(*g.choose(palette).unwrap()))
                        }
                    })
                    .collect()
            })
            .collect();
        ArbitraryShelf(Shelf::from_rows(&rows))
    }
}
