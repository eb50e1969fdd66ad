use crate::shelf::fill_group;
use crate::Shelf;

/// The result of [`scan_groups()`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupScan {
    /// Number of groups of at least the requested size that were found.
    pub groups: usize,
    /// Number of tiles the flood fills went through before the scan stopped.
    pub visited_tiles: usize,
}

/// Looks for separate groups of at least `min_size` orthogonally connected
/// tiles of the same color.
///
/// Cells are scanned row by row starting from the bottom row. The scan stops
/// as soon as `wanted` groups have been found.
pub fn scan_groups(shelf: &Shelf, min_size: usize, wanted: usize) -> GroupScan {
    let mut visited = vec![false; shelf.num_rows() * shelf.num_columns()];
    let mut scan = GroupScan {
        groups: 0,
        visited_tiles: 0,
    };
    for row in (0..shelf.num_rows()).rev() {
        for column in 0..shelf.num_columns() {
            let size = fill_group(shelf, &mut visited, row, column);
            scan.visited_tiles += size;
            if size > 0 && size >= min_size {
                scan.groups += 1;
            }
            if scan.groups >= wanted {
                return scan;
            }
        }
    }
    scan
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;

    use super::*;
    use crate::arbitrary::ArbitraryShelf;

    quickcheck! {
        fn visits_each_tile_at_most_once(input: ArbitraryShelf, min_size: u8) -> bool {
            let shelf = input.0;
            let scan = scan_groups(&shelf, usize::from(min_size % 6), usize::MAX);
            scan.visited_tiles <= shelf.num_rows() * shelf.num_columns()
                && scan.visited_tiles == shelf.num_tiles()
        }
    }

    #[test]
    fn stops_at_the_wanted_number_of_groups() {
        let shelf: Shelf = "..... ..... ..... ..... WW.BB GG.YY".parse().unwrap();
        let scan = scan_groups(&shelf, 2, 1);
        assert_eq!(scan.groups, 1);
        // Only the green group at the bottom left was filled
        assert_eq!(scan.visited_tiles, 2);
        let scan = scan_groups(&shelf, 2, 10);
        assert_eq!(scan.groups, 4);
        assert_eq!(scan.visited_tiles, 8);
    }

    #[test]
    fn small_groups_dont_count() {
        let shelf: Shelf = "..... ..... ..... G.... G.... GWWYY".parse().unwrap();
        assert_eq!(scan_groups(&shelf, 3, 5).groups, 1);
        assert_eq!(scan_groups(&shelf, 2, 5).groups, 3);
    }

    #[test]
    fn empty_shelf_has_no_groups() {
        assert_eq!(
            scan_groups(&Shelf::new(), 1, 1),
            GroupScan {
                groups: 0,
                visited_tiles: 0
            }
        );
    }
}
