use crate::Shelf;

/// Counts the interior cells (those not on the outermost ring) whose four
/// diagonal neighbours all have the same color as the cell itself.
///
/// A missing tile anywhere in the pattern means that cell doesn't count.
pub fn count_crosses(shelf: &Shelf) -> usize {
    let mut count = 0;
    for i in 1..shelf.num_rows().saturating_sub(1) {
        for j in 1..shelf.num_columns().saturating_sub(1) {
            let Some(center) = shelf.get(i, j) else {
                continue;
            };
            let diagonals = [
                shelf.get(i - 1, j - 1),
                shelf.get(i - 1, j + 1),
                shelf.get(i + 1, j - 1),
                shelf.get(i + 1, j + 1),
            ];
            if diagonals
                .iter()
                .all(|tile| tile.is_some_and(|t| t.color == center.color))
            {
                count += 1;
            }
        }
    }
    count
}
