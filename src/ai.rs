use crate::gravity::collapse_columns;
use crate::matching::{find_final_matches, MatchSet};
use crate::model::{Color, Grid, Piece, PieceId};
use crate::motion::Position;


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BestMove {
    pub column: u32,
    pub rating: i64,
}


/// Clears `(x, y)`'s match and every cascade following from it, without any motion.
///
/// Returns the number of pieces cleared.
pub fn resolve_instantly(grid: &mut Grid, x: u32, y: u32) -> usize {
    let mut cleared = 0;
    let mut matches = find_final_matches(grid, x, y);
    while !matches.is_empty() {
        cleared += matches.len();
        for (_id, member) in matches.iter() {
            if let Err(error) = grid.remove(member.x, member.y) {
                log::error!("simulated clear failed: {}", error);
            }
        }

        let collapse = collapse_columns(grid, &matches.columns());
        let mut next_matches = MatchSet::new();
        for fall in &collapse.falls {
            next_matches.union(find_final_matches(grid, fall.column, fall.dest_row));
        }
        matches = next_matches;
    }
    cleared
}


fn count_pairs(grid: &Grid) -> i64 {
    let mut pairs = 0;
    for piece in grid.pieces() {
        let (x, y) = (i64::from(piece.x()), i64::from(piece.y()));
        for (dx, dy) in [(1, 0), (0, 1)] {
            if let Some(neighbor) = grid.get_signed(x + dx, y + dy) {
                if neighbor.color() == piece.color() {
                    pairs += 1;
                }
            }
        }
    }
    pairs
}


fn rate_grid(grid: &Grid, cleared: usize) -> i64 {
    const CLEARED_WEIGHT: i64 = 4;
    const PAIR_WEIGHT: i64 = 1;
    const MAX_TOWER_HEIGHT_WEIGHT: i64 = -3;

    let mut total_rating = i64::try_from(cleared).unwrap_or(i64::MAX / 2) * CLEARED_WEIGHT;

    // pairs can still grow into matches with later pieces
    total_rating += count_pairs(grid) * PAIR_WEIGHT;

    let max_tower_height = (0..grid.width())
        .map(|x| grid.tower_height(x))
        .max()
        .unwrap_or(0);
    total_rating += i64::from(max_tower_height) * MAX_TOWER_HEIGHT_WEIGHT;

    total_rating
}


/// Picks the column where a piece of `color` does the most good. Ties go to the leftmost column.
///
/// Returns `None` if every column is topped out.
pub fn pick_best_column(grid: &Grid, color: Color) -> Option<BestMove> {
    let mut best: Option<BestMove> = None;
    for column in 0..grid.width() {
        // a topped-out column ends the game
        if grid.is_top_row_blocked(column).unwrap_or(true) {
            continue;
        }
        let row = match grid.lowest_empty_row(column) {
            Ok(Some(row)) => row,
            _ => continue,
        };

        let mut simulated = grid.clone();
        let probe = Piece::new(PieceId(u64::MAX), color, Position::of_cell(column, row));
        if simulated.place(column, row, probe).is_err() {
            continue;
        }
        let cleared = resolve_instantly(&mut simulated, column, row);
        let rating = rate_grid(&simulated, cleared);

        if best.map_or(true, |b| rating > b.rating) {
            best = Some(BestMove { column, rating });
        }
    }
    best
}


#[cfg(test)]
mod tests {
    use super::{pick_best_column, resolve_instantly};
    use crate::model::{Color, Grid};

    #[test]
    fn test_prefers_completing_a_match() {
        let grid = Grid::from_rows(&[
            ".....",
            ".....",
            ".....",
            "...GY",
            "..OOG",
        ], 1).unwrap();
        let best = pick_best_column(&grid, Color::Orange).unwrap();
        assert_eq!(best.column, 1);
    }

    #[test]
    fn test_avoids_topped_out_columns() {
        let grid = Grid::from_rows(&[
            "BGB",
            "GBG",
            "OYO",
        ], 1).unwrap();
        assert_eq!(pick_best_column(&grid, Color::Purple), None);

        let grid = Grid::from_rows(&[
            "B.B",
            "G.G",
            "OYO",
        ], 1).unwrap();
        assert_eq!(pick_best_column(&grid, Color::Purple).unwrap().column, 1);
    }

    #[test]
    fn test_resolve_instantly_cascades() {
        let mut grid = Grid::from_rows(&[
            ".....",
            ".GG..",
            "BBBGG",
        ], 1).unwrap();
        assert_eq!(resolve_instantly(&mut grid, 0, 2), 7);
        assert_eq!(grid.occupied_count(), 0);

        let mut grid = Grid::from_rows(&[
            "..",
            "BG",
        ], 1).unwrap();
        assert_eq!(resolve_instantly(&mut grid, 0, 1), 0);
        assert_eq!(grid.occupied_count(), 2);
    }
}
