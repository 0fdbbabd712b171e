//! Collapsing columns after pieces have been cleared.

use crate::error::BoardError;
use crate::model::{Grid, PieceId};


/// One piece sliding down within its column.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ColumnFall {
    pub piece: PieceId,
    pub column: u32,
    pub source_row: u32,
    pub dest_row: u32,
}
impl ColumnFall {
    /// Number of rows the piece falls.
    pub fn distance(&self) -> u32 {
        self.dest_row - self.source_row
    }
}


/// The falls produced by one collapse, column by column and bottom-up within a column.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Collapse {
    pub falls: Vec<ColumnFall>,
}
impl Collapse {
    pub fn is_empty(&self) -> bool {
        self.falls.is_empty()
    }

    pub fn moved(&self) -> Vec<PieceId> {
        self.falls.iter().map(|fall| fall.piece).collect()
    }
}


fn collapse_column(grid: &mut Grid, column: u32, falls: &mut Vec<ColumnFall>) -> Result<(), BoardError> {
    for i in (1..grid.height()).rev() {
        if grid.get(column, i)?.is_some() {
            continue;
        }

        // pull down the nearest piece above the gap
        for j in (0..i).rev() {
            let piece = match grid.get(column, j)? {
                Some(piece) => piece.id(),
                None => continue,
            };
            grid.shift_down(column, j, i)?;
            falls.push(ColumnFall {
                piece,
                column,
                source_row: j,
                dest_row: i,
            });
            break;
        }
    }
    Ok(())
}


/// Lets every piece in the given columns fall into the gaps below it.
///
/// Columns outside the grid are skipped. Listing a column twice, or collapsing an already settled
/// column, produces no further falls.
pub fn collapse_columns(grid: &mut Grid, columns: &[u32]) -> Collapse {
    let mut falls = Vec::new();
    for &column in columns {
        if column >= grid.width() {
            continue;
        }
        if let Err(error) = collapse_column(grid, column, &mut falls) {
            log::error!("collapsing column {} failed: {}", column, error);
        }
    }
    Collapse { falls }
}


#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::collapse_columns;
    use crate::model::{Color, Grid, PieceId};

    fn column_colors(grid: &Grid, column: u32) -> Vec<Color> {
        grid.column_pieces(column).iter().map(|p| p.color()).collect()
    }

    #[test]
    fn test_single_gap() {
        let mut grid = Grid::from_rows(&[
            "B",
            "G",
            ".",
            "O",
        ], 1).unwrap();

        let collapse = collapse_columns(&mut grid, &[0]);
        assert_eq!(collapse.falls.len(), 2);
        assert_eq!(collapse.falls[0].piece, PieceId(2));
        assert_eq!((collapse.falls[0].source_row, collapse.falls[0].dest_row), (1, 2));
        assert_eq!(collapse.falls[1].piece, PieceId(1));
        assert_eq!((collapse.falls[1].source_row, collapse.falls[1].dest_row), (0, 1));
        assert!(collapse.falls.iter().all(|f| f.distance() == 1));

        assert!(grid.get(0, 0).unwrap().is_none());
        assert_eq!(column_colors(&grid, 0), vec![Color::Blue, Color::Green, Color::Orange]);
        for piece in grid.pieces() {
            assert_eq!(grid.get(piece.x(), piece.y()).unwrap().unwrap().id(), piece.id());
        }
    }

    #[test]
    fn test_multi_row_gap_distance() {
        let mut grid = Grid::from_rows(&[
            "Y.",
            "..",
            "..",
            "..",
        ], 1).unwrap();
        let collapse = collapse_columns(&mut grid, &[0, 1]);
        assert_eq!(collapse.falls.len(), 1);
        assert_eq!(collapse.falls[0].distance(), 3);
        assert_eq!(grid.get(0, 3).unwrap().unwrap().coords(), (0, 3));
    }

    #[test]
    fn test_only_listed_columns_collapse() {
        let mut grid = Grid::from_rows(&[
            "BG",
            "..",
        ], 1).unwrap();
        let collapse = collapse_columns(&mut grid, &[1, 7]);
        assert_eq!(collapse.moved(), vec![PieceId(2)]);
        assert!(grid.get(0, 0).unwrap().is_some());
        assert!(grid.get(1, 1).unwrap().is_some());
    }

    #[test]
    fn test_settled_column_is_idempotent() {
        let mut grid = Grid::from_rows(&[
            ".",
            "P",
            ".",
            "B",
        ], 1).unwrap();
        assert!(!collapse_columns(&mut grid, &[0]).is_empty());
        let before = grid.clone();
        assert!(collapse_columns(&mut grid, &[0, 0]).is_empty());
        assert_eq!(grid, before);
    }

    fn arb_column() -> impl Strategy<Value = Vec<char>> {
        proptest::collection::vec(prop_oneof![Just('.'), Just('B'), Just('G'), Just('Y')], 7)
    }

    proptest! {
        #[test]
        fn prop_collapse_preserves_count_and_order(column in arb_column()) {
            let rows: Vec<String> = column.iter().map(|c| c.to_string()).collect();
            let refs: Vec<&str> = rows.iter().map(|r| r.as_str()).collect();
            let mut grid = Grid::from_rows(&refs, 1).unwrap();

            let before: Vec<PieceId> = grid.column_pieces(0).iter().map(|p| p.id()).collect();
            let collapse = collapse_columns(&mut grid, &[0]);
            let after: Vec<PieceId> = grid.column_pieces(0).iter().map(|p| p.id()).collect();

            prop_assert_eq!(&before, &after);

            // everything sits at the bottom without gaps
            let height = grid.height();
            let count = after.len() as u32;
            for y in 0..height {
                prop_assert_eq!(grid.get(0, y).unwrap().is_some(), y >= height - count);
            }

            for fall in &collapse.falls {
                prop_assert!(fall.dest_row > fall.source_row);
                prop_assert_eq!(grid.get(0, fall.dest_row).unwrap().unwrap().id(), fall.piece);
            }
        }
    }
}
