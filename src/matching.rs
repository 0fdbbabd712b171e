//! Detection of same-colored runs and their expansion into final match sets.

use std::collections::{BTreeMap, BTreeSet};
use std::collections::btree_map::Entry;

use crate::{MINIMUM_SEQUENCE, RUN_LENGTH};
use crate::model::{Color, Grid, Piece, PieceId};


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Direction {
    /// Toward row 0.
    Up,
    Down,
    Left,
    Right,
}
impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn offset(&self) -> (i64, i64) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Member {
    pub x: u32,
    pub y: u32,
    pub color: Color,
}


/// A duplicate-free set of pieces keyed by identity.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MatchSet {
    members: BTreeMap<PieceId, Member>,
}
impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, piece: &Piece) -> bool {
        let member = Member { x: piece.x(), y: piece.y(), color: piece.color() };
        self.members.insert(piece.id(), member).is_none()
    }

    pub fn contains(&self, id: PieceId) -> bool {
        self.members.contains_key(&id)
    }

    pub fn union(&mut self, other: MatchSet) {
        self.members.extend(other.members);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PieceId, &Member)> {
        self.members.iter().map(|(id, member)| (*id, member))
    }

    pub fn ids(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.members.keys().copied()
    }

    /// The distinct columns touched by the set, ascending.
    pub fn columns(&self) -> Vec<u32> {
        let columns: BTreeSet<u32> = self.members.values().map(|m| m.x).collect();
        columns.into_iter().collect()
    }
}
impl<'a> FromIterator<&'a Piece> for MatchSet {
    fn from_iter<I: IntoIterator<Item = &'a Piece>>(iter: I) -> Self {
        let mut set = MatchSet::new();
        for piece in iter {
            set.insert(piece);
        }
        set
    }
}


/// Counts the pieces of `color` following `(x, y)` in `direction`, not counting `(x, y)` itself.
///
/// Walks at most `max_steps` steps and stops at the board edge, an empty cell or another color.
pub fn count_run(grid: &Grid, x: i64, y: i64, direction: Direction, color: Color, max_steps: usize) -> usize {
    let (dx, dy) = direction.offset();
    let mut count = 0;
    for i in 1..=max_steps as i64 {
        match grid.get_signed(x + dx * i, y + dy * i) {
            Some(next) if next.color() == color => count += 1,
            _ => break,
        }
    }
    count
}


/// Collects the run starting at `(x, y)` and continuing in `direction`, start piece included.
///
/// Returns an empty list if the run is shorter than `min_length` or there is no piece at `(x, y)`.
pub fn find_run(grid: &Grid, x: u32, y: u32, direction: Direction, min_length: usize) -> Vec<&Piece> {
    let start = match grid.get(x, y) {
        Ok(Some(piece)) => piece,
        _ => return Vec::new(),
    };

    let (dx, dy) = direction.offset();
    let mut run = vec![start];
    for i in 1..i64::from(grid.height()) {
        let next = match grid.get_signed(i64::from(x) + dx * i, i64::from(y) + dy * i) {
            Some(next) => next,
            None => break,
        };
        if next.color() != start.color() {
            break;
        }
        run.push(next);
    }

    if run.len() >= min_length {
        run
    } else {
        Vec::new()
    }
}


fn find_axis_matches(grid: &Grid, x: u32, y: u32, forward: Direction, backward: Direction) -> MatchSet {
    find_run(grid, x, y, forward, RUN_LENGTH)
        .into_iter()
        .chain(find_run(grid, x, y, backward, RUN_LENGTH))
        .collect()
}


/// Vertical and horizontal runs through `(x, y)`, unioned.
pub fn find_matches_at(grid: &Grid, x: u32, y: u32) -> MatchSet {
    let mut matches = find_axis_matches(grid, x, y, Direction::Up, Direction::Down);
    matches.union(find_axis_matches(grid, x, y, Direction::Left, Direction::Right));
    matches
}


/// The complete match containing `(x, y)`, or an empty set if it has fewer than
/// [`MINIMUM_SEQUENCE`] pieces.
///
/// Every member contributes its own runs, and so does every piece those runs pull in, which picks
/// up L, T and cross shapes as well as chains of overlapping runs as a single set.
pub fn find_final_matches(grid: &Grid, x: u32, y: u32) -> MatchSet {
    let combined = find_matches_at(grid, x, y);
    if combined.len() < RUN_LENGTH {
        return MatchSet::new();
    }

    let mut pending: Vec<Member> = combined.members.values().copied().collect();
    let mut final_matches = combined;
    while let Some(member) = pending.pop() {
        for (id, found) in find_matches_at(grid, member.x, member.y).members {
            if let Entry::Vacant(slot) = final_matches.members.entry(id) {
                slot.insert(found);
                pending.push(found);
            }
        }
    }

    if final_matches.len() >= MINIMUM_SEQUENCE {
        final_matches
    } else {
        MatchSet::new()
    }
}


#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{count_run, find_final_matches, find_matches_at, find_run, Direction, MatchSet};
    use crate::model::{Color, Grid, PieceId};

    fn ids(set: &MatchSet) -> Vec<u64> {
        set.ids().map(|PieceId(id)| id).collect()
    }

    fn arb_grid() -> impl Strategy<Value = Grid> {
        // three colors make runs frequent
        let cell = prop_oneof![Just('.'), Just('B'), Just('G'), Just('O')];
        proptest::collection::vec(proptest::collection::vec(cell, 5), 7)
            .prop_map(|rows| {
                let rows: Vec<String> = rows.into_iter().map(|r| r.into_iter().collect()).collect();
                let refs: Vec<&str> = rows.iter().map(|r| r.as_str()).collect();
                Grid::from_rows(&refs, 1).unwrap()
            })
    }

    #[test]
    fn test_find_run_directions() {
        let grid = Grid::from_rows(&[
            "..B..",
            "..B..",
            "BBBBG",
            "..B..",
        ], 1).unwrap();

        // (2, 2) is the crossing piece
        assert_eq!(find_run(&grid, 2, 2, Direction::Up, 2).len(), 3);
        assert_eq!(find_run(&grid, 2, 2, Direction::Down, 2).len(), 2);
        assert_eq!(find_run(&grid, 2, 2, Direction::Left, 2).len(), 3);
        assert_eq!(find_run(&grid, 2, 2, Direction::Right, 2).len(), 2);
        assert_eq!(find_run(&grid, 2, 2, Direction::Right, 3).len(), 0);
        assert_eq!(find_run(&grid, 4, 2, Direction::Left, 2).len(), 0);

        // starts at an empty cell or outside the board
        assert!(find_run(&grid, 0, 0, Direction::Down, 1).is_empty());
        assert!(find_run(&grid, 9, 0, Direction::Down, 1).is_empty());

        // a lone piece is a run of one
        assert_eq!(find_run(&grid, 4, 2, Direction::Up, 1).len(), 1);
    }

    #[test]
    fn test_count_run_ignores_start_cell() {
        let grid = Grid::from_rows(&[
            "BB.BB",
        ], 1).unwrap();
        assert_eq!(count_run(&grid, 2, 0, Direction::Left, Color::Blue, 4), 2);
        assert_eq!(count_run(&grid, 2, 0, Direction::Right, Color::Blue, 4), 2);
        assert_eq!(count_run(&grid, 2, 0, Direction::Right, Color::Blue, 1), 1);
        assert_eq!(count_run(&grid, 2, 0, Direction::Right, Color::Green, 4), 0);
    }

    #[test]
    fn test_vertical_and_horizontal_three() {
        let grid = Grid::from_rows(&[
            ".....",
            "..G..",
            "..G..",
            "OOGYY",
        ], 1).unwrap();

        let vertical = find_final_matches(&grid, 2, 1);
        assert_eq!(vertical.len(), 3);
        assert!(vertical.iter().all(|(_, m)| m.x == 2 && m.color == Color::Green));
        assert_eq!(vertical.columns(), vec![2]);

        // O at (0,3), (1,3): only two long, no partner
        assert!(find_final_matches(&grid, 0, 3).is_empty());
        assert!(find_final_matches(&grid, 4, 3).is_empty());
    }

    #[test]
    fn test_run_of_two_is_not_a_match() {
        let grid = Grid::from_rows(&[
            ".....",
            "BB...",
        ], 1).unwrap();
        assert_eq!(find_matches_at(&grid, 0, 1).len(), 2);
        assert!(find_final_matches(&grid, 0, 1).is_empty());
    }

    #[test]
    fn test_l_shape_is_one_set() {
        // three horizontal plus two vertical sharing the corner
        let grid = Grid::from_rows(&[
            "......",
            "Y.....",
            "Y.....",
            "YYYG..",
        ], 1).unwrap();

        for &(x, y) in &[(0, 3), (0, 1), (2, 3)] {
            let set = find_final_matches(&grid, x, y);
            assert_eq!(set.len(), 5, "from ({}, {})", x, y);
            assert_eq!(set.columns(), vec![0, 1, 2]);
        }
    }

    #[test]
    fn test_two_pairs_sharing_a_corner_expand() {
        // a vertical pair and a horizontal pair meeting at (1, 2)
        let grid = Grid::from_rows(&[
            ".....",
            ".P...",
            ".PP..",
        ], 1).unwrap();
        let set = find_final_matches(&grid, 1, 2);
        assert_eq!(set.len(), 3);

        // and from the far end of one pair the corner still pulls in the other
        let set = find_final_matches(&grid, 2, 2);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_cross_shape() {
        let grid = Grid::from_rows(&[
            ".O.",
            "OOO",
            ".O.",
        ], 1).unwrap();
        assert_eq!(find_final_matches(&grid, 1, 1).len(), 5);
        assert_eq!(find_final_matches(&grid, 1, 0).len(), 5);
    }

    #[test]
    fn test_overlapping_runs_absorbed() {
        // G's (2,0)-(2,2) vertical; (0,2)-(2,2) horizontal; (2,3) on the vertical too.
        let grid = Grid::from_rows(&[
            "..G..",
            "..G..",
            "GGG..",
            "..G..",
        ], 1).unwrap();
        let set = find_final_matches(&grid, 2, 3);
        assert_eq!(set.len(), 6);
        assert_eq!(ids(&set).len(), 6);
    }

    #[test]
    fn test_staircase_is_absorbed_through_every_step() {
        // each step only touches the previous one; (2, 3) is four absorptions away from (0, 0)
        let grid = Grid::from_rows(&[
            "B....",
            "BB...",
            ".BB..",
            "..B..",
        ], 1).unwrap();
        for &(x, y) in &[(0, 0), (1, 2), (2, 3)] {
            let set = find_final_matches(&grid, x, y);
            assert_eq!(set.len(), 6, "from ({}, {})", x, y);
            assert_eq!(set.columns(), vec![0, 1, 2]);
        }
    }

    #[test]
    fn test_absorption_stops_at_other_colors() {
        let grid = Grid::from_rows(&[
            "G....",
            "GGOO.",
            "..GO.",
        ], 1).unwrap();
        let set = find_final_matches(&grid, 0, 0);
        assert_eq!(set.len(), 3);
        assert!(set.iter().all(|(_, m)| m.color == Color::Green));

        let set = find_final_matches(&grid, 2, 1);
        assert_eq!(set.len(), 3);
        assert!(set.iter().all(|(_, m)| m.color == Color::Orange));
    }

    #[test]
    fn test_match_set_union_dedups() {
        let grid = Grid::from_rows(&[
            "BBB",
            "...",
            "...",
        ], 1).unwrap();
        let mut a = find_matches_at(&grid, 0, 0);
        let b = find_matches_at(&grid, 2, 0);
        assert_eq!(a.len(), 3);
        a.union(b);
        assert_eq!(a.len(), 3);
        assert!(a.contains(PieceId(2)));
        assert!(!a.contains(PieceId(4)));
    }

    proptest! {
        #[test]
        fn prop_run_never_leaves_its_line(grid in arb_grid(), x in 0u32..5, y in 0u32..7, dir in 0usize..4) {
            let direction = Direction::ALL[dir];
            let run = find_run(&grid, x, y, direction, 1);
            prop_assert!(run.len() <= grid.height() as usize);
            let (dx, dy) = direction.offset();
            for (i, piece) in run.iter().enumerate() {
                let i = i as i64;
                prop_assert_eq!(i64::from(piece.x()), i64::from(x) + dx * i);
                prop_assert_eq!(i64::from(piece.y()), i64::from(y) + dy * i);
                prop_assert_eq!(piece.color(), run[0].color());
            }
        }

        #[test]
        fn prop_final_matches_idempotent(grid in arb_grid(), x in 0u32..5, y in 0u32..7) {
            let first = find_final_matches(&grid, x, y);
            let second = find_final_matches(&grid, x, y);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.is_empty() || first.len() >= 3);
            if let Ok(Some(start)) = grid.get(x, y) {
                prop_assert!(first.iter().all(|(_, m)| m.color == start.color()));
                prop_assert!(first.is_empty() || first.contains(start.id()));
            } else {
                prop_assert!(first.is_empty());
            }
        }
    }
}
