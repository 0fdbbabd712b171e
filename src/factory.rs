use rand::{Rng, SeedableRng};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;

use crate::MINIMUM_SEQUENCE;
use crate::matching::{count_run, Direction};
use crate::model::{Color, Grid, Piece, PieceId};
use crate::motion::Position;


/// Hands out pieces with unique ids and random colors.
#[derive(Clone, Debug)]
pub struct PieceFactory {
    rng: StdRng,
    color_distribution: Uniform<usize>,
    next_id: u64,
}
impl PieceFactory {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            color_distribution: Uniform::new(0, Color::ALL.len()),
            next_id: 1,
        }
    }

    pub fn from_seed(seed_integer: u128) -> Self {
        let mut rng_seed = [0u8; 32];
        rng_seed[0..128/8].copy_from_slice(&seed_integer.to_be_bytes());
        Self::new(StdRng::from_seed(rng_seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    fn next_id(&mut self) -> PieceId {
        let id = PieceId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Makes sure every id handed out from now on is greater than `id`.
    pub fn skip_past(&mut self, id: PieceId) {
        self.next_id = self.next_id.max(id.0.saturating_add(1));
    }

    fn random_color(&mut self) -> Color {
        Color::ALL[self.color_distribution.sample(&mut self.rng)]
    }

    /// Creates a piece of a given color at `(x, y)`.
    pub fn create(&mut self, color: Color, x: u32, y: u32) -> Piece {
        let id = self.next_id();
        Piece::new(id, color, Position::of_cell(x, y))
    }

    /// Creates a piece with a random color, positioned at the cell `(x, y)`.
    ///
    /// With `no_initial_match`, colors that would complete a run with the two pieces to the left of
    /// `(x, y)` are rejected and re-rolled. Only the left side is inspected, so a board can be
    /// filled column by column without looking at columns that do not exist yet.
    pub fn generate(&mut self, grid: &Grid, x: u32, y: u32, no_initial_match: bool) -> Piece {
        let mut color = self.random_color();
        if no_initial_match && x >= 2 {
            while Self::completes_left_run(grid, x, y, color) {
                color = self.random_color();
            }
        }
        self.create(color, x, y)
    }

    fn completes_left_run(grid: &Grid, x: u32, y: u32, color: Color) -> bool {
        let look_back = MINIMUM_SEQUENCE - 1;
        count_run(grid, i64::from(x), i64::from(y), Direction::Left, color, look_back) >= look_back
    }

    /// Picks a uniformly random column; used when a piece is dragged far past the board.
    pub fn random_column(&mut self, width: u32) -> u32 {
        self.rng.gen_range(0..width.max(1))
    }
}
