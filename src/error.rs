use thiserror::Error;

use crate::engine::EngineState;
use crate::model::Piece;


#[derive(Clone, Debug, Error, PartialEq)]
pub enum BoardError {
    #[error("cell ({x}, {y}) is outside the board")]
    OutOfBounds { x: i64, y: i64 },

    #[error("cell ({x}, {y}) is already occupied")]
    CellOccupied { x: u32, y: u32 },

    /// The column's top row was occupied when a piece had to land there. Ends the game.
    #[error("column {column} is topped out")]
    TopOut { column: u32 },

    #[error("a placement is still being resolved (state {state:?})")]
    Busy { state: EngineState },

    #[error("the game is over")]
    GameOver,

    #[error("invalid board configuration: {0}")]
    InvalidConfig(String),
}
impl BoardError {
    pub(crate) fn out_of_bounds<X: Into<i64>, Y: Into<i64>>(x: X, y: Y) -> Self {
        Self::OutOfBounds { x: x.into(), y: y.into() }
    }
}


/// A placement the board turned down. The piece goes back to the caller.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("piece {} was not placed: {}", .piece.id(), .error)]
pub struct PlacementError {
    pub error: BoardError,
    pub piece: Piece,
}
