//! Board simulation core of a falling-block match-3 puzzle.
//!
//! Pieces are dropped into columns, runs of same-colored pieces are cleared, the rest collapse
//! under gravity and the board is re-checked until no match remains.

pub mod ai;
pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod gravity;
pub mod matching;
pub mod model;
pub mod motion;


pub use crate::config::BoardConfig;
pub use crate::engine::{BoardEngine, BoardEvent, EngineState};
pub use crate::error::{BoardError, PlacementError};
pub use crate::factory::PieceFactory;
pub use crate::matching::{MatchSet, Direction};
pub use crate::model::{ArrivalState, Color, Grid, Piece, PieceId};
pub use crate::motion::{Motion, Position};


pub const DEFAULT_WIDTH: u32 = 5;
pub const DEFAULT_HEIGHT: u32 = 7;

/// Largest accepted board width or height.
pub const MAX_DIMENSION: u32 = 256;

pub const MINIMUM_SEQUENCE: usize = 3;
pub const RUN_LENGTH: usize = 2;
pub const INITIAL_FILL_ROWS: u32 = 2;
pub const DEFAULT_POINTS_PER_PIECE: u64 = 10;
pub const DEFAULT_SNAP_SPEED: f32 = 50.0;
pub const DEFAULT_COLLAPSE_SPEED: f32 = 10.0;
pub const DEFAULT_SPAWN_HEIGHT: f32 = 4.0;
pub const DEFAULT_SPAWN_TRAVEL_TIME: f32 = 2.0;
pub const DEFAULT_SPAWN_INTERVAL: f32 = 3.0;
pub const DEFAULT_GAME_OVER_CLEAR_DELAY: f32 = 1.0;
pub const ARRIVAL_EPSILON: f32 = 0.01;

/// Row just outside the board that spawned pieces travel to and drags cannot cross.
pub const TRIGGER_ROW: f32 = -1.0;
