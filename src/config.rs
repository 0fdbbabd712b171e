use crate::{
    DEFAULT_COLLAPSE_SPEED, DEFAULT_GAME_OVER_CLEAR_DELAY, DEFAULT_HEIGHT, DEFAULT_POINTS_PER_PIECE,
    DEFAULT_SNAP_SPEED, DEFAULT_SPAWN_HEIGHT, DEFAULT_SPAWN_INTERVAL, DEFAULT_SPAWN_TRAVEL_TIME,
    DEFAULT_WIDTH, INITIAL_FILL_ROWS, MAX_DIMENSION,
};
use crate::error::BoardError;


/// Tunables of a board. Speeds are in cells per second, times in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardConfig {
    pub width: u32,
    pub height: u32,
    pub points_per_piece: u64,

    /// Speed of a dropped piece snapping into its landing cell.
    pub snap_speed: f32,

    /// Speed of pieces falling into gaps after a clear.
    pub collapse_speed: f32,

    pub spawn_column: u32,

    /// How far above the trigger row new pieces appear.
    pub spawn_height: f32,
    pub spawn_travel_time: f32,
    pub spawn_interval: f32,

    /// Time between the game ending and the settled pieces being cleared away.
    pub game_over_clear_delay: f32,
}
impl BoardConfig {
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.width == 0 {
            return Err(BoardError::InvalidConfig("width must be at least 1".to_owned()));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(BoardError::InvalidConfig(format!(
                "board {}x{} is larger than {}x{}", self.width, self.height, MAX_DIMENSION, MAX_DIMENSION,
            )));
        }
        if self.height < INITIAL_FILL_ROWS {
            return Err(BoardError::InvalidConfig(format!(
                "height must be at least {}", INITIAL_FILL_ROWS,
            )));
        }
        if !(self.snap_speed > 0.0) || !(self.collapse_speed > 0.0) {
            return Err(BoardError::InvalidConfig("speeds must be positive".to_owned()));
        }
        if self.spawn_column >= self.width {
            return Err(BoardError::InvalidConfig(format!(
                "spawn column {} is outside a board {} wide", self.spawn_column, self.width,
            )));
        }
        if self.spawn_travel_time < 0.0 || self.spawn_interval < 0.0 || self.game_over_clear_delay < 0.0 {
            return Err(BoardError::InvalidConfig("times must not be negative".to_owned()));
        }
        Ok(())
    }
}
impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            points_per_piece: DEFAULT_POINTS_PER_PIECE,
            snap_speed: DEFAULT_SNAP_SPEED,
            collapse_speed: DEFAULT_COLLAPSE_SPEED,
            spawn_column: DEFAULT_WIDTH / 2,
            spawn_height: DEFAULT_SPAWN_HEIGHT,
            spawn_travel_time: DEFAULT_SPAWN_TRAVEL_TIME,
            spawn_interval: DEFAULT_SPAWN_INTERVAL,
            game_over_clear_delay: DEFAULT_GAME_OVER_CLEAR_DELAY,
        }
    }
}
