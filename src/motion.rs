//! Time-based movement of pieces between positions.

use crate::ARRIVAL_EPSILON;


/// A continuous position in board space: `x` is the column, `y` the row (negative above the board).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}
impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn of_cell(x: u32, y: u32) -> Self {
        Self::new(x as f32, y as f32)
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn lerp(&self, other: &Position, t: f32) -> Position {
        let t = t.clamp(0.0, 1.0);
        Position::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}


/// Linear interpolation from `start` to `end` over `duration` seconds, advanced once per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    pub start: Position,
    pub end: Position,
    pub elapsed: f32,
    pub duration: f32,
}
impl Motion {
    pub fn new(start: Position, end: Position, duration: f32) -> Self {
        Self {
            start,
            end,
            elapsed: 0.0,
            duration,
        }
    }

    /// Where the motion currently is.
    pub fn current(&self) -> Position {
        if self.duration <= 0.0 {
            return self.end;
        }
        self.start.lerp(&self.end, self.elapsed / self.duration)
    }

    /// Steps the motion by `dt` seconds and returns the new position.
    ///
    /// Once the interpolated position is within [`ARRIVAL_EPSILON`] of the end, the end position
    /// is returned exactly.
    pub fn advance(&mut self, dt: f32) -> Position {
        self.elapsed += dt.max(0.0);
        if self.is_reached() {
            self.end
        } else {
            self.current()
        }
    }

    pub fn is_reached(&self) -> bool {
        self.duration <= 0.0
            || self.elapsed >= self.duration
            || self.current().distance(&self.end) <= ARRIVAL_EPSILON
    }

    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }
}
