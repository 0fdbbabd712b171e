use std::fmt;
use std::str::FromStr;

use crate::error::BoardError;
use crate::motion::{Motion, Position};


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Color {
    Blue,
    Green,
    Orange,
    Yellow,
    Purple,
}
impl Color {
    pub const ALL: [Color; 5] = [
        Color::Blue, Color::Green, Color::Orange,
        Color::Yellow, Color::Purple,
    ];

    pub fn symbol(&self) -> char {
        match self {
            Self::Blue => 'B',
            Self::Green => 'G',
            Self::Orange => 'O',
            Self::Yellow => 'Y',
            Self::Purple => 'P',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        Self::ALL.iter()
            .copied()
            .find(|color| color.symbol() == symbol.to_ascii_uppercase())
    }
}
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_symbol(c)
                .ok_or_else(|| format!("unknown color symbol {:?}", c)),
            _ => Err(format!("expected a single color symbol, got {:?}", s)),
        }
    }
}


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PieceId(pub u64);
impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}


#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ArrivalState {
    #[default] Settled,
    Moving(Motion),
}
impl ArrivalState {
    pub fn is_settled(&self) -> bool {
        match self {
            Self::Settled => true,
            _ => false,
        }
    }

    pub fn is_moving(&self) -> bool {
        match self {
            Self::Moving(_) => true,
            _ => false,
        }
    }

    pub fn motion(&self) -> Option<&Motion> {
        match self {
            Self::Moving(motion) => Some(motion),
            _ => None,
        }
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct Piece {
    id: PieceId,
    color: Color,
    x: u32,
    y: u32,
    position: Position,
    state: ArrivalState,
}
impl Piece {
    pub fn new(id: PieceId, color: Color, position: Position) -> Self {
        Self {
            id,
            color,
            x: 0,
            y: 0,
            position,
            state: ArrivalState::Settled,
        }
    }

    pub fn id(&self) -> PieceId { self.id }
    pub fn color(&self) -> Color { self.color }
    pub fn x(&self) -> u32 { self.x }
    pub fn y(&self) -> u32 { self.y }
    pub fn coords(&self) -> (u32, u32) { (self.x, self.y) }
    pub fn position(&self) -> Position { self.position }
    pub fn state(&self) -> &ArrivalState { &self.state }

    pub(crate) fn set_coords(&mut self, x: u32, y: u32) {
        self.x = x;
        self.y = y;
    }

    /// Teleports the piece, cancelling any motion. Used while the piece is being dragged.
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
        self.state = ArrivalState::Settled;
    }

    /// Starts moving from the current position to `destination` over `duration` seconds.
    pub fn move_to(&mut self, destination: Position, duration: f32) {
        self.state = ArrivalState::Moving(Motion::new(self.position, destination, duration));
    }

    /// Stops an in-progress motion where it is.
    pub fn stop(&mut self) {
        self.state = ArrivalState::Settled;
    }

    /// Advances the motion by `dt` seconds; returns whether the piece has reached its destination.
    pub fn advance(&mut self, dt: f32) -> bool {
        if let ArrivalState::Moving(motion) = &mut self.state {
            self.position = motion.advance(dt);
            if motion.is_reached() {
                self.state = ArrivalState::Settled;
            }
        }
        self.is_reached()
    }

    pub fn is_reached(&self) -> bool {
        self.state.is_settled()
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Option<Piece>>,
}
impl Grid {
    pub fn new(width: u32, height: u32) -> Self {
        let cells = (0..width as usize * height as usize).map(|_| None).collect();
        Self {
            width,
            height,
            cells,
        }
    }

    /// Builds a grid from rows of color symbols, top row first; `.` marks an empty cell.
    ///
    /// Pieces get consecutive ids starting at `first_id`, in row-major order.
    pub fn from_rows(rows: &[&str], first_id: u64) -> Result<Self, BoardError> {
        let height = u32::try_from(rows.len())
            .map_err(|_| BoardError::InvalidConfig("too many rows".to_owned()))?;
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let width = u32::try_from(width)
            .map_err(|_| BoardError::InvalidConfig("row too long".to_owned()))?;

        let mut grid = Grid::new(width, height);
        let mut next_id = first_id;
        for (y, row) in (0..height).zip(rows) {
            if row.chars().count() != width as usize {
                return Err(BoardError::InvalidConfig(format!("row {} has the wrong length", y)));
            }
            for (x, symbol) in (0..width).zip(row.chars()) {
                if symbol == '.' {
                    continue;
                }
                let color = Color::from_symbol(symbol)
                    .ok_or_else(|| BoardError::InvalidConfig(format!("unknown color {:?}", symbol)))?;
                let piece = Piece::new(PieceId(next_id), color, Position::of_cell(x, y));
                next_id += 1;
                grid.place(x, y, piece)?;
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && x < i64::from(self.width)
            && y >= 0 && y < i64::from(self.height)
    }

    fn index(&self, x: u32, y: u32) -> Result<usize, BoardError> {
        if x >= self.width || y >= self.height {
            return Err(BoardError::out_of_bounds(x, y));
        }
        Ok((y * self.width + x) as usize)
    }

    pub fn get(&self, x: u32, y: u32) -> Result<Option<&Piece>, BoardError> {
        let index = self.index(x, y)?;
        Ok(self.cells[index].as_ref())
    }

    pub fn get_mut(&mut self, x: u32, y: u32) -> Result<Option<&mut Piece>, BoardError> {
        let index = self.index(x, y)?;
        Ok(self.cells[index].as_mut())
    }

    /// Returns the piece at a signed coordinate, or `None` if it is off the board or empty.
    pub fn get_signed(&self, x: i64, y: i64) -> Option<&Piece> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.cells[(y * i64::from(self.width) + x) as usize].as_ref()
    }

    /// Puts a piece into an empty cell and updates its grid coordinates.
    pub fn place(&mut self, x: u32, y: u32, mut piece: Piece) -> Result<(), BoardError> {
        let index = self.index(x, y)?;
        if self.cells[index].is_some() {
            return Err(BoardError::CellOccupied { x, y });
        }
        piece.set_coords(x, y);
        self.cells[index] = Some(piece);
        Ok(())
    }

    pub fn remove(&mut self, x: u32, y: u32) -> Result<Option<Piece>, BoardError> {
        let index = self.index(x, y)?;
        Ok(self.cells[index].take())
    }

    /// Moves the piece at `(column, from_row)` down to the empty `(column, to_row)`.
    pub(crate) fn shift_down(&mut self, column: u32, from_row: u32, to_row: u32) -> Result<(), BoardError> {
        let piece = self.remove(column, from_row)?
            .ok_or(BoardError::out_of_bounds(column, from_row))?;
        self.place(column, to_row, piece)
    }

    pub fn is_top_row_blocked(&self, column: u32) -> Result<bool, BoardError> {
        Ok(self.get(column, 0)?.is_some())
    }

    /// The row a piece dropped into `column` lands on, if the column has room.
    pub fn lowest_empty_row(&self, column: u32) -> Result<Option<u32>, BoardError> {
        self.index(column, 0)?;
        for y in (0..self.height).rev() {
            if self.get(column, y)?.is_none() {
                return Ok(Some(y));
            }
        }
        Ok(None)
    }

    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.cells.iter().filter_map(|cell| cell.as_ref())
    }

    pub fn pieces_mut(&mut self) -> impl Iterator<Item = &mut Piece> {
        self.cells.iter_mut().filter_map(|cell| cell.as_mut())
    }

    /// The pieces of one column, top to bottom.
    pub fn column_pieces(&self, column: u32) -> Vec<&Piece> {
        (0..self.height)
            .filter_map(|y| self.get(column, y).ok().flatten())
            .collect()
    }

    pub fn find(&self, id: PieceId) -> Option<&Piece> {
        self.pieces().find(|piece| piece.id() == id)
    }

    pub fn occupied_count(&self) -> usize {
        self.pieces().count()
    }

    /// Height of the stack in `column`, counted from the bottom row to the first gap.
    pub fn tower_height(&self, column: u32) -> u32 {
        let mut tower_height = 0;
        for y in (0..self.height).rev() {
            match self.get(column, y) {
                Ok(Some(_)) => tower_height += 1,
                _ => break,
            }
        }
        tower_height
    }

    /// Empties the grid, returning every piece that was on it.
    pub fn clear(&mut self) -> Vec<Piece> {
        self.cells.iter_mut().filter_map(|cell| cell.take()).collect()
    }

    /// Returns an iterator over all the (x, y) coordinates of the grid.
    pub fn coords(&self) -> GridCoords { GridCoords::new(self.width, self.height) }
}
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\u{250C}")?;
        for _ in 0..self.width {
            write!(f, "\u{2500}")?;
        }
        writeln!(f, "\u{2510}")?;

        for y in 0..self.height {
            write!(f, "\u{2502}")?;
            for x in 0..self.width {
                match self.get(x, y).map_err(|_| fmt::Error)? {
                    None => write!(f, " ")?,
                    Some(piece) => write!(f, "{}", piece.color())?,
                }
            }
            writeln!(f, "\u{2502}")?;
        }

        write!(f, "\u{2514}")?;
        for _ in 0..self.width {
            write!(f, "\u{2500}")?;
        }
        writeln!(f, "\u{2518}")?;

        Ok(())
    }
}


pub struct GridCoords {
    index: usize,
    length: usize,
    grid_width: u32,
}
impl GridCoords {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            index: 0,
            length: width as usize * height as usize,
            grid_width: width,
        }
    }

    fn coords_for_index(&self, index: usize) -> (u32, u32) {
        let index = index as u32;
        let x = index % self.grid_width;
        let y = index / self.grid_width;
        (x, y)
    }
}
impl Iterator for GridCoords {
    type Item = (u32, u32);

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.index >= self.length {
            (0, Some(0))
        } else {
            let remaining = self.length - self.index;
            (remaining, Some(remaining))
        }
    }

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.length {
            return None;
        }

        let coords = self.coords_for_index(self.index);
        self.index += 1;
        Some(coords)
    }
}
impl ExactSizeIterator for GridCoords {
}
impl DoubleEndedIterator for GridCoords {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.index >= self.length {
            return None;
        }

        self.length -= 1;
        let coords = self.coords_for_index(self.length);
        Some(coords)
    }
}
