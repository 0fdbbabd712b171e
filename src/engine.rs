//! The board state machine: placement, match resolution, collapse and cascades.

use std::collections::BTreeSet;

use crate::{INITIAL_FILL_ROWS, TRIGGER_ROW};
use crate::config::BoardConfig;
use crate::error::{BoardError, PlacementError};
use crate::factory::PieceFactory;
use crate::gravity::collapse_columns;
use crate::matching::{find_final_matches, MatchSet};
use crate::model::{Color, Grid, Piece, PieceId};
use crate::motion::Position;


#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum EngineState {
    /// Nothing is happening; placements are accepted.
    Idle,

    /// A spawned piece is in flight; placements are accepted.
    AwaitingPlacement,

    /// A placed piece is landing or its matches are being looked up.
    ResolvingMatches,

    /// Pieces are falling into the gaps left by a clear.
    Collapsing,

    GameOver,
}
impl EngineState {
    pub fn accepts_placement(&self) -> bool {
        match self {
            Self::Idle | Self::AwaitingPlacement => true,
            _ => false,
        }
    }

    pub fn is_resolving(&self) -> bool {
        match self {
            Self::ResolvingMatches | Self::Collapsing => true,
            _ => false,
        }
    }
}


#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ClearedPiece {
    pub id: PieceId,
    pub x: u32,
    pub y: u32,
    pub color: Color,
}


/// What the engine reports to whoever renders the board.
#[derive(Clone, Debug, PartialEq)]
pub enum BoardEvent {
    PieceSpawned { piece: PieceId, column: u32, position: Position },
    PieceMoveStart { piece: PieceId, destination: Position, duration: f32 },
    MatchCleared { pieces: Vec<ClearedPiece> },
    ScoreChanged(u64),
    GameOver { final_score: u64 },

    /// Spawned pieces that had not been placed when the game ended; drop them.
    InFlightCleared(Vec<PieceId>),

    /// The settled pieces have been removed after a game over.
    BoardCleared,
    BoardReset,
}


#[derive(Clone, Debug, Default, PartialEq)]
enum Resolution {
    #[default] Nothing,
    Landing(PieceId),
    Settling(Vec<PieceId>),
}


pub struct BoardEngine {
    config: BoardConfig,
    grid: Grid,
    factory: PieceFactory,
    state: EngineState,
    resolution: Resolution,
    score: u64,
    in_flight: BTreeSet<PieceId>,
    spawn_timer: f32,
    game_over_timer: Option<f32>,
    events: Vec<BoardEvent>,
}
impl BoardEngine {
    pub fn new(config: BoardConfig, factory: PieceFactory) -> Result<Self, BoardError> {
        config.validate()?;
        let grid = Grid::new(config.width, config.height);
        Self::with_grid(config, factory, grid)
    }

    /// Starts from an existing arrangement of pieces. The grid must match the configured size.
    ///
    /// The factory's ids are moved past the largest id on the grid.
    pub fn with_grid(config: BoardConfig, mut factory: PieceFactory, grid: Grid) -> Result<Self, BoardError> {
        config.validate()?;
        if grid.width() != config.width || grid.height() != config.height {
            return Err(BoardError::InvalidConfig(format!(
                "grid is {}x{} but the board is configured as {}x{}",
                grid.width(), grid.height(), config.width, config.height,
            )));
        }
        let ids: BTreeSet<PieceId> = grid.pieces().map(|piece| piece.id()).collect();
        if ids.len() != grid.occupied_count() {
            return Err(BoardError::InvalidConfig("grid contains duplicate piece ids".to_owned()));
        }
        if let Some(&largest) = ids.iter().next_back() {
            factory.skip_past(largest);
        }
        Ok(Self {
            config,
            grid,
            factory,
            state: EngineState::Idle,
            resolution: Resolution::Nothing,
            score: 0,
            in_flight: BTreeSet::new(),
            spawn_timer: 0.0,
            game_over_timer: None,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &BoardConfig { &self.config }
    pub fn grid(&self) -> &Grid { &self.grid }
    pub fn state(&self) -> EngineState { self.state }
    pub fn score(&self) -> u64 { self.score }
    pub fn is_game_over(&self) -> bool { self.state == EngineState::GameOver }
    pub fn accepts_placement(&self) -> bool { self.state.accepts_placement() }

    pub fn piece_at(&self, x: u32, y: u32) -> Result<Option<&Piece>, BoardError> {
        self.grid.get(x, y)
    }

    pub fn in_flight(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.in_flight.iter().copied()
    }

    /// Takes the events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: BoardEvent) {
        self.events.push(event);
    }

    fn resting_state(&self) -> EngineState {
        if self.in_flight.is_empty() {
            EngineState::Idle
        } else {
            EngineState::AwaitingPlacement
        }
    }

    fn transition(&mut self, state: EngineState) {
        if self.state != state {
            log::debug!("board state {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    fn ensure_not_busy(&self) -> Result<(), BoardError> {
        match self.state {
            EngineState::GameOver => Err(BoardError::GameOver),
            state if state.is_resolving() => Err(BoardError::Busy { state }),
            _ => Ok(()),
        }
    }

    /// Fills the bottom rows of every column without creating runs along a row.
    pub fn fill_initial(&mut self) -> Result<(), BoardError> {
        self.ensure_not_busy()?;

        let height = self.grid.height();
        for x in 0..self.grid.width() {
            for y in (height - INITIAL_FILL_ROWS..height).rev() {
                let piece = self.factory.generate(&self.grid, x, y, true);
                self.grid.place(x, y, piece)?;
            }
        }
        log::debug!("filled the board:\n{}", self.grid);

        let state = self.resting_state();
        self.transition(state);
        Ok(())
    }

    /// Creates a piece above `column`, already travelling toward the board.
    ///
    /// The caller owns the piece until it hands it back through [`BoardEngine::place_piece`].
    pub fn spawn_at(&mut self, column: u32) -> Result<Piece, BoardError> {
        if self.is_game_over() {
            return Err(BoardError::GameOver);
        }
        if column >= self.grid.width() {
            return Err(BoardError::out_of_bounds(column, 0));
        }

        let mut piece = self.factory.generate(&self.grid, column, 0, false);
        let column_x = column as f32;
        piece.set_position(Position::new(column_x, TRIGGER_ROW - self.config.spawn_height));
        piece.move_to(Position::new(column_x, TRIGGER_ROW), self.config.spawn_travel_time);

        self.in_flight.insert(piece.id());
        self.emit(BoardEvent::PieceSpawned {
            piece: piece.id(),
            column,
            position: piece.position(),
        });
        if self.state == EngineState::Idle {
            self.transition(EngineState::AwaitingPlacement);
        }
        Ok(piece)
    }

    /// Counts down the spawn timer and spawns a piece above the spawn column when it runs out.
    pub fn update_spawner(&mut self, dt: f32) -> Option<Piece> {
        if self.is_game_over() {
            return None;
        }
        if self.spawn_timer > 0.0 {
            self.spawn_timer -= dt;
            return None;
        }

        self.spawn_timer = self.config.spawn_interval;
        match self.spawn_at(self.config.spawn_column) {
            Ok(piece) => Some(piece),
            Err(error) => {
                log::warn!("spawning failed: {}", error);
                None
            },
        }
    }

    /// Maps a horizontal board-space position to a column.
    ///
    /// Positions past the right edge of the board land in a random column.
    pub fn column_for_x(&mut self, x: f32) -> u32 {
        let width = self.grid.width();
        if x < 0.5 {
            0
        } else if x >= width as f32 {
            self.factory.random_column(width)
        } else {
            ((x + 0.5).floor() as u32).min(width - 1)
        }
    }

    /// Keeps a dragged piece above the board and within its columns.
    pub fn clamp_drag(&self, position: Position) -> Position {
        let max_x = (self.grid.width() - 1) as f32;
        Position::new(
            position.x.max(0.0).min(max_x),
            position.y.min(TRIGGER_ROW),
        )
    }

    /// Drops a piece into `column`. It lands in the lowest empty row.
    ///
    /// Returns the landing cell. A rejected piece is handed back inside the error and stays in
    /// flight. If the column is full up to its top row, the game ends and
    /// [`BoardError::TopOut`] is returned.
    pub fn place_piece(&mut self, mut piece: Piece, column: u32) -> Result<(u32, u32), PlacementError> {
        let row = match self.landing_row(column) {
            Ok(row) => row,
            Err(BoardError::TopOut { column }) => {
                log::info!("column {} topped out", column);
                self.in_flight.remove(&piece.id());
                self.enter_game_over();
                return Err(PlacementError { error: BoardError::TopOut { column }, piece });
            },
            Err(error) => {
                log::warn!("rejected placement of {} into column {}: {}", piece.id(), column, error);
                return Err(PlacementError { error, piece });
            },
        };

        let destination = Position::of_cell(column, row);
        let duration = piece.position().distance(&destination) / self.config.snap_speed;
        piece.move_to(destination, duration);

        let id = piece.id();
        if let Err(error) = self.grid.place(column, row, piece.clone()) {
            log::error!("landing cell ({}, {}) of {} was taken: {}", column, row, id, error);
            return Err(PlacementError { error, piece });
        }
        self.in_flight.remove(&id);
        self.emit(BoardEvent::PieceMoveStart { piece: id, destination, duration });

        self.resolution = Resolution::Landing(id);
        self.transition(EngineState::ResolvingMatches);
        Ok((column, row))
    }

    fn landing_row(&self, column: u32) -> Result<u32, BoardError> {
        self.ensure_not_busy()?;
        if self.grid.is_top_row_blocked(column)? {
            return Err(BoardError::TopOut { column });
        }
        self.grid.lowest_empty_row(column)?
            .ok_or(BoardError::TopOut { column })
    }

    /// Advances all motions by `dt` seconds and moves the resolution along.
    pub fn tick(&mut self, dt: f32) {
        for piece in self.grid.pieces_mut() {
            piece.advance(dt);
        }

        match self.state {
            EngineState::ResolvingMatches | EngineState::Collapsing => self.resolve(),
            EngineState::GameOver => self.count_down_game_over(dt),
            _ => {},
        }
    }

    /// Ticks until placements are accepted again, for at most `max_ticks` ticks.
    ///
    /// Returns the number of ticks taken.
    pub fn tick_until_ready(&mut self, dt: f32, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.state.is_resolving() {
            self.tick(dt);
            ticks += 1;
        }
        ticks
    }

    fn all_reached(&self, ids: &[PieceId]) -> bool {
        ids.iter()
            .all(|&id| self.grid.find(id).map_or(true, |piece| piece.is_reached()))
    }

    /// The matches to clear next, or `None` while pieces are still moving.
    fn settled_matches(&self) -> Option<MatchSet> {
        match &self.resolution {
            Resolution::Nothing => Some(MatchSet::new()),
            Resolution::Landing(id) => match self.grid.find(*id) {
                Some(piece) if !piece.is_reached() => None,
                Some(piece) => Some(find_final_matches(&self.grid, piece.x(), piece.y())),
                None => Some(MatchSet::new()),
            },
            Resolution::Settling(moved) => {
                if !self.all_reached(moved) {
                    return None;
                }
                let mut matches = MatchSet::new();
                for piece in moved.iter().filter_map(|&id| self.grid.find(id)) {
                    matches.union(find_final_matches(&self.grid, piece.x(), piece.y()));
                }
                Some(matches)
            },
        }
    }

    fn resolve(&mut self) {
        let matches = match self.settled_matches() {
            Some(matches) => matches,
            None => return,
        };

        if matches.is_empty() {
            self.resolution = Resolution::Nothing;
            let state = self.resting_state();
            self.transition(state);
        } else {
            self.clear_and_collapse(&matches);
        }
    }

    fn clear_and_collapse(&mut self, matches: &MatchSet) {
        let mut cleared = Vec::with_capacity(matches.len());
        for (id, member) in matches.iter() {
            let still_there = match self.grid.get(member.x, member.y) {
                Ok(Some(piece)) => piece.id() == id,
                _ => false,
            };
            if !still_there {
                log::error!("matched piece {} is no longer at ({}, {})", id, member.x, member.y);
                continue;
            }
            if let Ok(Some(piece)) = self.grid.remove(member.x, member.y) {
                cleared.push(ClearedPiece {
                    id: piece.id(),
                    x: piece.x(),
                    y: piece.y(),
                    color: piece.color(),
                });
            }
        }

        let points = cleared.len() as u64 * self.config.points_per_piece;
        self.score += points;
        log::debug!("cleared {} pieces for {} points", cleared.len(), points);
        self.emit(BoardEvent::MatchCleared { pieces: cleared });
        self.emit(BoardEvent::ScoreChanged(self.score));

        self.transition(EngineState::Collapsing);
        let collapse = collapse_columns(&mut self.grid, &matches.columns());
        for fall in &collapse.falls {
            let destination = Position::of_cell(fall.column, fall.dest_row);
            let duration = fall.distance() as f32 / self.config.collapse_speed;
            if let Ok(Some(piece)) = self.grid.get_mut(fall.column, fall.dest_row) {
                piece.move_to(destination, duration);
            }
            self.emit(BoardEvent::PieceMoveStart { piece: fall.piece, destination, duration });
        }
        self.resolution = Resolution::Settling(collapse.moved());
    }

    fn enter_game_over(&mut self) {
        self.transition(EngineState::GameOver);
        self.resolution = Resolution::Nothing;
        self.spawn_timer = 0.0;

        let final_score = self.score;
        log::info!("game over with {} points", final_score);
        self.emit(BoardEvent::GameOver { final_score });
        self.score = 0;
        self.emit(BoardEvent::ScoreChanged(0));

        let in_flight: Vec<PieceId> = std::mem::take(&mut self.in_flight).into_iter().collect();
        if !in_flight.is_empty() {
            self.emit(BoardEvent::InFlightCleared(in_flight));
        }
        self.game_over_timer = Some(self.config.game_over_clear_delay);
    }

    fn count_down_game_over(&mut self, dt: f32) {
        let remaining = match self.game_over_timer {
            Some(remaining) => remaining - dt,
            None => return,
        };
        if remaining > 0.0 {
            self.game_over_timer = Some(remaining);
            return;
        }

        self.game_over_timer = None;
        let removed = self.grid.clear();
        log::debug!("cleared {} pieces after game over", removed.len());
        self.emit(BoardEvent::BoardCleared);
    }

    /// Empties the board and starts over from [`EngineState::Idle`].
    pub fn reset(&mut self) {
        self.grid.clear();
        self.in_flight.clear();
        self.resolution = Resolution::Nothing;
        self.score = 0;
        self.spawn_timer = 0.0;
        self.game_over_timer = None;
        self.state = EngineState::Idle;
        log::info!("board reset");
        self.emit(BoardEvent::BoardReset);
    }
}
