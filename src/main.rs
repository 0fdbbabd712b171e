use std::collections::VecDeque;

use anyhow::Context;
use clap::Parser;
use stack_three::{
    BoardConfig, BoardEngine, BoardError, BoardEvent, PieceFactory, PlacementError, Position,
    DEFAULT_HEIGHT, DEFAULT_POINTS_PER_PIECE, DEFAULT_WIDTH, TRIGGER_ROW,
};
use stack_three::ai::pick_best_column;
use stack_three::model::Piece;


/// Plays the board headlessly, letting a bot choose where each piece goes.
#[derive(Debug, Parser)]
#[command(name = "stack-three", version)]
struct Args {
    /// Seed for the piece colors; random if not given.
    #[arg(long)]
    seed: Option<u128>,

    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: u32,

    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: u32,

    #[arg(long, default_value_t = DEFAULT_POINTS_PER_PIECE)]
    points_per_piece: u64,

    /// End a game after this many placed pieces.
    #[arg(long, default_value_t = 50)]
    moves: usize,

    /// Number of games to play; the board is refilled after each one.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    games: u32,

    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}


fn report(events: Vec<BoardEvent>, final_score: &mut u64) {
    for event in events {
        match event {
            BoardEvent::PieceSpawned { piece, column, .. } => {
                log::debug!("spawned {} above column {}", piece, column);
            },
            BoardEvent::PieceMoveStart { piece, destination, duration } => {
                log::trace!("{} moves to ({}, {}) in {:.2}s", piece, destination.x, destination.y, duration);
            },
            BoardEvent::MatchCleared { pieces } => {
                log::info!("cleared {} pieces", pieces.len());
            },
            BoardEvent::ScoreChanged(score) => {
                log::debug!("score is now {}", score);
            },
            BoardEvent::GameOver { final_score: score } => {
                log::info!("game over, final score {}", score);
                *final_score = score;
            },
            BoardEvent::InFlightCleared(pieces) => {
                log::debug!("dropped {} pieces still in flight", pieces.len());
            },
            BoardEvent::BoardCleared => log::debug!("board cleared"),
            BoardEvent::BoardReset => log::debug!("board reset"),
        }
    }
}


/// Drags `piece` over the column the bot likes best and lets go.
///
/// Returns the piece if the board was not ready for it.
fn place_with_bot(engine: &mut BoardEngine, mut piece: Piece) -> Result<Option<Piece>, BoardError> {
    let target = pick_best_column(engine.grid(), piece.color())
        .map(|best| best.column)
        .unwrap_or(engine.config().spawn_column);

    piece.stop();
    let dragged = engine.clamp_drag(Position::new(target as f32, TRIGGER_ROW));
    piece.set_position(dragged);
    let column = engine.column_for_x(dragged.x);

    log::debug!("dropping {} {} into column {}", piece.color(), piece.id(), column);
    match engine.place_piece(piece, column) {
        Ok(_) => Ok(None),
        Err(PlacementError { error: BoardError::TopOut { column }, .. }) => {
            log::info!("column {} is full", column);
            Ok(None)
        },
        Err(PlacementError { error: BoardError::Busy { .. }, piece }) => Ok(Some(piece)),
        Err(PlacementError { error, .. }) => Err(error),
    }
}


/// Plays one game on a freshly filled board and returns its final score.
fn play_game(engine: &mut BoardEngine, args: &Args, dt: f32) -> anyhow::Result<u64> {
    engine.fill_initial()
        .context("failed to fill the board")?;
    println!("{}", engine.grid());

    let mut incoming: VecDeque<Piece> = VecDeque::new();
    let mut moves = 0;
    let mut final_score = 0;
    let mut show_board = false;

    while !engine.is_game_over() && moves < args.moves {
        if let Some(piece) = engine.update_spawner(dt) {
            incoming.push_back(piece);
        }
        for piece in incoming.iter_mut() {
            piece.advance(dt);
        }

        let arrived = incoming.front().map_or(false, |piece| piece.is_reached());
        if arrived && engine.accepts_placement() {
            if let Some(piece) = incoming.pop_front() {
                match place_with_bot(engine, piece).context("placing a piece failed")? {
                    Some(piece) => incoming.push_front(piece),
                    None => {
                        moves += 1;
                        show_board = true;
                    },
                }
            }
        }

        engine.tick(dt);
        report(engine.drain_events(), &mut final_score);

        if show_board && engine.accepts_placement() {
            println!("move {}, score {}", moves, engine.score());
            println!("{}", engine.grid());
            show_board = false;
        }
    }

    if engine.is_game_over() {
        // let the board clear away
        let clear_ticks = (engine.config().game_over_clear_delay / dt.max(f32::EPSILON)).ceil() as usize + 1;
        for _ in 0..clear_ticks {
            engine.tick(dt);
        }
        report(engine.drain_events(), &mut final_score);
    } else {
        final_score = engine.score();
    }
    Ok(final_score)
}


fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = BoardConfig {
        width: args.width,
        height: args.height,
        points_per_piece: args.points_per_piece,
        spawn_column: args.width / 2,
        ..BoardConfig::default()
    };
    let factory = match args.seed {
        Some(seed) => PieceFactory::from_seed(seed),
        None => PieceFactory::from_entropy(),
    };
    let mut engine = BoardEngine::new(config, factory)
        .context("failed to set up the board")?;

    let dt = args.tick_ms as f32 / 1000.0;
    let mut best_score = 0;
    for game in 1..=args.games {
        if game > 1 {
            engine.reset();
            engine.drain_events();
        }
        let final_score = play_game(&mut engine, &args, dt)
            .with_context(|| format!("game {} failed", game))?;
        println!("game {}: final score {}", game, final_score);
        best_score = best_score.max(final_score);
    }

    if args.games > 1 {
        println!("best score: {}", best_score);
    }
    Ok(())
}
