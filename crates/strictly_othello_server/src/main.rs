//! Strictly Othello - command-line entry point.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use std::sync::Arc;
use strictly_othello::{Board, Move, Player, rules, search};
use strictly_othello_server::{
    AiMoveRequest, AiOpponent, ChannelBroadcaster, CommentaryGate, CommentaryProvider,
    InMemoryStore, LlmCommentary, NoCommentary, OthelloConfig, RoomStatus, SessionManager,
};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = OthelloConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::AiMove {
            board,
            turn,
            user_name,
            difficulty,
        } => run_ai_move(&config, board, turn, user_name, difficulty).await,
        Command::SelfPlay {
            black_depth,
            white_depth,
        } => run_self_play(&config, black_depth, white_depth),
        Command::Demo { depth } => run_demo(&config, depth),
    }
}

/// Ask the engine for one move
#[instrument(skip(config, board))]
async fn run_ai_move(
    config: &OthelloConfig,
    board: String,
    turn: String,
    user_name: String,
    difficulty: Option<u32>,
) -> Result<()> {
    let commentary = config.commentary();
    let (provider, gate): (Arc<dyn CommentaryProvider>, CommentaryGate) = if !commentary.enabled() {
        (Arc::new(NoCommentary), CommentaryGate::disabled())
    } else {
        match LlmCommentary::from_config(commentary) {
            Ok(llm) => (Arc::new(llm), CommentaryGate::new()),
            Err(e) => {
                warn!(error = %e, "Commentary disabled");
                (Arc::new(NoCommentary), CommentaryGate::disabled())
            }
        }
    };

    let opponent = AiOpponent::new(provider, gate, *config.search(), *commentary.seed());
    let request = AiMoveRequest::new(board.replace('.', " "), turn, user_name, difficulty);
    let reply = opponent.next_move(&request).await?;

    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

/// Engine against engine until neither side can move
#[instrument(skip(config))]
fn run_self_play(
    config: &OthelloConfig,
    black_depth: Option<u32>,
    white_depth: Option<u32>,
) -> Result<()> {
    let default_depth = *config.search().default_depth();
    let depth_for = |player: Player| match player {
        Player::Black => black_depth.unwrap_or(default_depth),
        Player::White => white_depth.unwrap_or(default_depth),
    };

    let mut board = Board::initial();
    let mut to_move = Player::Black;
    let mut plies = 0u32;

    while !rules::is_terminal(&board) {
        let result = search::search(&board, to_move, depth_for(to_move));
        match result.best_move {
            Move::Place(pos) => {
                board = rules::apply_at(&board, pos, to_move)?;
                plies += 1;
                info!(player = %to_move, at = %pos, score = result.score, "Move");
            }
            Move::Pass => info!(player = %to_move, "Pass"),
        }
        if rules::has_legal_move(&board, to_move.opponent()) {
            to_move = to_move.opponent();
        }
    }

    let counts = board.counts();
    println!("{}", board.render());
    println!(
        "Result: {} (black {}, white {}, {} moves)",
        rules::winner(&board).as_wire(),
        counts.black,
        counts.white,
        plies
    );
    Ok(())
}

/// Scripted room: create, join, play out, rematch, disconnect
#[instrument(skip(config))]
fn run_demo(config: &OthelloConfig, depth: u32) -> Result<()> {
    let store = Arc::new(InMemoryStore::new());
    let broadcaster = Arc::new(ChannelBroadcaster::new(*config.broadcast().capacity()));
    let mut updates = broadcaster.subscribe();

    let alice = store.add_user("alice")?;
    let bob = store.add_user("bob")?;
    let sessions = SessionManager::new(store.clone(), broadcaster);

    let room = sessions.create_room(*alice.id())?;
    sessions.join_room(room.id, *bob.id())?;

    loop {
        let state = sessions.game_state(room.id)?;
        if state.status != RoomStatus::Playing {
            break;
        }
        let mover = match state.turn {
            Player::Black => *alice.id(),
            Player::White => *bob.id(),
        };
        let Some(pos) = search::choose_move(&state.board_state, state.turn, depth).position() else {
            break;
        };
        sessions.submit_move(room.id, pos.row() as i32, pos.col() as i32, mover)?;
    }

    sessions.reset_for_rematch(room.id)?;
    let effects = sessions.disconnect(*bob.id());
    info!(?effects, "Guest disconnected");

    loop {
        match updates.try_recv() {
            Ok(update) => println!("{}", serde_json::to_string(&update.snapshot)?),
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "Oldest updates dropped"),
            Err(_) => break,
        }
    }
    for record in sessions.match_history(*alice.id())? {
        println!("alice vs {}: {} in {} moves", record.opponent_name(), record.result(), record.moves());
    }
    Ok(())
}
