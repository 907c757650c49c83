//! Command-line interface for strictly_othello.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Othello - rule engine, search opponent and room sessions
#[derive(Parser, Debug)]
#[command(name = "strictly_othello")]
#[command(about = "Othello engine and session manager", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask the engine for a move and print the JSON reply
    AiMove {
        /// 64-character board, row-major; '.' or ' ' for empty
        #[arg(long)]
        board: String,

        /// Color the engine plays (B or W)
        #[arg(long, default_value = "W")]
        turn: String,

        /// Name used in commentary
        #[arg(long, default_value = "Player")]
        user_name: String,

        /// Search depth (defaults to the configured depth)
        #[arg(long)]
        difficulty: Option<u32>,
    },

    /// Play the engine against itself to the end
    SelfPlay {
        /// Search depth for Black
        #[arg(long)]
        black_depth: Option<u32>,

        /// Search depth for White
        #[arg(long)]
        white_depth: Option<u32>,
    },

    /// Run a scripted two-player room and print every broadcast
    Demo {
        /// Search depth both seats use to pick their moves
        #[arg(long, default_value = "2")]
        depth: u32,
    },
}
