//! The automated opponent service.
//!
//! Parses a request, runs the search on a blocking worker and optionally
//! decorates the chosen move with commentary.

use crate::commentary::{CommentaryGate, CommentaryProvider};
use crate::config::SearchConfig;
use crate::error::{SessionError, SessionErrorKind};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use strictly_othello::{Board, Move, Player, Position, search};
use tracing::{debug, info, instrument, warn};

/// Comment attached to every pass.
pub const PASS_PHRASE: &str = "I have no legal move, so I pass. Your turn!";

/// Request for the engine's move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
#[serde(rename_all = "camelCase")]
pub struct AiMoveRequest {
    /// 64-character board text.
    pub board_state: String,
    /// Color the engine plays, `"B"` or `"W"`.
    pub turn: String,
    /// Name of the human opponent, used in commentary.
    pub user_name: String,
    /// Search depth; the configured default when absent.
    #[serde(default)]
    pub difficulty: Option<u32>,
}

/// The engine's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMoveReply {
    /// `"row,col"` or `"pass"`.
    #[serde(rename = "move")]
    pub chosen: String,
    /// Optional comment for the player.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Fixed phrase used when commentary is unavailable.
pub fn encouragement(player_name: &str) -> String {
    format!("{}, that was a good move! Keep it up!", player_name)
}

/// Chooses moves for the single-player mode.
pub struct AiOpponent {
    provider: Arc<dyn CommentaryProvider>,
    gate: CommentaryGate,
    rng: Mutex<Box<dyn RngCore + Send>>,
    search: SearchConfig,
}

impl AiOpponent {
    /// Creates an opponent. A `seed` makes the commentary gate reproducible.
    pub fn new(
        provider: Arc<dyn CommentaryProvider>,
        gate: CommentaryGate,
        search: SearchConfig,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(provider, gate, search, rng)
    }

    /// Creates an opponent whose gate rolls against `rng`.
    pub fn with_rng(
        provider: Arc<dyn CommentaryProvider>,
        gate: CommentaryGate,
        search: SearchConfig,
        rng: impl RngCore + Send + 'static,
    ) -> Self {
        Self {
            provider,
            gate,
            rng: Mutex::new(Box::new(rng)),
            search,
        }
    }

    /// Computes the engine's reply to `request`.
    ///
    /// # Errors
    ///
    /// `Validation` for a malformed board or turn, or a difficulty outside
    /// `1..=max_depth`. `Internal` if the search worker panics.
    #[instrument(skip(self, request), fields(user = %request.user_name, turn = %request.turn))]
    pub async fn next_move(&self, request: &AiMoveRequest) -> Result<AiMoveReply, SessionError> {
        let board: Board = request
            .board_state
            .parse()
            .map_err(|e: strictly_othello::BoardParseError| SessionError::validation(e.message))?;
        let player: Player = request
            .turn
            .parse()
            .map_err(|_| SessionError::validation(format!("invalid turn '{}'", request.turn)))?;

        let depth = request.difficulty.unwrap_or(*self.search.default_depth());
        if depth == 0 || depth > *self.search.max_depth() {
            warn!(depth, "Difficulty out of range");
            return Err(SessionError::validation(format!(
                "difficulty {} must lie in 1..={}",
                depth,
                self.search.max_depth()
            )));
        }

        let result = tokio::task::spawn_blocking(move || search::search(&board, player, depth))
            .await
            .map_err(|e| SessionError::new(SessionErrorKind::Internal(e.to_string())))?;
        info!(best_move = %result.best_move, score = result.score, depth, "Engine moved");

        match result.best_move {
            Move::Pass => Ok(AiMoveReply {
                chosen: Move::Pass.to_string(),
                comment: Some(PASS_PHRASE.to_string()),
            }),
            Move::Place(pos) => {
                let comment = if self.roll(&board, pos) {
                    Some(self.comment(&board, pos, &request.user_name).await)
                } else {
                    None
                };
                Ok(AiMoveReply {
                    chosen: pos.to_string(),
                    comment,
                })
            }
        }
    }

    fn roll(&self, board: &Board, pos: Position) -> bool {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.gate.should_comment(board, pos, &mut **rng)
    }

    async fn comment(&self, board: &Board, pos: Position, player_name: &str) -> String {
        match self.provider.generate(board, pos, player_name).await {
            Ok(Some(text)) if !text.trim().is_empty() => text,
            Ok(_) => {
                debug!("Provider returned no comment");
                encouragement(player_name)
            }
            Err(e) => {
                warn!(error = %e, "Commentary failed, using fallback");
                encouragement(player_name)
            }
        }
    }
}
