//! Free-text commentary on the engine's moves.
//!
//! Generation is delegated to a [`CommentaryProvider`]. Whether to ask at all
//! is decided by a [`CommentaryGate`], which rolls against a probability that
//! depends on the move and the stage of the game.

use crate::config::{CommentaryConfig, ConfigError};
use async_trait::async_trait;
use derive_more::{Display, Error};
use rand::{Rng, RngCore};
use strictly_othello::{Board, Position};
use tracing::{debug, error, info, instrument};

/// Produces a short comment about a move.
#[async_trait]
pub trait CommentaryProvider: Send + Sync {
    /// Comments on `player_name` moving at `position` on `board`.
    ///
    /// `Ok(None)` means the provider had nothing to say.
    async fn generate(
        &self,
        board: &Board,
        position: Position,
        player_name: &str,
    ) -> Result<Option<String>, CommentaryError>;
}

/// Provider that never comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCommentary;

#[async_trait]
impl CommentaryProvider for NoCommentary {
    async fn generate(
        &self,
        _board: &Board,
        _position: Position,
        _player_name: &str,
    ) -> Result<Option<String>, CommentaryError> {
        Ok(None)
    }
}

/// Chat-completions client returning a JSON `{"comment": ...}` object.
#[derive(Debug, Clone)]
pub struct LlmCommentary {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl LlmCommentary {
    /// Creates a client for an OpenAI-compatible endpoint.
    pub fn new(api_url: String, api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            model,
            max_tokens,
        }
    }

    /// Builds a client from configuration, reading the key from the
    /// configured environment variable.
    #[instrument(skip(config), fields(model = %config.model()))]
    pub fn from_config(config: &CommentaryConfig) -> Result<Self, ConfigError> {
        let api_key = std::env::var(config.api_key_env()).map_err(|_| {
            ConfigError::new(format!(
                "{} environment variable not set",
                config.api_key_env()
            ))
        })?;

        Ok(Self::new(
            config.api_url().clone(),
            api_key,
            config.model().clone(),
            *config.max_tokens(),
        ))
    }

    fn request_body(&self, board: &Board, position: Position, player_name: &str) -> serde_json::Value {
        let system_prompt = format!(
            "You are a friendly Othello coach. Call the player by name and \
             encourage or praise them, for example: '{name}, that's a great move! \
             I'll have to concentrate now!' Reply only with JSON: {{\"comment\": \"...\"}}",
            name = player_name
        );
        let user_prompt = format!(
            "On this board ({board}), {name} placed a disc at ({row}, {col}). \
             Write a kind, encouraging comment on the move and address {name} by name.",
            board = board,
            name = player_name,
            row = position.row(),
            col = position.col()
        );

        serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt }
            ],
            "response_format": { "type": "json_object" }
        })
    }
}

#[async_trait]
impl CommentaryProvider for LlmCommentary {
    #[instrument(skip(self, board), fields(model = %self.model))]
    async fn generate(
        &self,
        board: &Board,
        position: Position,
        player_name: &str,
    ) -> Result<Option<String>, CommentaryError> {
        debug!("Sending commentary request");
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(board, position, player_name))
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Commentary request failed");
                CommentaryError::new(format!("Request failed: {}", e))
            })?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            error!(error = ?e, "Failed to read commentary response");
            CommentaryError::new(format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            error!(status = %status, response = %response_text, "Commentary API error");
            return Err(CommentaryError::new(format!(
                "API error {}: {}",
                status, response_text
            )));
        }

        let comment = parse_comment(&response_text)?;
        info!(has_comment = comment.is_some(), "Commentary generated");
        Ok(comment)
    }
}

/// Extracts `comment` from the JSON object in the first choice's content.
fn parse_comment(response_text: &str) -> Result<Option<String>, CommentaryError> {
    let response_json: serde_json::Value = serde_json::from_str(response_text)
        .map_err(|e| CommentaryError::new(format!("Failed to parse response: {}", e)))?;

    let content = response_json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| CommentaryError::new("No content in response"))?;

    let inner: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| CommentaryError::new(format!("Content is not JSON: {}", e)))?;

    Ok(inner["comment"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string))
}

/// Commentary provider error.
#[derive(Debug, Clone, Display, Error)]
#[display("Commentary error: {} at {}:{}", message, file, line)]
pub struct CommentaryError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl CommentaryError {
    /// Creates a new commentary error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Chance of commenting on an ordinary move.
pub const BASE_PROBABILITY: f64 = 0.3;
/// Chance of commenting on a corner capture.
pub const CORNER_PROBABILITY: f64 = 0.5;
/// Chance of commenting while fewer than [`OPENING_DISCS`] discs are down.
pub const OPENING_PROBABILITY: f64 = 0.2;
/// Minimum chance once more than [`ENDGAME_DISCS`] discs are down.
pub const ENDGAME_PROBABILITY: f64 = 0.4;
/// Disc count below which the opening rate applies.
pub const OPENING_DISCS: u32 = 10;
/// Disc count above which the endgame floor applies.
pub const ENDGAME_DISCS: u32 = 40;

/// Probability gate deciding whether a move gets commentary.
///
/// Evaluated on the board before the move is placed. The corner rate
/// replaces the base rate, the opening rate then overrides both, and the
/// endgame rate acts as a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentaryGate {
    enabled: bool,
}

impl Default for CommentaryGate {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl CommentaryGate {
    /// A gate that rolls the standard probabilities.
    pub fn new() -> Self {
        Self::default()
    }

    /// A gate that never opens.
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Probability of commenting on a move at `position`.
    pub fn probability(&self, board: &Board, position: Position) -> f64 {
        if !self.enabled {
            return 0.0;
        }

        let discs = board.counts().total();
        let mut p = if position.is_corner() {
            CORNER_PROBABILITY
        } else {
            BASE_PROBABILITY
        };
        if discs < OPENING_DISCS {
            p = OPENING_PROBABILITY;
        }
        if discs > ENDGAME_DISCS {
            p = p.max(ENDGAME_PROBABILITY);
        }
        p
    }

    /// Rolls `rng` against [`Self::probability`].
    pub fn should_comment(&self, board: &Board, position: Position, rng: &mut dyn RngCore) -> bool {
        let p = self.probability(board, position);
        p > 0.0 && rng.gen_bool(p)
    }
}
