//! Strictly Othello server library - rooms, seats and the engine opponent
//!
//! Builds the multiplayer and single-player services on top of the pure
//! `strictly_othello` rule and search engines.
//!
//! # Architecture
//!
//! - **Room**: pure state transitions for one room (join, move, disconnect, rematch)
//! - **Session**: per-room locking, persistence and snapshot fan-out
//! - **Store / Broadcast / Commentary**: collaborator seams with in-process implementations
//! - **Opponent**: engine moves with optional commentary
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strictly_othello_server::{InMemoryStore, NullBroadcaster, SessionManager};
//!
//! # fn example() -> anyhow::Result<()> {
//! let store = Arc::new(InMemoryStore::new());
//! let alice = store.add_user("alice")?;
//! let bob = store.add_user("bob")?;
//!
//! let sessions = SessionManager::new(store, Arc::new(NullBroadcaster));
//! let room = sessions.create_room(*alice.id())?;
//! sessions.join_room(room.id, *bob.id())?;
//! let snapshot = sessions.submit_move(room.id, 2, 3, *alice.id())?;
//! assert_eq!(snapshot.black_count, 4);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod broadcast;
mod commentary;
mod config;
mod error;
mod ids;
mod opponent;
mod room;
mod session;
mod snapshot;
mod store;

// Crate-level exports - Errors
pub use error::{ConflictReason, SessionError, SessionErrorKind, StoreError};

// Crate-level exports - Identifiers and room state
pub use ids::{RoomId, UserId};
pub use room::{DisconnectTransition, RoomState, RoomStatus, Seat};
pub use snapshot::{GameStateSnapshot, RoomSummary};

// Crate-level exports - Session management
pub use session::{AI_OPPONENT_NAME, DisconnectEffect, SessionManager};

// Crate-level exports - Collaborators
pub use broadcast::{Broadcaster, ChannelBroadcaster, NullBroadcaster, RoomUpdate};
pub use commentary::{
    BASE_PROBABILITY, CORNER_PROBABILITY, CommentaryError, CommentaryGate, CommentaryProvider,
    ENDGAME_DISCS, ENDGAME_PROBABILITY, LlmCommentary, NoCommentary, OPENING_DISCS,
    OPENING_PROBABILITY,
};
pub use store::{InMemoryStore, MatchRecord, MatchResult, PersistentStore, User};

// Crate-level exports - Engine opponent
pub use opponent::{AiMoveReply, AiMoveRequest, AiOpponent, PASS_PHRASE, encouragement};

// Crate-level exports - Configuration
pub use config::{BroadcastConfig, CommentaryConfig, ConfigError, OthelloConfig, SearchConfig};
