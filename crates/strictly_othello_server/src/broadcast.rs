//! Fan-out of room snapshots to subscribers.

use crate::ids::RoomId;
use crate::snapshot::GameStateSnapshot;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

/// Publishes snapshots to whoever watches a room.
///
/// Publishing is fire-and-forget: delivery failures never fail the
/// transition that produced the snapshot.
pub trait Broadcaster: Send + Sync {
    /// Sends `snapshot` to the subscribers of `room`.
    fn publish(&self, room: RoomId, snapshot: &GameStateSnapshot);
}

/// A snapshot addressed to a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomUpdate {
    /// Target room.
    pub room_id: RoomId,
    /// New state.
    pub snapshot: GameStateSnapshot,
}

/// Broadcaster over a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<RoomUpdate>,
}

impl ChannelBroadcaster {
    /// Creates a channel holding at most `capacity` unread updates per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to every subsequent update.
    pub fn subscribe(&self) -> broadcast::Receiver<RoomUpdate> {
        self.sender.subscribe()
    }
}

impl Broadcaster for ChannelBroadcaster {
    #[instrument(skip(self, snapshot))]
    fn publish(&self, room: RoomId, snapshot: &GameStateSnapshot) {
        let update = RoomUpdate {
            room_id: room,
            snapshot: snapshot.clone(),
        };
        if let Err(e) = self.sender.send(update) {
            debug!(error = %e, "No subscribers for room update");
        }
    }
}

/// Drops every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBroadcaster;

impl Broadcaster for NullBroadcaster {
    fn publish(&self, _room: RoomId, _snapshot: &GameStateSnapshot) {}
}
