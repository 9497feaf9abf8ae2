//! Session event types and broadcast bus
//!
//! Swipe sessions and the interaction ledger publish what they do here so a
//! view layer (or a log tailer) can follow along without polling.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{EntityId, InteractionStatus};
use crate::role::Role;

/// Observable phase of a swipe session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Loading,
    Ready,
    Deciding,
    Exhausted,
    Error,
    Closed,
}

/// Events emitted by swipe sessions and the interaction ledger
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Session moved to a new phase
    StateChanged {
        session_id: Uuid,
        old_phase: SessionPhase,
        new_phase: SessionPhase,
        cursor: usize,
        timestamp: DateTime<Utc>,
    },

    /// A fetch produced a batch (possibly empty)
    BatchLoaded {
        session_id: Uuid,
        viewer: EntityId,
        role: Role,
        batch_len: usize,
        timestamp: DateTime<Utc>,
    },

    /// Server acknowledged a swipe; the cursor advanced
    DecisionAcknowledged {
        session_id: Uuid,
        target: EntityId,
        like: bool,
        cursor: usize,
        timestamp: DateTime<Utc>,
    },

    /// A swipe write failed and was discarded without advancing
    DecisionDropped {
        session_id: Uuid,
        target: EntityId,
        like: bool,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Interaction lists were re-read from the server
    InteractionsRefreshed {
        viewer: EntityId,
        role: Role,
        liked: usize,
        disliked: usize,
        /// Set when the refresh followed a status change
        changed: Option<(EntityId, InteractionStatus)>,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast bus for [`SessionEvent`]s
///
/// Cloning shares the underlying channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, returning the number of subscribers reached
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SessionEvent,
    ) -> Result<usize, broadcast::error::SendError<SessionEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}
