//! Change notifications for admin mutations
//!
//! Field edits, saves, deletes and session changes are published on an
//! [`EventBus`] backed by `tokio::sync::broadcast`. Publishing never blocks
//! and never fails; with no subscriber the event is dropped.
//!
//! ```rust,ignore
//! let bus = EventBus::new(256);
//! let mut rx = bus.subscribe();
//!
//! bus.publish(AdminEvent::Record(RecordEvent::Saved {
//!     model: "Hero".to_string(),
//!     record_id: 1,
//! }));
//!
//! if let Ok(envelope) = rx.recv().await {
//!     tracing::info!(action = envelope.event.action(), "admin change");
//! }
//! ```

use super::field::FieldValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events about records edited through the CRUD screens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecordEvent {
    /// A field of the record held in a client's edit form changed
    FieldChanged {
        model: String,
        record_id: Option<i64>,
        field: String,
        value: FieldValue,
    },
    /// A record was inserted or updated
    Saved { model: String, record_id: i64 },
    /// A record was deleted
    Deleted { model: String, record_id: i64 },
}

/// Events about login sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SessionEvent {
    Started { user_id: i64 },
    /// `user_id` is `-1` when the token had no live session
    Ended { user_id: i64 },
}

/// Top-level event wrapping record and session events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdminEvent {
    Record(RecordEvent),
    Session(SessionEvent),
}

impl AdminEvent {
    pub fn event_kind(&self) -> &str {
        match self {
            AdminEvent::Record(_) => "record",
            AdminEvent::Session(_) => "session",
        }
    }

    /// Model name for record events
    pub fn model(&self) -> Option<&str> {
        match self {
            AdminEvent::Record(
                RecordEvent::FieldChanged { model, .. }
                | RecordEvent::Saved { model, .. }
                | RecordEvent::Deleted { model, .. },
            ) => Some(model),
            AdminEvent::Session(_) => None,
        }
    }

    pub fn action(&self) -> &str {
        match self {
            AdminEvent::Record(e) => match e {
                RecordEvent::FieldChanged { .. } => "field_changed",
                RecordEvent::Saved { .. } => "saved",
                RecordEvent::Deleted { .. } => "deleted",
            },
            AdminEvent::Session(e) => match e {
                SessionEvent::Started { .. } => "started",
                SessionEvent::Ended { .. } => "ended",
            },
        }
    }
}

/// Envelope wrapping an event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: AdminEvent,
}

impl EventEnvelope {
    pub fn new(event: AdminEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// Cheap to clone; every clone publishes into the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events for slow receivers
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event, returning the number of receivers reached
    pub fn publish(&self, event: AdminEvent) -> usize {
        let envelope = EventEnvelope::new(event);
        // send() only fails without receivers
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
