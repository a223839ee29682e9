//! Session event types and EventBus
//!
//! The session controller broadcasts a `SessionEvent` for every state
//! transition it applies (and for the transitions it deliberately
//! discards, like stale fetch responses). Consumers — selector UI,
//! badge rendering, tests — subscribe through the `EventBus` and never
//! mutate session state themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Session lifecycle events
///
/// Events are broadcast via `EventBus` and are serializable so an
/// embedding application can forward them (e.g. over SSE) unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// The startup lists were (re)fetched
    InitDataLoaded {
        base_name_count: usize,
        version_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// The loading indicator changed
    ///
    /// Emitted on the first in-flight operation and again when the
    /// last outstanding one settles, never in between.
    LoadingChanged {
        loading: bool,
        timestamp: DateTime<Utc>,
    },

    /// The current Document was replaced wholesale
    DocumentReplaced {
        id: String,
        version: String,
        annotation_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// The editor reported a mutation and the full annotation set was
    /// merged back into the Document
    AnnotationsRecorded {
        id: String,
        version: String,
        annotation_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A reviewer flipped their sign-off flag (local until save)
    JudgmentToggled {
        reviewer: String,
        value: bool,
        timestamp: DateTime<Utc>,
    },

    /// The current annotation set and judgments were written to the
    /// backend
    AnnotationsSaved {
        id: String,
        version: String,
        annotation_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A save was requested for an empty annotation set and skipped to
    /// protect the server-side baseline
    SaveSkippedEmpty {
        id: String,
        version: String,
        timestamp: DateTime<Utc>,
    },

    /// A fetch resolved after a newer selection superseded it; its
    /// result was discarded, not applied
    StaleResponseDiscarded {
        id: String,
        version: String,
        timestamp: DateTime<Utc>,
    },

    /// The per-document sign-off summary was re-synchronized
    ChecksRefreshed {
        document_count: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Central event distribution bus for session events
///
/// Wraps `tokio::sync::broadcast`, providing:
/// - Non-blocking publish (slow subscribers don't block the session)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` when at least one subscriber
    /// exists, `Err` otherwise.
    pub fn emit(
        &self,
        event: SessionEvent,
    ) -> Result<usize, broadcast::error::SendError<SessionEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the no-subscriber case
    ///
    /// The session core runs fine with nobody listening; most emission
    /// sites use this variant.
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
