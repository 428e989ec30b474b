//! Event types for observing engine activity.

use crate::types::{LoadProgress, Record};
use serde::{Deserialize, Serialize};

/// Configuration for a subscription.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Max buffered events before dropping subscriber.
    /// Default: 256
    pub buffer_size: usize,

    /// Filter criteria.
    pub filter: EventFilter,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 256,
            filter: EventFilter::default(),
        }
    }
}

/// Which event kinds a subscription receives.
///
/// The default subscribes to everything; use the constructors to
/// narrow. `Dropped` is always delivered.
#[derive(Clone, Debug)]
pub struct EventFilter {
    /// Include filter pass events (started/finished pairs).
    pub include_filter_passes: bool,

    /// Include ingestion events (started/finished pairs).
    pub include_adds: bool,

    /// Include criterion registration events.
    pub include_criteria: bool,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl EventFilter {
    /// Subscribe to filter passes only.
    pub fn filter_passes() -> Self {
        Self {
            include_filter_passes: true,
            include_adds: false,
            include_criteria: false,
        }
    }

    /// Subscribe to ingestion events only.
    pub fn adds() -> Self {
        Self {
            include_filter_passes: false,
            include_adds: true,
            include_criteria: false,
        }
    }

    /// Subscribe to everything.
    pub fn all() -> Self {
        Self {
            include_filter_passes: true,
            include_adds: true,
            include_criteria: true,
        }
    }
}

/// Events emitted by the engine.
///
/// Each pass emits its started event, does its work, then emits the
/// finished event; a subscriber sees each event at most once.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    // --- Filter Events ---
    /// A filter pass is about to run.
    FilterStarted {
        /// Catalog size going into the pass.
        total: usize,
    },

    /// A filter pass finished.
    FilterFinished {
        /// Summaries of the matching records, in catalog order.
        matched: Vec<MatchSummary>,
        /// Catalog size at the time of the pass.
        total: usize,
    },

    // --- Ingestion Events ---
    /// A batch of records is about to be appended.
    AddStarted {
        /// Records in the incoming batch.
        incoming: usize,
    },

    /// A batch append finished.
    AddFinished {
        progress: LoadProgress,
    },

    // --- Configuration Events ---
    /// A criterion was registered.
    CriterionAdded {
        field: String,
    },

    // --- Lifecycle Events ---
    /// Subscription was dropped.
    Dropped {
        reason: DropReason,
    },
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Summary of a matched record (for events, avoids sending full fields).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchSummary {
    pub id: u64,
    /// The record's title field, when it has a text one.
    pub title: Option<String>,
}

impl MatchSummary {
    /// Create summary from a full record.
    pub fn from_record(record: &Record) -> Self {
        let title = record
            .field("title")
            .and_then(|value| value.as_text())
            .map(str::to_string);

        Self {
            id: record.id().0,
            title,
        }
    }
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to manage a subscription.
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<EngineEvent>,
}

impl SubscriptionHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<EngineEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<EngineEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<EngineEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}
