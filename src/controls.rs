//! Controls: where a criterion's current value comes from.
//!
//! The engine never talks to a widget toolkit. A control is anything
//! exposing a current value; the built-in shared-slot control pairs the
//! value with a clonable [`ControlHandle`] whose `set` also queues a
//! change notification for [`FilterEngine::pump`](crate::engine::FilterEngine::pump).

use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::RwLock;

use crate::criteria::ControlValue;

// --- Control trait ---

/// Source of a criterion's current value, polled at filter time.
pub trait Control: Send + Sync {
    /// The value the criterion should be resolved against right now.
    fn current(&self) -> ControlValue;
}

impl<F> Control for F
where
    F: Fn() -> ControlValue + Send + Sync,
{
    fn current(&self) -> ControlValue {
        self()
    }
}

// --- Shared slot control ---

/// A control backed by a shared value slot.
#[derive(Debug)]
pub struct SharedControl {
    slot: Arc<RwLock<ControlValue>>,
}

impl Control for SharedControl {
    fn current(&self) -> ControlValue {
        self.slot.read().clone()
    }
}

/// Clonable writer for a shared control's slot.
///
/// Notifications coalesce: rapid sets cost at most one queued filter
/// pass, which reads the latest slot value.
#[derive(Clone, Debug)]
pub struct ControlHandle {
    field: String,
    slot: Arc<RwLock<ControlValue>>,
    changes: Sender<String>,
}

impl ControlHandle {
    /// Replace the control's value and queue a change notification.
    pub fn set(&self, value: ControlValue) {
        *self.slot.write() = value;
        // A full queue already guarantees a pass will read the slot.
        let _ = self.changes.try_send(self.field.clone());
    }

    /// The value the control currently holds.
    pub fn get(&self) -> ControlValue {
        self.slot.read().clone()
    }

    /// Name of the field this control drives.
    pub fn field(&self) -> &str {
        &self.field
    }
}

/// Build a shared control plus its writer handle.
pub(crate) fn shared(
    field: impl Into<String>,
    initial: ControlValue,
    changes: Sender<String>,
) -> (SharedControl, ControlHandle) {
    let slot = Arc::new(RwLock::new(initial));
    let control = SharedControl {
        slot: Arc::clone(&slot),
    };
    let handle = ControlHandle {
        field: field.into(),
        slot,
        changes,
    };
    (control, handle)
}

// --- Change notification for external controls ---

/// Lets an externally implemented [`Control`] queue change
/// notifications the same way built-in handles do.
#[derive(Clone, Debug)]
pub struct ChangeNotifier {
    changes: Sender<String>,
}

impl ChangeNotifier {
    pub(crate) fn new(changes: Sender<String>) -> Self {
        Self { changes }
    }

    /// Queue a change notification for the named field.
    pub fn notify(&self, field: impl Into<String>) {
        let _ = self.changes.try_send(field.into());
    }
}
