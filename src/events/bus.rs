//! Fan-out of engine events to subscribers.

use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{
    DropReason, EngineEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
};

/// Internal subscription state.
struct Subscription {
    config: SubscriptionConfig,
    sender: Sender<EngineEvent>,
}

impl Subscription {
    /// Try to send an event. Returns false if buffer is full (subscriber will be dropped).
    fn try_send(&self, event: EngineEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(crossbeam_channel::TrySendError::Full(_)) => false,
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => false,
        }
    }

    /// Check whether this subscription's filter admits an event.
    fn wants(&self, event: &EngineEvent) -> bool {
        match event {
            EngineEvent::FilterStarted { .. } | EngineEvent::FilterFinished { .. } => {
                self.config.filter.include_filter_passes
            }
            EngineEvent::AddStarted { .. } | EngineEvent::AddFinished { .. } => {
                self.config.filter.include_adds
            }
            EngineEvent::CriterionAdded { .. } => self.config.filter.include_criteria,
            EngineEvent::Dropped { .. } => true,
        }
    }
}

/// Manages subscriptions and broadcasts engine events.
pub struct EventBus {
    /// Active subscriptions by ID.
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a new subscription.
    ///
    /// Events emitted after this call are delivered to the handle;
    /// there is no replay of earlier activity.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size);

        let subscription = Subscription { config, sender };

        self.subscriptions.write().insert(id, subscription);

        SubscriptionHandle { id, receiver }
    }

    /// Unsubscribe and clean up.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut subs = self.subscriptions.write();
        if let Some(sub) = subs.remove(&id) {
            // Send dropped event (best effort)
            let _ = sub.sender.try_send(EngineEvent::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
    }

    /// Get subscription count.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Broadcast an event to matching subscriptions. Drops subscribers
    /// that fail to receive.
    pub fn broadcast(&self, event: EngineEvent) {
        let mut to_remove = Vec::new();

        {
            let subs = self.subscriptions.read();
            for (id, sub) in subs.iter() {
                if sub.wants(&event) {
                    if !sub.try_send(event.clone()) {
                        to_remove.push(*id);
                    }
                }
            }
        }

        // Remove dropped subscriptions
        if !to_remove.is_empty() {
            let mut subs = self.subscriptions.write();
            for id in to_remove {
                if let Some(sub) = subs.remove(&id) {
                    // Try to notify about the drop (might fail, that's ok)
                    let _ = sub.sender.try_send(EngineEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::EventFilter;
    use std::time::Duration;

    #[test]
    fn test_subscribe_unsubscribe() {
        let bus = EventBus::new();

        let handle = bus.subscribe(SubscriptionConfig::default());
        assert_eq!(bus.subscription_count(), 1);

        bus.unsubscribe(handle.id);
        assert_eq!(bus.subscription_count(), 0);

        // The drop is announced on the way out.
        let event = handle.recv_timeout(Duration::from_millis(100)).unwrap();
        assert!(matches!(
            event,
            EngineEvent::Dropped {
                reason: DropReason::Unsubscribed
            }
        ));
    }

    #[test]
    fn test_broadcast_to_matching() {
        let bus = EventBus::new();

        let config = SubscriptionConfig {
            filter: EventFilter::adds(),
            ..Default::default()
        };
        let handle = bus.subscribe(config);

        bus.broadcast(EngineEvent::AddStarted { incoming: 3 });

        let event = handle.recv_timeout(Duration::from_millis(100)).unwrap();
        match event {
            EngineEvent::AddStarted { incoming } => assert_eq!(incoming, 3),
            _ => panic!("Expected AddStarted event, got {:?}", event),
        }
    }

    #[test]
    fn test_broadcast_filters_non_matching() {
        let bus = EventBus::new();

        let config = SubscriptionConfig {
            filter: EventFilter::adds(),
            ..Default::default()
        };
        let handle = bus.subscribe(config);

        bus.broadcast(EngineEvent::FilterStarted { total: 10 });

        let result = handle.recv_timeout(Duration::from_millis(50));
        assert!(result.is_err());
    }

    #[test]
    fn test_drop_slow_subscriber() {
        // Small buffer
        let bus = EventBus::new();
        let config = SubscriptionConfig {
            buffer_size: 2,
            filter: EventFilter::all(),
        };
        let _handle = bus.subscribe(config);

        // Flood with events
        for i in 0..10 {
            bus.broadcast(EngineEvent::FilterStarted { total: i });
        }

        // Subscriber should be dropped
        assert_eq!(bus.subscription_count(), 0);
    }

    #[test]
    fn test_each_event_delivered_once() {
        let bus = EventBus::new();
        let handle = bus.subscribe(SubscriptionConfig::default());

        bus.broadcast(EngineEvent::FilterStarted { total: 1 });

        assert!(handle.try_recv().is_ok());
        assert!(handle.try_recv().is_err());
    }
}
