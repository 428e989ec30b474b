//! Engine events: subscriptions over filter passes and ingestion.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{
    DropReason, EngineEvent, EventFilter, MatchSummary, SubscriptionConfig, SubscriptionHandle,
    SubscriptionId,
};
