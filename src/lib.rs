//! # Filtrate
//!
//! A criteria-driven filter engine for in-memory media catalogs, with
//! streamed ingestion and observable filter passes.
//!
//! ## Core Concepts
//!
//! - **Catalog**: Records in ingestion order, with stable one-based ids
//! - **Criteria**: Named, typed constraints (exact, range, multi-select)
//! - **Controls**: Where criterion values come from; polled at filter time
//! - **Passes**: Order-preserving filter runs, rendered into a sink and
//!   broadcast to subscribers
//!
//! ## Example
//!
//! ```ignore
//! use filtrate::{Catalog, ControlValue, CriterionSpec, EngineConfig, FilterEngine};
//!
//! let catalog = Catalog::from_library_str(&library_json)?;
//! let mut engine = FilterEngine::new(catalog, EngineConfig::default())?;
//!
//! // Register a criterion and drive it
//! let genre = engine.add_criterion(CriterionSpec::exact("genre").with_all("all"))?;
//! genre.set(ControlValue::single("Drama"));
//!
//! // Run a pass
//! let view = engine.filter();
//! for record in &view {
//!     println!("{}", record.json_line());
//! }
//! ```

pub mod controls;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod events;
pub mod records;
pub mod types;

// Re-exports
pub use controls::{ChangeNotifier, Control, ControlHandle, SharedControl};
pub use criteria::{ControlValue, CriterionKind, CriterionSpec, Span};
pub use engine::{
    EngineConfig, FilterEngine, RenderSink, RowTemplate, SearchConfig, SEARCH_FIELD,
};
pub use error::{EngineError, Result};
pub use events::{
    DropReason, EngineEvent, EventBus, EventFilter, MatchSummary, SubscriptionConfig,
    SubscriptionHandle, SubscriptionId,
};
pub use records::{drafts_from_value, parse_library, Catalog};
pub use types::*;
