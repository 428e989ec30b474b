//! Catalog storage and ingestion.
//!
//! Records live in an append-only in-memory collection with stable
//! 1-based ids assigned in ingestion order.

mod catalog;
mod ingest;

pub use catalog::Catalog;
pub use ingest::{drafts_from_value, parse_library};
