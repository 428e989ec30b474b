//! Append-only in-memory record collection.

use crate::types::{LoadProgress, Record, RecordDraft, RecordId};
use tracing::debug;

/// The record collection the engine filters over.
///
/// Append-only and ingestion-ordered: ids are assigned on ingest, 1-based,
/// in arrival order. Records are never removed or reordered, so a filter
/// pass preserving catalog order preserves ingestion order.
#[derive(Debug)]
pub struct Catalog {
    records: Vec<Record>,
    /// Next id to assign; starts at 1.
    next_id: u64,
    /// Declared total for the full stream, if known.
    expected_total: Option<usize>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
            expected_total: None,
        }
    }

    /// Create an empty catalog that expects `total` records over the
    /// whole stream. Enables [`LoadProgress::percent`].
    pub fn with_expected_total(total: usize) -> Self {
        Self {
            records: Vec::with_capacity(total),
            next_id: 1,
            expected_total: Some(total),
        }
    }

    /// Build a catalog from a library document (see [`parse_library`]).
    ///
    /// [`parse_library`]: crate::records::parse_library
    pub fn from_library_str(text: &str) -> crate::error::Result<Self> {
        let drafts = super::parse_library(text)?;
        let mut catalog = Self::new();
        catalog.extend(drafts);
        Ok(catalog)
    }

    /// Append a single record, assigning the next id.
    pub fn push(&mut self, draft: RecordDraft) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.records.push(draft.into_record(id));
        id
    }

    /// Append a batch in order. Returns progress after the batch.
    pub fn extend(&mut self, drafts: impl IntoIterator<Item = RecordDraft>) -> LoadProgress {
        let before = self.records.len();
        for draft in drafts {
            self.push(draft);
        }
        debug!(
            added = self.records.len() - before,
            total = self.records.len(),
            "ingested batch"
        );
        self.progress()
    }

    /// Number of records ingested so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, in ingestion order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Look up a record by id.
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        // Ids are contiguous from 1, so the index is id - 1.
        let index = id.0.checked_sub(1)? as usize;
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Current load progress.
    pub fn progress(&self) -> LoadProgress {
        LoadProgress {
            loaded: self.records.len(),
            expected: self.expected_total,
        }
    }

    /// The declared stream total, if one was given.
    pub fn expected_total(&self) -> Option<usize> {
        self.expected_total
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
