//! Core types for the filter engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for a catalog record.
///
/// Assigned at ingestion time: 1-based, in arrival order, never reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single field value on a record.
///
/// Catalog documents are open-ended JSON, but values are constrained to
/// this union so a mistyped record fails at ingestion instead of silently
/// never matching at filter time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A text value (`"Drama"`, `"03:45"`).
    Text(String),
    /// A numeric value (`2010`, `8.5`).
    Number(f64),
    /// A list of text values (`["Drama", "War"]`).
    List(Vec<String>),
    /// A nested object; opaque to criteria, carried through for rendering.
    Nested(serde_json::Map<String, serde_json::Value>),
}

impl FieldValue {
    /// Convert a JSON value into the supported union.
    ///
    /// Returns `None` for shapes outside it: `bool`, `null`, and arrays
    /// with non-string elements.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(FieldValue::Text(s.clone())),
            serde_json::Value::Number(n) => n.as_f64().map(FieldValue::Number),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(FieldValue::List),
            serde_json::Value::Object(map) => Some(FieldValue::Nested(map.clone())),
            _ => None,
        }
    }

    /// Text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the value's shape, for error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Number(_) => "number",
            FieldValue::List(_) => "list",
            FieldValue::Nested(_) => "nested",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        FieldValue::List(items.into_iter().map(str::to_string).collect())
    }
}

/// One catalog item: a stable id plus its named fields.
///
/// Immutable after construction; the id is assigned by the [`Catalog`]
/// on ingest.
///
/// [`Catalog`]: crate::Catalog
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    id: RecordId,
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub(crate) fn new(id: RecordId, fields: BTreeMap<String, FieldValue>) -> Self {
        Self { id, fields }
    }

    /// The record's stable identifier.
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Iterate over all fields.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// The record's fields as a single JSON line (the fallback row format
    /// when no template is installed).
    pub fn json_line(&self) -> String {
        serde_json::to_string(&self.fields).unwrap_or_default()
    }
}

/// Input for creating a record (before the id is assigned).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordDraft {
    pub(crate) fields: BTreeMap<String, FieldValue>,
}

impl RecordDraft {
    /// Create an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing any previous value under the same name.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub(crate) fn into_record(self, id: RecordId) -> Record {
        Record::new(id, self.fields)
    }
}

/// How active criteria combine into the record predicate.
///
/// With no active criteria the predicate is unrestricted in both modes:
/// every record matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
    /// A record must satisfy every active criterion (AND).
    All,
    /// A record must satisfy at least one active criterion (OR).
    Any,
}

impl Default for CombineMode {
    fn default() -> Self {
        CombineMode::All
    }
}

/// The filtered subsequence produced by one filter pass.
///
/// Records keep their original relative order. The view is a snapshot:
/// later passes do not change it.
#[derive(Clone, Debug)]
pub struct ResultView {
    records: Vec<Record>,
    total: usize,
}

impl ResultView {
    pub(crate) fn new(records: Vec<Record>, total: usize) -> Self {
        Self { records, total }
    }

    /// The matching records, in catalog order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Ids of the matching records, in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.records.iter().map(Record::id)
    }

    /// Number of matches.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Catalog size at the time of the pass.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a ResultView {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Progress of streamed catalog loading.
///
/// `expected` is the caller-declared total for the whole stream; without
/// it the loaded count is known but no percentage can be given.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoadProgress {
    /// Records ingested so far.
    pub loaded: usize,
    /// Declared total for the full stream, if known.
    pub expected: Option<usize>,
}

impl LoadProgress {
    /// Percent loaded, defined only when the expected total is known.
    /// Clamped to 100 if a stream over-delivers.
    pub fn percent(&self) -> Option<f64> {
        let expected = self.expected?;
        if expected == 0 {
            return Some(100.0);
        }
        Some((self.loaded as f64 * 100.0 / expected as f64).min(100.0))
    }

    /// True once the declared total has been reached.
    pub fn complete(&self) -> bool {
        match self.expected {
            Some(expected) => self.loaded >= expected,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_value_from_json() {
        assert_eq!(
            FieldValue::from_json(&json!("Drama")),
            Some(FieldValue::Text("Drama".into()))
        );
        assert_eq!(
            FieldValue::from_json(&json!(2010)),
            Some(FieldValue::Number(2010.0))
        );
        assert_eq!(
            FieldValue::from_json(&json!(["Drama", "War"])),
            Some(FieldValue::List(vec!["Drama".into(), "War".into()]))
        );
        assert!(matches!(
            FieldValue::from_json(&json!({"inner": 1})),
            Some(FieldValue::Nested(_))
        ));
    }

    #[test]
    fn test_field_value_rejects_unsupported_shapes() {
        assert_eq!(FieldValue::from_json(&json!(true)), None);
        assert_eq!(FieldValue::from_json(&json!(null)), None);
        assert_eq!(FieldValue::from_json(&json!([1, 2])), None);
        assert_eq!(FieldValue::from_json(&json!(["a", 2])), None);
    }

    #[test]
    fn test_record_draft_builder() {
        let draft = RecordDraft::new()
            .with_field("title", "Katyn")
            .with_field("year", 2007)
            .with_field("genre", vec!["Drama", "War"]);

        let record = draft.into_record(RecordId(1));
        assert_eq!(record.id(), RecordId(1));
        assert_eq!(record.field("title"), Some(&FieldValue::Text("Katyn".into())));
        assert_eq!(record.field("missing"), None);
        assert_eq!(record.field_count(), 3);
    }

    #[test]
    fn test_load_progress_percent() {
        let halfway = LoadProgress { loaded: 50, expected: Some(100) };
        assert_eq!(halfway.percent(), Some(50.0));
        assert!(!halfway.complete());

        let done = LoadProgress { loaded: 100, expected: Some(100) };
        assert_eq!(done.percent(), Some(100.0));
        assert!(done.complete());

        let unknown = LoadProgress { loaded: 50, expected: None };
        assert_eq!(unknown.percent(), None);
        assert!(!unknown.complete());

        let over = LoadProgress { loaded: 150, expected: Some(100) };
        assert_eq!(over.percent(), Some(100.0));
    }

    #[test]
    fn test_result_view_order_and_ids() {
        let records = vec![
            RecordDraft::new().with_field("n", 1).into_record(RecordId(1)),
            RecordDraft::new().with_field("n", 3).into_record(RecordId(3)),
        ];
        let view = ResultView::new(records, 5);

        assert_eq!(view.len(), 2);
        assert_eq!(view.total(), 5);
        let ids: Vec<_> = view.ids().collect();
        assert_eq!(ids, vec![RecordId(1), RecordId(3)]);
    }
}
