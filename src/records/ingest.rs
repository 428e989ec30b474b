//! JSON library ingestion.
//!
//! A library document is a single JSON object mapping arbitrary keys to
//! record objects. Two quirks of the format are handled here: a
//! `_comment` entry carries document metadata and is not a record, and
//! the legacy `web-directory` field is renamed to `webdirectory` on the
//! way in.

use crate::error::{EngineError, Result};
use crate::types::{FieldValue, RecordDraft};
use serde_json::Value;
use tracing::debug;

/// Library entry that carries metadata instead of a record.
const COMMENT_KEY: &str = "_comment";

/// Legacy field spelling and its replacement.
const LEGACY_DIR_FIELD: &str = "web-directory";
const DIR_FIELD: &str = "webdirectory";

/// Parse a library document into record drafts, in document order.
pub fn parse_library(text: &str) -> Result<Vec<RecordDraft>> {
    let doc: Value = serde_json::from_str(text)?;
    drafts_from_value(&doc)
}

/// Extract record drafts from an already-parsed library document.
pub fn drafts_from_value(doc: &Value) -> Result<Vec<RecordDraft>> {
    let entries = doc
        .as_object()
        .ok_or_else(|| EngineError::InvalidLibrary("top level must be an object".into()))?;

    let mut drafts = Vec::with_capacity(entries.len());
    for (key, entry) in entries {
        if key == COMMENT_KEY {
            continue;
        }

        let fields = entry.as_object().ok_or_else(|| {
            EngineError::InvalidLibrary(format!("entry `{}` is not an object", key))
        })?;

        let mut draft = RecordDraft::new();
        for (field, value) in fields {
            let name = if field == LEGACY_DIR_FIELD {
                DIR_FIELD
            } else {
                field.as_str()
            };

            let parsed = FieldValue::from_json(value).ok_or_else(|| EngineError::InvalidField {
                key: key.clone(),
                field: field.clone(),
                reason: format!("unsupported JSON shape: {}", shape_of(value)),
            })?;

            draft.insert(name, parsed);
        }

        drafts.push(draft);
    }

    debug!(records = drafts.len(), "parsed library document");
    Ok(drafts)
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "mixed array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldValue;

    const LIBRARY: &str = r#"{
        "_comment": "JSON audio library",
        "track-01.mp3": {
            "title": "Opening",
            "artist": "Ensemble",
            "year": "2004",
            "web-directory": "audio/2004/"
        },
        "track-02.mp3": {
            "title": "Finale",
            "artist": "Ensemble",
            "year": "2006"
        }
    }"#;

    #[test]
    fn test_parse_skips_comment_entry() {
        let drafts = parse_library(LIBRARY).unwrap();
        assert_eq!(drafts.len(), 2);
    }

    #[test]
    fn test_parse_renames_web_directory() {
        let drafts = parse_library(LIBRARY).unwrap();

        assert_eq!(
            drafts[0].fields.get("webdirectory"),
            Some(&FieldValue::Text("audio/2004/".into()))
        );
        assert!(drafts[0].fields.get("web-directory").is_none());
    }

    #[test]
    fn test_parse_preserves_document_order() {
        let drafts = parse_library(LIBRARY).unwrap();

        assert_eq!(
            drafts[0].fields.get("title"),
            Some(&FieldValue::Text("Opening".into()))
        );
        assert_eq!(
            drafts[1].fields.get("title"),
            Some(&FieldValue::Text("Finale".into()))
        );
    }

    #[test]
    fn test_parse_order_is_document_order_not_key_order() {
        // Keys sort the other way round; drafts must follow the document.
        let library = r#"{
            "z-side.mp3": { "title": "Zeta" },
            "a-side.mp3": { "title": "Alpha" }
        }"#;

        let drafts = parse_library(library).unwrap();

        assert_eq!(
            drafts[0].fields.get("title"),
            Some(&FieldValue::Text("Zeta".into()))
        );
        assert_eq!(
            drafts[1].fields.get("title"),
            Some(&FieldValue::Text("Alpha".into()))
        );
    }

    #[test]
    fn test_parse_rejects_non_object_top_level() {
        let result = parse_library("[1, 2, 3]");
        assert!(matches!(result, Err(EngineError::InvalidLibrary(_))));
    }

    #[test]
    fn test_parse_rejects_non_object_entry() {
        let result = parse_library(r#"{"track": "not an object"}"#);
        assert!(matches!(result, Err(EngineError::InvalidLibrary(_))));
    }

    #[test]
    fn test_parse_rejects_unsupported_field_shape() {
        let result = parse_library(r#"{"track": {"broken": true}}"#);

        match result {
            Err(EngineError::InvalidField { key, field, .. }) => {
                assert_eq!(key, "track");
                assert_eq!(field, "broken");
            }
            other => panic!("expected InvalidField, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let result = parse_library("{ not json");
        assert!(matches!(result, Err(EngineError::InvalidLibrary(_))));
    }
}
