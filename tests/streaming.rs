//! Streamed ingestion: cumulative adds, progress, library documents.

use filtrate::{
    Catalog, ControlValue, CriterionSpec, EngineConfig, FilterEngine, RecordDraft, RecordId,
};

fn track(title: &str, artist: &str, year: i64) -> RecordDraft {
    RecordDraft::new()
        .with_field("title", title)
        .with_field("artist", artist)
        .with_field("year", year)
}

// --- Cumulative Adds ---

#[test]
fn test_added_batches_extend_the_catalog_in_order() {
    let mut engine = FilterEngine::new(Catalog::new(), EngineConfig::default()).unwrap();

    engine.add(vec![
        track("Intro", "First Band", 1999),
        track("Outro", "First Band", 1999),
    ]);
    engine.add(vec![track("Encore", "Second Band", 2004)]);

    assert_eq!(engine.len(), 3);

    // Ids follow ingestion order across batches.
    let view = engine.filter();
    let ids: Vec<u64> = view.ids().map(|id| id.0).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let titles: Vec<_> = view
        .iter()
        .map(|r| r.field("title").and_then(|v| v.as_text()).unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Intro", "Outro", "Encore"]);
}

#[test]
fn test_add_reapplies_active_criteria() {
    let mut engine = FilterEngine::new(Catalog::new(), EngineConfig::default()).unwrap();
    let artist = engine.add_criterion(CriterionSpec::exact("artist")).unwrap();
    artist.set(ControlValue::single("Second Band"));

    engine.add(vec![track("Intro", "First Band", 1999)]);
    assert!(engine.last_result().unwrap().is_empty());

    engine.add(vec![track("Encore", "Second Band", 2004)]);

    let last = engine.last_result().unwrap();
    let ids: Vec<u64> = last.ids().map(|id| id.0).collect();
    assert_eq!(ids, vec![2]);
}

// --- Load Progress ---

#[test]
fn test_progress_against_declared_total() {
    let catalog = Catalog::with_expected_total(4);
    let mut engine = FilterEngine::new(catalog, EngineConfig::default()).unwrap();

    let progress = engine.add(vec![
        track("One", "Band", 2001),
        track("Two", "Band", 2002),
    ]);
    assert_eq!(progress.loaded, 2);
    assert_eq!(progress.percent(), Some(50.0));
    assert!(!progress.complete());

    let progress = engine.add(vec![
        track("Three", "Band", 2003),
        track("Four", "Band", 2004),
    ]);
    assert_eq!(progress.percent(), Some(100.0));
    assert!(progress.complete());
}

#[test]
fn test_progress_without_declared_total_has_no_percent() {
    let mut engine = FilterEngine::new(Catalog::new(), EngineConfig::default()).unwrap();

    let progress = engine.add(vec![track("One", "Band", 2001)]);

    assert_eq!(progress.loaded, 1);
    assert_eq!(progress.percent(), None);
    assert!(!progress.complete());
}

// --- Library Documents ---

#[test]
fn test_library_document_roundtrip() {
    let library = r#"{
        "_comment": "curated export, do not edit",
        "first": {
            "title": "Czerwone Gitary",
            "year": 1968,
            "web-directory": "archive/cg"
        },
        "second": {
            "title": "Budka Suflera",
            "year": 1974
        }
    }"#;

    let mut engine = FilterEngine::new(Catalog::new(), EngineConfig::default()).unwrap();
    let progress = engine.add_library(library).unwrap();

    // The comment entry is skipped, not ingested.
    assert_eq!(progress.loaded, 2);

    let first = engine.catalog().get(RecordId(1)).unwrap();
    assert_eq!(
        first.field("title").and_then(|v| v.as_text()),
        Some("Czerwone Gitary")
    );

    // Legacy directory key is renamed on the way in.
    assert_eq!(
        first.field("webdirectory").and_then(|v| v.as_text()),
        Some("archive/cg")
    );
    assert!(first.field("web-directory").is_none());

    let second = engine.catalog().get(RecordId(2)).unwrap();
    assert_eq!(
        second.field("title").and_then(|v| v.as_text()),
        Some("Budka Suflera")
    );
}

#[test]
fn test_library_ids_follow_document_order_not_key_order() {
    // Keys sort the other way round; ids must follow the document.
    let library = r#"{
        "zeta.mp3": { "title": "Zeta" },
        "alpha.mp3": { "title": "Alpha" }
    }"#;

    let mut engine = FilterEngine::new(Catalog::new(), EngineConfig::default()).unwrap();
    let progress = engine.add_library(library).unwrap();
    assert_eq!(progress.loaded, 2);

    let first = engine.catalog().get(RecordId(1)).unwrap();
    assert_eq!(first.field("title").and_then(|v| v.as_text()), Some("Zeta"));

    let second = engine.catalog().get(RecordId(2)).unwrap();
    assert_eq!(second.field("title").and_then(|v| v.as_text()), Some("Alpha"));
}

#[test]
fn test_malformed_library_document_is_rejected() {
    let mut engine = FilterEngine::new(Catalog::new(), EngineConfig::default()).unwrap();

    assert!(engine.add_library("[1, 2, 3]").is_err());
    assert!(engine.add_library("not json").is_err());

    // Nothing was ingested by the failed attempts.
    assert!(engine.is_empty());
}

// --- Change Pump ---

#[test]
fn test_pump_runs_one_pass_per_burst() {
    let mut catalog = Catalog::new();
    catalog.push(track("Intro", "First Band", 1999));
    catalog.push(track("Encore", "Second Band", 2004));

    let mut engine = FilterEngine::new(catalog, EngineConfig::default()).unwrap();
    let artist = engine.add_criterion(CriterionSpec::exact("artist")).unwrap();
    engine.pump();

    artist.set(ControlValue::single("First Band"));
    artist.set(ControlValue::single("Second Band"));

    let view = engine.pump().expect("a burst of changes queued");
    let ids: Vec<u64> = view.ids().map(|id| id.0).collect();
    assert_eq!(ids, vec![2]);

    assert!(engine.pump().is_none());
}
