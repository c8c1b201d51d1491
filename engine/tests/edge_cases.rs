//! Edge case tests for quotesync-engine
//!
//! These tests cover the sync scenarios end to end and boundary conditions
//! on quote text.

use quotesync_engine::{
    Error, Field, ImportSummary, MemoryPersistence, QuoteRecord, Store, SyncResult,
};

fn quote(text: &str, category: &str) -> QuoteRecord {
    QuoteRecord::new(text, category).unwrap()
}

fn store_with(quotes: Vec<QuoteRecord>) -> (Store, MemoryPersistence) {
    let persistence = MemoryPersistence::new();
    (Store::with_quotes(quotes, persistence.clone()), persistence)
}

// ============================================================================
// Sync Scenarios
// ============================================================================

#[test]
fn remote_category_replaces_local() {
    let (mut store, persistence) = store_with(vec![quote("Be bold", "Wisdom")]);

    let result = store.reconcile(vec![quote("Be bold", "Courage")]).unwrap();

    assert_eq!(
        result,
        SyncResult {
            added_count: 0,
            conflict_count: 1
        }
    );
    assert_eq!(store.list(None), vec![&quote("Be bold", "Courage")]);
    assert_eq!(persistence.saved().unwrap(), vec![quote("Be bold", "Courage")]);
}

#[test]
fn remote_quote_added_to_empty_store() {
    let (mut store, _) = store_with(vec![]);

    let result = store.reconcile(vec![quote("X", "Y")]).unwrap();

    assert_eq!(
        result,
        SyncResult {
            added_count: 1,
            conflict_count: 0
        }
    );
    assert_eq!(store.list(None), vec![&quote("X", "Y")]);
}

#[test]
fn identical_remote_quote_changes_nothing() {
    let (mut store, persistence) = store_with(vec![quote("X", "Y")]);

    let result = store.reconcile(vec![quote("X", "Y")]).unwrap();

    assert_eq!(result, SyncResult::default());
    assert_eq!(store.list(None), vec![&quote("X", "Y")]);
    assert_eq!(persistence.save_count(), 0);
}

#[test]
fn second_identical_sync_is_a_noop() {
    let (mut store, persistence) = store_with(vec![quote("A", "One"), quote("B", "Two")]);
    let batch = vec![quote("A", "Changed"), quote("C", "Three"), quote("D", "Four")];

    let first = store.reconcile(batch.clone()).unwrap();
    let second = store.reconcile(batch).unwrap();

    assert_eq!(
        first,
        SyncResult {
            added_count: 2,
            conflict_count: 1
        }
    );
    assert_eq!(second, SyncResult::default());
    assert_eq!(persistence.save_count(), 1);
}

#[test]
fn import_then_sync_then_export() {
    let (mut store, _) = store_with(vec![]);

    let summary = store
        .import_json(br#"[{"text":"A","category":"One"},{"text":"B","category":"Two"}]"#)
        .unwrap();
    assert_eq!(summary.added, 2);

    store.reconcile(vec![quote("B", "Remote")]).unwrap();

    let exported = store.export_json().unwrap();
    let reimported: Vec<QuoteRecord> = serde_json::from_str(&exported).unwrap();
    assert_eq!(reimported, vec![quote("A", "One"), quote("B", "Remote")]);
}

// ============================================================================
// String Edge Cases
// ============================================================================

#[test]
fn unicode_quotes() {
    let (mut store, _) = store_with(vec![]);

    let texts = [
        "日本語テスト",
        "Привет мир",
        "مرحبا بالعالم",
        "🎉🚀💯",
        "Ω≈ç√∫",
        "Hello\nWorld\tTab",
    ];

    for text in texts {
        store.add(text, "Unicode").unwrap();
    }

    assert_eq!(store.len(), texts.len());
    assert!(store.contains("привет мир", "unicode"));
}

#[test]
fn unicode_case_folding_in_keys() {
    let (mut store, _) = store_with(vec![quote("ÉCOLE", "Français")]);

    let result = store.reconcile(vec![quote("école", "FRANÇAIS")]).unwrap();

    assert_eq!(result, SyncResult::default());
}

#[test]
fn very_long_quote() {
    let (mut store, _) = store_with(vec![]);

    // 1MB quote
    let long_text = "x".repeat(1024 * 1024);
    store.add(&long_text, "Long").unwrap();

    let result = store.reconcile(vec![quote(&long_text, "Longer")]).unwrap();
    assert_eq!(result.conflict_count, 1);
    assert_eq!(store.list(None)[0].text().len(), 1024 * 1024);
}

#[test]
fn whitespace_only_fields_are_rejected() {
    let (mut store, _) = store_with(vec![]);

    assert_eq!(
        store.add(" \t\n", "Empty"),
        Err(Error::Validation(Field::Text))
    );
    assert_eq!(
        store.add("Text", "\u{2003}"),
        Err(Error::Validation(Field::Category))
    );
}

#[test]
fn category_filter_is_case_sensitive() {
    let (store, _) = store_with(vec![quote("A", "Life"), quote("B", "life")]);

    assert_eq!(store.list(Some("Life")).len(), 1);
    assert_eq!(store.distinct_categories(), vec!["all", "Life", "life"]);
}

// ============================================================================
// Import Edge Cases
// ============================================================================

#[test]
fn import_empty_array() {
    let (mut store, persistence) = store_with(vec![quote("A", "One")]);

    let summary = store.import_json(b"[]").unwrap();

    assert_eq!(summary, ImportSummary::default());
    assert_eq!(persistence.save_count(), 0);
}

#[test]
fn import_malformed_leaves_store_untouched() {
    let (mut store, persistence) = store_with(vec![quote("A", "One")]);

    for payload in [&b"null"[..], b"\"quotes\"", b"42", b"[1, 2", b""] {
        let result = store.import_json(payload);
        assert!(
            matches!(result, Err(Error::MalformedImportPayload(_))),
            "payload {:?} should be rejected",
            String::from_utf8_lossy(payload)
        );
    }

    assert_eq!(store.len(), 1);
    assert_eq!(persistence.save_count(), 0);
}

#[test]
fn import_dedups_within_payload() {
    let (mut store, _) = store_with(vec![]);

    let summary = store
        .import_json(
            br#"[
                {"text": "A", "category": "One"},
                {"text": " a ", "category": "ONE"},
                {"text": "A", "category": "Two"}
            ]"#,
        )
        .unwrap();

    assert_eq!(summary.added, 2);
    assert_eq!(summary.duplicates, 1);
}

#[test]
fn import_aborted_midway_applies_nothing() {
    let (mut store, persistence) = store_with(vec![quote("A", "One")]);

    let result = store.import(vec![
        Ok(quote("B", "Two")),
        Err(Error::Validation(Field::Text)),
        Err(Error::MalformedImportPayload("truncated stream".into())),
        Ok(quote("C", "Three")),
    ]);

    assert_eq!(
        result,
        Err(Error::MalformedImportPayload("truncated stream".into()))
    );
    assert_eq!(store.list(None), vec![&quote("A", "One")]);
    assert!(!store.contains("B", "Two"));
    assert_eq!(persistence.save_count(), 0);

    let summary = store.import(vec![Ok(quote("B", "Two"))]).unwrap();
    assert_eq!(
        summary,
        ImportSummary {
            added: 1,
            duplicates: 0,
            rejected: 0
        }
    );
}
