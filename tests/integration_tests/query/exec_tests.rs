use cblite_mango::query::{ScanKind, execute, explain, parse_query};
use cblite_mango::store::DocumentStream;
use cblite_mango::{Document, DocumentId, DocumentStore, ExecOptions, MangoError, MemoryStore, StoreError, Value};
use serde_json::json;

use crate::integration_tests::_support::{ids, roster, store_of};

fn run(raw: &str) -> Vec<String> {
    let spec = parse_query(raw.as_bytes()).unwrap();
    ids(&execute(spec, &roster(), ExecOptions::default()).unwrap().try_collect().unwrap())
}

#[test]
fn skip_precedes_limit_regardless_of_key_order() {
    let a = run(r#"{"selector": {}, "sort": ["rank"], "limit": 1, "skip": 1}"#);
    let b = run(r#"{"selector": {}, "skip": 1, "limit": 1, "sort": ["rank"]}"#);
    assert_eq!(a, ["mario"]);
    assert_eq!(a, b);
}

#[test]
fn skip_past_the_end_is_empty() {
    assert!(run(r#"{"selector": {}, "skip": 10}"#).is_empty());
    assert!(run(r#"{"selector": {}, "limit": 0}"#).is_empty());
}

#[test]
fn sort_by_missing_field_puts_absent_first() {
    assert_eq!(run(r#"{"selector": {}, "sort": ["stats.hp"]}"#), ["luigi", "mario", "pikachu"]);
    assert_eq!(run(r#"{"selector": {}, "sort": [{"stats.hp": "desc"}]}"#), ["pikachu", "luigi", "mario"]);
}

#[test]
fn multi_key_sort_uses_later_keys_for_ties() {
    assert_eq!(
        run(r#"{"selector": {}, "sort": ["series", {"path": "rank", "direction": "desc"}]}"#),
        ["luigi", "mario", "pikachu"]
    );
}

#[test]
fn mixed_kinds_sort_by_collation() {
    let store = store_of(vec![
        json!({"_id": "s", "v": "x"}),
        json!({"_id": "o", "v": {"k": 1}}),
        json!({"_id": "n", "v": 3}),
        json!({"_id": "a", "v": [1]}),
        json!({"_id": "b", "v": true}),
        json!({"_id": "z", "v": null}),
    ]);
    let spec = parse_query(br#"{"selector": {}, "sort": ["v"]}"#).unwrap();
    let docs = execute(spec, &store, ExecOptions::default()).unwrap().try_collect().unwrap();
    assert_eq!(ids(&docs), ["z", "b", "n", "s", "a", "o"]);
}

#[test]
fn projection_runs_after_sort() {
    let spec = parse_query(br#"{"selector": {}, "sort": [{"rank": "desc"}], "fields": ["series"]}"#).unwrap();
    let docs = execute(spec, &roster(), ExecOptions::default()).unwrap().try_collect().unwrap();
    assert_eq!(ids(&docs), ["luigi", "mario", "pikachu"]);
    assert_eq!(docs[0].to_json(), json!({"_id": "luigi", "series": "mario"}));
}

#[test]
fn explain_reports_the_plan_without_a_store() {
    let spec = parse_query(br#"{"selector": {"_id": "mario"}, "limit": 3}"#).unwrap();
    let plan = explain(&spec);
    assert_eq!(plan.scan, ScanKind::IdLookup(DocumentId::from("mario")));
    assert_eq!(plan.limit, Some(3));
    assert!(plan.filter);
}

#[test]
fn id_lookup_for_a_missing_id_is_empty() {
    assert!(run(r#"{"selector": {"_id": "bowser"}}"#).is_empty());
}

#[test]
fn find_json_emits_an_array() {
    let out = cblite_mango::find_json(br#"{"selector": {"rank": {"$gt": 100}}}"#, &roster()).unwrap();
    assert_eq!(out, "[]");
    let err = cblite_mango::find_json(br#"{"selector": {"rank": {"$gt": 100}}, "bookmark": 1}"#, &roster());
    assert!(matches!(err, Err(MangoError::InvalidQueryShape { .. })));
}

// Serves fixed documents, with or without the id fast path.
struct Fixed {
    docs: Vec<Document>,
    lookup: bool,
}

impl DocumentStore for Fixed {
    fn enumerate(&self) -> Result<DocumentStream<'_>, StoreError> {
        Ok(Box::new(self.docs.clone().into_iter().map(Ok)))
    }

    fn lookup(&self, id: &DocumentId) -> Option<Result<Option<Document>, StoreError>> {
        self.lookup.then(|| Ok(self.docs.iter().find(|d| &d.id == id).cloned()))
    }
}

fn by_id<S: DocumentStore>(raw: &str, store: &S) -> Vec<String> {
    ids(&cblite_mango::find(raw.as_bytes(), store).unwrap())
}

#[test]
fn id_lookup_and_full_scan_agree_on_stale_body_ids() {
    let docs = vec![Document::new("k1", Value::from(json!({"_id": "body", "v": 1})))];
    let indexed = Fixed { docs: docs.clone(), lookup: true };
    let scanned = Fixed { docs, lookup: false };
    for raw in [r#"{"selector": {"_id": "body"}}"#, r#"{"selector": {"_id": "k1"}}"#] {
        assert_eq!(by_id(raw, &indexed), by_id(raw, &scanned), "{raw}");
    }
    assert_eq!(by_id(r#"{"selector": {"_id": "k1"}}"#, &indexed), ["k1"]);
    assert!(by_id(r#"{"selector": {"_id": "body"}}"#, &scanned).is_empty());
}

#[test]
fn memory_store_put_keeps_lookup_and_scan_in_step() {
    let store = MemoryStore::new();
    store.put(DocumentId::from("k1"), Value::from(json!({"_id": "body", "v": 1})));
    let scan_only = Fixed { docs: store.enumerate().unwrap().map(Result::unwrap).collect(), lookup: false };
    for raw in [r#"{"selector": {"_id": "body"}}"#, r#"{"selector": {"_id": "k1"}}"#] {
        assert_eq!(by_id(raw, &store), by_id(raw, &scan_only), "{raw}");
    }
    assert_eq!(by_id(r#"{"selector": {"_id": "k1", "v": 1}}"#, &store), ["k1"]);
}
