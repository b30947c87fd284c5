use cblite_mango::{DocumentId, DocumentStore, MemoryStore, Value};
use serde_json::json;
use std::sync::Arc;

#[test]
fn rejects_non_object_documents() {
    let err = MemoryStore::from_json_docs(vec![json!({"a": 1}), json!(3)]).unwrap_err();
    assert!(matches!(err, cblite_mango::MangoError::InvalidQueryShape { ref path, .. } if path == "[1]"));
}

#[test]
fn writes_bump_the_revision_generation() {
    let store = MemoryStore::new();
    let id = store.insert(Value::from(json!({"_id": "k", "v": 1})));
    assert_eq!(id, DocumentId::from("k"));
    let first = store.get(&id).unwrap().rev.unwrap();
    store.put(id.clone(), Value::from(json!({"v": 2, "_rev": "bogus"})));
    let doc = store.get(&id).unwrap();
    assert!(first.starts_with("1-"));
    assert!(doc.rev.unwrap().starts_with("2-"));
    assert_eq!(doc.body.to_json(), json!({"v": 2}));
}

#[test]
fn enumeration_is_a_snapshot() {
    let store = MemoryStore::new();
    store.insert(Value::from(json!({"v": 1})));
    let mut scan = store.enumerate().unwrap();
    store.insert(Value::from(json!({"v": 2})));
    assert!(scan.next().is_some());
    assert!(scan.next().is_none());
    assert_eq!(store.len(), 2);
}

#[test]
fn concurrent_queries_share_one_store() {
    let store = Arc::new(crate::integration_tests::_support::roster());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || cblite_mango::find(br#"{"selector": {"series": "mario"}}"#, &store).unwrap().len())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), 2);
    }
}

#[test]
fn delete_removes_from_later_scans() {
    let store = crate::integration_tests::_support::roster();
    assert!(store.delete(&DocumentId::from("luigi")));
    assert!(!store.delete(&DocumentId::from("luigi")));
    let docs = cblite_mango::find(br#"{"selector": {}}"#, &store).unwrap();
    assert_eq!(crate::integration_tests::_support::ids(&docs), ["mario", "pikachu"]);
}
