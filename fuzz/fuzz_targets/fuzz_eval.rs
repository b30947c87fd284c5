#![no_main]
use cblite_mango::query::{execute, parse_query};
use cblite_mango::{ExecOptions, MemoryStore};
use libfuzzer_sys::fuzz_target;
use serde_json::json;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    let Ok(spec) = parse_query(data) else { return };
    // A few shapes that reach the nested, array and metadata paths
    let Ok(store) = MemoryStore::from_json_docs(vec![
        json!({"_id": "a", "a": 1, "b": 2, "name": "x"}),
        json!({"_id": "b", "a": 10, "b": -5, "name": "y", "nested": {"z": 3}, "tags": ["p", "q"]}),
        json!({"_id": "c", "active": true, "a": null, "scores": [{"v": 1}, {"v": 2.5}]}),
    ]) else { return };
    if let Ok(cursor) = execute(spec, &store, ExecOptions::default()) {
        let _ = cursor.try_collect();
    }
});
