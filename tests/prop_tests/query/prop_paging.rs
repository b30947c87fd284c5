use cblite_mango::query::{execute, parse_query};
use cblite_mango::{ExecOptions, MemoryStore, Value};
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 64,
        .. proptest::test_runner::Config::default()
    })]
    #[test]
    fn prop_skip_then_limit_count(k in 0usize..25, n in 0usize..30, m in 0usize..30, sorted in any::<bool>()) {
        let store = MemoryStore::new();
        for i in 0..k {
            store.insert(Value::from(json!({"_id": format!("k{i:02}"), "v": (i * 7) % 5})));
        }
        let sort = if sorted { r#", "sort": ["v"]"# } else { "" };
        let all_raw = format!("{{\"selector\": {{}}{sort}}}");
        let paged_raw = format!("{{\"limit\": {m}, \"selector\": {{}}{sort}, \"skip\": {n}}}");

        let all = execute(parse_query(all_raw.as_bytes()).unwrap(), &store, ExecOptions::default()).unwrap().try_collect().unwrap();
        let paged = execute(parse_query(paged_raw.as_bytes()).unwrap(), &store, ExecOptions::default()).unwrap().try_collect().unwrap();

        prop_assert_eq!(paged.len(), m.min(k.saturating_sub(n)));
        let expected: Vec<_> = all.iter().skip(n).take(m).map(|d| d.id.clone()).collect();
        let got: Vec<_> = paged.iter().map(|d| d.id.clone()).collect();
        prop_assert_eq!(got, expected);
    }
}
