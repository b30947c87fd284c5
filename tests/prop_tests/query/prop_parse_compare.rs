use cblite_mango::query::{CmpOp, Selector, matches, parse_query};
use cblite_mango::{Document, Value};
use proptest::prelude::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 64,
        .. proptest::test_runner::Config::default()
    })]
    #[test]
    fn prop_parsed_number_matches_itself(v in -1.0e6f64..1.0e6f64) {
        let raw = format!("{{\"selector\": {{\"x\": {{\"$eq\": {v}}}}}}}");
        let spec = parse_query(raw.as_bytes()).unwrap();
        let Selector::Cmp { op: CmpOp::Eq, ref value, .. } = spec.selector else {
            return Err(TestCaseError::fail("not a $eq comparison"));
        };
        let hit = Document::new("h", Value::from(serde_json::json!({"x": value.as_f64().unwrap()})));
        let miss = Document::new("m", Value::from(serde_json::json!({"x": value.as_f64().unwrap() + 1.0})));
        prop_assert!(matches(&spec.selector, &hit));
        prop_assert!(!matches(&spec.selector, &miss));
    }

    #[test]
    fn prop_parser_never_panics(raw in ".{0,64}") {
        let _ = parse_query(raw.as_bytes());
    }

    #[test]
    fn prop_integer_and_float_spellings_agree(n in -10_000i64..10_000) {
        let int_q = parse_query(format!("{{\"selector\": {{\"x\": {n}}}}}").as_bytes()).unwrap();
        let float_q = parse_query(format!("{{\"selector\": {{\"x\": {n}.0}}}}").as_bytes()).unwrap();
        #[allow(clippy::cast_precision_loss)]
        let doc = Document::new("d", Value::Number(n as f64));
        let wrapped = Document::new("w", Value::from(serde_json::json!({"x": n})));
        prop_assert_eq!(matches(&int_q.selector, &wrapped), matches(&float_q.selector, &wrapped));
        prop_assert!(matches(&int_q.selector, &wrapped));
        prop_assert!(!matches(&int_q.selector, &doc));
    }
}
