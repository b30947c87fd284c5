use cblite_mango::query::{CmpOp, Order, Selector, parse_query, parse_query_with};
use cblite_mango::{MangoError, QueryConfig};

fn shape_path(raw: &str) -> String {
    match parse_query(raw.as_bytes()) {
        Err(MangoError::InvalidQueryShape { path, .. }) => path,
        other => panic!("expected InvalidQueryShape for {raw}, got {other:?}"),
    }
}

#[test]
fn malformed_input_reports_byte_offset() {
    let raw = b"{\"selector\": {\"a\": tru}}";
    match parse_query(raw) {
        Err(MangoError::MalformedJson { offset, line, .. }) => {
            assert_eq!(line, 1);
            assert!(offset > 0 && offset <= raw.len());
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(parse_query(b""), Err(MangoError::MalformedJson { .. })));
}

#[test]
fn error_paths_point_into_nested_selectors() {
    assert_eq!(shape_path(r#"{"selector": {"$or": [{"a": 1}, {"rank": {"$in": 5}}]}}"#), "selector.$or[1].rank.$in");
    assert_eq!(shape_path(r#"{"selector": {"a": {"$elemMatch": {"$and": []}}}}"#), "selector.a.$elemMatch.$and");
    assert_eq!(shape_path(r#"{"selector": {"a..b": 1}}"#), "selector.a..b");
}

#[test]
fn unsupported_operator_names_the_operator() {
    match parse_query(br#"{"selector": {"$or": [{"a": {"$text": "x"}}]}}"#) {
        Err(MangoError::UnsupportedOperator { operator, path }) => {
            assert_eq!(operator, "$text");
            assert_eq!(path, "selector.$or[0].a.$text");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn parse_errors_are_classified() {
    for raw in [&b"nope"[..], br#"{"sort": []}"#, br#"{"selector": {"a": {"$foo": 1}}}"#] {
        assert!(parse_query(raw).unwrap_err().is_parse_error());
    }
}

#[test]
fn escaped_dots_stay_in_one_segment() {
    let spec = parse_query(br#"{"selector": {"a\\.b": 1}}"#).unwrap();
    match spec.selector {
        Selector::Cmp { path, op: CmpOp::Eq, .. } => assert_eq!(path.segments(), ["a.b"]),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn sort_and_paging_are_captured() {
    let spec = parse_query(br#"{"selector": {}, "limit": 2, "skip": 1, "sort": [{"rank": "desc"}, "name"]}"#).unwrap();
    assert_eq!(spec.limit, Some(2));
    assert_eq!(spec.skip, 1);
    assert_eq!(spec.sort[0].order, Order::Desc);
    assert_eq!(spec.sort[1].order, Order::Asc);
}

#[test]
fn configured_limits_are_enforced_not_truncated() {
    let cfg = QueryConfig { max_sort_fields: 1, max_projection_fields: 1, max_path_depth: 2, ..QueryConfig::default() };
    for raw in [
        &br#"{"selector": {}, "sort": ["a", "b"]}"#[..],
        br#"{"selector": {}, "fields": ["a", "b"]}"#,
        br#"{"selector": {"a.b.c": 1}}"#,
        br#"{"selector": {"a": {"b": {"c": 1}}}}"#,
    ] {
        assert!(matches!(parse_query_with(raw, &cfg), Err(MangoError::InvalidQueryShape { .. })));
    }
}

#[cfg(not(feature = "regex"))]
#[test]
fn regex_needs_the_feature() {
    assert!(matches!(
        parse_query(br#"{"selector": {"a": {"$regex": "x"}}}"#),
        Err(MangoError::UnsupportedOperator { .. })
    ));
}
