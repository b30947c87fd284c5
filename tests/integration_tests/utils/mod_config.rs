use cblite_mango::QueryConfig;

#[test]
fn defaults_match_documented_limits() {
    let cfg = QueryConfig::default();
    assert_eq!(
        (cfg.max_selector_depth, cfg.max_path_depth, cfg.max_in_set, cfg.max_sort_fields, cfg.max_projection_fields),
        (32, 32, 1000, 8, 64)
    );
    assert_eq!(cfg.slow_query_ms, 500);
}

#[test]
fn file_values_feed_the_parser() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("limits.toml");
    std::fs::write(&path, "max_in_set = 2\n").unwrap();
    let cfg = QueryConfig::load(Some(&path)).unwrap();
    let raw = br#"{"selector": {"a": {"$in": [1, 2, 3]}}}"#;
    assert!(cblite_mango::query::parse_query_with(raw, &cfg).is_err());
    assert!(cblite_mango::parse_query(raw).is_ok());
}

#[test]
fn load_without_a_file_uses_defaults_or_env() {
    let cfg = QueryConfig::load(None).unwrap();
    assert!(cfg.max_in_set > 0);
}
