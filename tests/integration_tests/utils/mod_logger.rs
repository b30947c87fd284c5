use cblite_mango::logger;

#[test]
fn configure_logging_creates_the_directory_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("logs");
    logger::configure_logging(Some(&base), Some("debug"), Some(2)).unwrap();
    assert!(base.is_dir());
    logger::configure_logging(Some(&base), Some("info"), None).unwrap();
    log::info!(target: logger::METRICS_TARGET, "{{\"probe\":true}}");
}

#[test]
fn init_path_rejects_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    assert!(logger::init_path(&dir.path().join("absent.yaml")).is_err());
}
