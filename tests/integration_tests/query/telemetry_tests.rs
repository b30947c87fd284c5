use cblite_mango::ExecOptions;
use cblite_mango::query::telemetry::{self, Outcome};
use cblite_mango::query::{execute, parse_query};

use crate::integration_tests::_support::roster;

#[test]
fn each_execution_records_one_summary() {
    let store = roster();
    let ((), summaries) = telemetry::capture_summaries(|| {
        for raw in [&br#"{"selector": {"series": "mario"}}"#[..], br#"{"selector": {"_id": "mario"}}"#] {
            let spec = parse_query(raw).unwrap();
            execute(spec, &store, ExecOptions::default()).unwrap().try_collect().unwrap();
        }
    });
    assert_eq!(summaries.len(), 2);
    assert_eq!((summaries[0].scan, summaries[0].scanned, summaries[0].returned), ("full_scan", 3, 2));
    assert_eq!((summaries[1].scan, summaries[1].scanned, summaries[1].returned), ("id_lookup", 1, 1));
    assert!(summaries.iter().all(|s| s.outcome == Outcome::Ok));
}

#[test]
fn zero_threshold_marks_every_query_slow() {
    let before = telemetry::snapshot();
    let opts = ExecOptions { slow_query_ms: 0, ..ExecOptions::default() };
    let spec = parse_query(br#"{"selector": {}}"#).unwrap();
    let ((), summaries) = telemetry::capture_summaries(|| {
        execute(spec, &roster(), opts).unwrap().try_collect().unwrap();
    });
    assert!(summaries[0].slow);
    let after = telemetry::snapshot();
    assert!(after.slow_queries_total > before.slow_queries_total);
    assert!(after.documents_scanned >= before.documents_scanned + 3);
}

#[test]
fn metrics_text_lists_every_counter() {
    let text = telemetry::metrics_text();
    for name in ["queries_total", "queries_failed", "queries_cancelled", "documents_scanned", "slow_queries_total"] {
        assert!(text.contains(&format!("cblite_mango_{name} ")), "missing {name}");
    }
}
