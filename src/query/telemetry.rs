use serde::Serialize;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::logger::METRICS_TARGET;

#[derive(Default)]
pub struct Metrics {
    pub queries_total: AtomicU64,
    pub queries_failed: AtomicU64,
    pub queries_cancelled: AtomicU64,
    pub documents_scanned: AtomicU64,
    pub slow_queries_total: AtomicU64,
}

pub(crate) static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::default);

/// Point-in-time copy of the process-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_total: u64,
    pub queries_failed: u64,
    pub queries_cancelled: u64,
    pub documents_scanned: u64,
    pub slow_queries_total: u64,
}

#[must_use]
pub fn snapshot() -> MetricsSnapshot {
    let m = &*METRICS;
    MetricsSnapshot {
        queries_total: m.queries_total.load(Ordering::Relaxed),
        queries_failed: m.queries_failed.load(Ordering::Relaxed),
        queries_cancelled: m.queries_cancelled.load(Ordering::Relaxed),
        documents_scanned: m.documents_scanned.load(Ordering::Relaxed),
        slow_queries_total: m.slow_queries_total.load(Ordering::Relaxed),
    }
}

#[must_use]
pub fn metrics_text() -> String {
    let m = snapshot();
    format!(
        "cblite_mango_queries_total {}\n\
         cblite_mango_queries_failed {}\n\
         cblite_mango_queries_cancelled {}\n\
         cblite_mango_documents_scanned {}\n\
         cblite_mango_slow_queries_total {}\n",
        m.queries_total, m.queries_failed, m.queries_cancelled, m.documents_scanned, m.slow_queries_total,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    Failed,
    Cancelled,
    /// The cursor was dropped before it was drained.
    Abandoned,
}

/// One line per executed query, written to the metrics log target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecSummary {
    pub scan: &'static str,
    pub scanned: u64,
    pub matched: u64,
    pub returned: u64,
    pub duration_ms: u64,
    pub slow: bool,
    pub outcome: Outcome,
}

thread_local! {
    static SINK: RefCell<Option<Vec<ExecSummary>>> = const { RefCell::new(None) };
}

/// Runs `f` and returns every summary recorded on this thread meanwhile.
pub fn capture_summaries<R>(f: impl FnOnce() -> R) -> (R, Vec<ExecSummary>) {
    let previous = SINK.with(|s| s.borrow_mut().replace(Vec::new()));
    let out = f();
    let captured = SINK.with(|s| std::mem::replace(&mut *s.borrow_mut(), previous)).unwrap_or_default();
    (out, captured)
}

pub(crate) fn record(summary: ExecSummary) {
    let m = &*METRICS;
    m.queries_total.fetch_add(1, Ordering::Relaxed);
    m.documents_scanned.fetch_add(summary.scanned, Ordering::Relaxed);
    match summary.outcome {
        Outcome::Failed => {
            m.queries_failed.fetch_add(1, Ordering::Relaxed);
        }
        Outcome::Cancelled => {
            m.queries_cancelled.fetch_add(1, Ordering::Relaxed);
        }
        Outcome::Ok | Outcome::Abandoned => {}
    }
    if summary.slow {
        m.slow_queries_total.fetch_add(1, Ordering::Relaxed);
        log::warn!(
            "slow query: {} ms ({} scan, {} scanned, {} returned)",
            summary.duration_ms,
            summary.scan,
            summary.scanned,
            summary.returned
        );
    }
    match serde_json::to_string(&summary) {
        Ok(line) => log::info!(target: METRICS_TARGET, "{line}"),
        Err(e) => log::debug!("cannot serialize query summary: {e}"),
    }
    SINK.with(|s| {
        if let Some(buf) = s.borrow_mut().as_mut() {
            buf.push(summary);
        }
    });
}
