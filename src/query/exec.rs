use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::cursor::Cursor;
use super::types::{CmpOp, QuerySpec, Selector, SortSpec};
use crate::config::QueryConfig;
use crate::document::{Document, DocumentId, ID_FIELD};
use crate::errors::{MangoError, Result, StoreError};
use crate::store::{DocumentStore, DocumentStream};
use crate::value::{FieldPath, Value};

/// Cooperative cancellation flag shared between a caller and running cursors.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone)]
pub struct ExecOptions {
    pub cancel: Option<CancelToken>,
    /// Observed like a cancellation once passed.
    pub deadline: Option<Instant>,
    pub slow_query_ms: u64,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self::from_config(&QueryConfig::default())
    }
}

impl ExecOptions {
    #[must_use]
    pub fn from_config(cfg: &QueryConfig) -> Self {
        Self { cancel: None, deadline: None, slow_query_ms: cfg.slow_query_ms }
    }

    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(MangoError::Cancelled { reason: "cancelled".into() });
        }
        if self.deadline.is_some_and(|dl| Instant::now() >= dl) {
            return Err(MangoError::Cancelled { reason: "deadline exceeded".into() });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanKind {
    FullScan,
    /// Point lookup for a top-level `_id` equality.
    IdLookup(DocumentId),
}

impl ScanKind {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ScanKind::FullScan => "full_scan",
            ScanKind::IdLookup(_) => "id_lookup",
        }
    }
}

/// What `execute` would do for a query, without touching a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub scan: ScanKind,
    /// False when the selector is `{}` and every scanned document is returned.
    pub filter: bool,
    pub sort: Vec<SortSpec>,
    pub skip: usize,
    pub limit: Option<usize>,
    pub projection: Option<Vec<FieldPath>>,
}

#[must_use]
pub fn explain(spec: &QuerySpec) -> QueryPlan {
    QueryPlan {
        scan: plan_scan(&spec.selector),
        filter: !matches!(spec.selector, Selector::True),
        sort: spec.sort.clone(),
        skip: spec.skip,
        limit: spec.limit,
        projection: spec.projection.clone(),
    }
}

fn plan_scan(selector: &Selector) -> ScanKind {
    let id_eq = |s: &Selector| match s {
        Selector::Cmp { path, op: CmpOp::Eq, value: Value::String(id) }
            if path.depth() == 1 && path.first() == Some(ID_FIELD) =>
        {
            Some(DocumentId::from(id.as_str()))
        }
        _ => None,
    };
    let found = match selector {
        Selector::And(children) => children.iter().find_map(id_eq),
        other => id_eq(other),
    };
    found.map_or(ScanKind::FullScan, ScanKind::IdLookup)
}

/// Starts executing `spec` against `store`.
///
/// Nothing is pulled from the store until the cursor is advanced. Without a
/// sort the cursor streams; with one it drains and sorts the matches on the
/// first call to `next`.
///
/// # Errors
/// `StoreFailure` when the store cannot open a scan, or `Cancelled` when the
/// options are already cancelled.
pub fn execute<'s, S>(spec: QuerySpec, store: &'s S, opts: ExecOptions) -> Result<Cursor<'s>>
where
    S: DocumentStore + ?Sized,
{
    let started = Instant::now();
    let mut scan = plan_scan(&spec.selector);
    log::debug!(
        "query plan: {} sort_keys={} skip={} limit={:?}",
        scan.label(),
        spec.sort.len(),
        spec.skip,
        spec.limit
    );

    let stream = opts.check().and_then(|()| open_stream(store, &mut scan));

    match stream {
        Ok(stream) => Ok(Cursor::new(spec, stream, scan, opts, started)),
        Err(e) => {
            Cursor::record_failure(&scan, &e, started, opts.slow_query_ms);
            Err(e)
        }
    }
}

fn open_stream<'s, S>(store: &'s S, scan: &mut ScanKind) -> Result<DocumentStream<'s>>
where
    S: DocumentStore + ?Sized,
{
    if let ScanKind::IdLookup(id) = &*scan {
        match store.lookup(id) {
            Some(Ok(found)) => return Ok(Box::new(found.into_iter().map(Ok::<Document, StoreError>))),
            Some(Err(e)) => return Ok(Box::new(std::iter::once(Err::<Document, StoreError>(e)))),
            None => {
                log::debug!("store has no id lookup; falling back to a full scan");
                *scan = ScanKind::FullScan;
            }
        }
    }
    Ok(store.enumerate()?)
}
