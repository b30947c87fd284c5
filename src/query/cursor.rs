use std::time::Instant;

use super::eval::{compare_docs, matches, project};
use super::exec::{ExecOptions, ScanKind};
use super::telemetry::{self, ExecSummary, Outcome};
use super::types::{QuerySpec, Selector, SortSpec};
use crate::document::Document;
use crate::errors::{MangoError, Result};
use crate::store::DocumentStream;
use crate::value::FieldPath;

/// Lazy, single-pass result sequence returned by `execute`.
///
/// Yields `Err` at most once; after an error (or the last document) it only
/// returns `None`. A summary of the run is recorded when the cursor finishes
/// or is dropped.
pub struct Cursor<'s> {
    stream: DocumentStream<'s>,
    selector: Selector,
    sort: Vec<SortSpec>,
    projection: Option<Vec<FieldPath>>,
    sorted: Option<std::vec::IntoIter<Document>>,
    skip_left: usize,
    remaining: Option<usize>,
    opts: ExecOptions,
    scan: ScanKind,
    started: Instant,
    scanned: u64,
    matched: u64,
    returned: u64,
    finished: bool,
}

impl<'s> Cursor<'s> {
    pub(crate) fn new(
        spec: QuerySpec,
        stream: DocumentStream<'s>,
        scan: ScanKind,
        opts: ExecOptions,
        started: Instant,
    ) -> Self {
        Self {
            stream,
            selector: spec.selector,
            sort: spec.sort,
            projection: spec.projection,
            sorted: None,
            skip_left: spec.skip,
            remaining: spec.limit,
            opts,
            scan,
            started,
            scanned: 0,
            matched: 0,
            returned: 0,
            finished: false,
        }
    }

    /// Drains the cursor, returning every document or the first error.
    ///
    /// # Errors
    /// `StoreFailure` or `Cancelled` raised during the scan.
    pub fn try_collect(self) -> Result<Vec<Document>> {
        self.collect()
    }

    /// Drains the cursor into a JSON array string.
    ///
    /// # Errors
    /// Same as [`Cursor::try_collect`].
    pub fn to_json(self) -> Result<String> {
        let docs = self.try_collect()?;
        Ok(serde_json::Value::Array(docs.iter().map(Document::to_json).collect()).to_string())
    }

    pub(crate) fn record_failure(scan: &ScanKind, err: &MangoError, started: Instant, slow_query_ms: u64) {
        let duration_ms = elapsed_ms(started);
        telemetry::record(ExecSummary {
            scan: scan.label(),
            scanned: 0,
            matched: 0,
            returned: 0,
            duration_ms,
            slow: duration_ms >= slow_query_ms,
            outcome: outcome_of(err),
        });
    }

    fn finish(&mut self, outcome: Outcome) {
        if self.finished {
            return;
        }
        self.finished = true;
        let duration_ms = elapsed_ms(self.started);
        telemetry::record(ExecSummary {
            scan: self.scan.label(),
            scanned: self.scanned,
            matched: self.matched,
            returned: self.returned,
            duration_ms,
            slow: duration_ms >= self.opts.slow_query_ms,
            outcome,
        });
    }

    // Next document that passes the selector, straight from the store.
    fn next_match(&mut self) -> Result<Option<Document>> {
        loop {
            self.opts.check()?;
            let Some(item) = self.stream.next() else { return Ok(None) };
            let doc = item?;
            self.scanned += 1;
            if matches(&self.selector, &doc) {
                self.matched += 1;
                return Ok(Some(doc));
            }
            log::trace!("document {} rejected by selector", doc.id);
        }
    }

    fn materialize(&mut self) -> Result<std::vec::IntoIter<Document>> {
        let mut docs = Vec::new();
        while let Some(doc) = self.next_match()? {
            docs.push(doc);
        }
        docs.sort_by(|a, b| compare_docs(a, b, &self.sort));
        Ok(docs.into_iter())
    }

    fn pull(&mut self) -> Result<Option<Document>> {
        if self.remaining == Some(0) {
            return Ok(None);
        }
        if !self.sort.is_empty() && self.sorted.is_none() {
            self.sorted = Some(self.materialize()?);
        }
        loop {
            let next = match self.sorted.as_mut() {
                Some(buf) => {
                    self.opts.check()?;
                    buf.next()
                }
                None => self.next_match()?,
            };
            let Some(doc) = next else { return Ok(None) };
            if self.skip_left > 0 {
                self.skip_left -= 1;
                continue;
            }
            if let Some(n) = self.remaining.as_mut() {
                *n -= 1;
            }
            self.returned += 1;
            return Ok(Some(match &self.projection {
                Some(fields) => project(&doc, fields),
                None => doc,
            }));
        }
    }
}

impl Iterator for Cursor<'_> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.pull() {
            Ok(Some(doc)) => {
                if self.remaining == Some(0) {
                    self.finish(Outcome::Ok);
                }
                Some(Ok(doc))
            }
            Ok(None) => {
                self.finish(Outcome::Ok);
                None
            }
            Err(e) => {
                self.finish(outcome_of(&e));
                Some(Err(e))
            }
        }
    }
}

impl std::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("scan", &self.scan)
            .field("scanned", &self.scanned)
            .field("returned", &self.returned)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        self.finish(Outcome::Abandoned);
    }
}

fn outcome_of(err: &MangoError) -> Outcome {
    match err {
        MangoError::Cancelled { .. } => Outcome::Cancelled,
        _ => Outcome::Failed,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
