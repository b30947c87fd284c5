//! Mango-style JSON queries over an abstract document store.
//!
//! A query document (`selector`, `fields`, `sort`, `skip`, `limit`) is parsed
//! and validated up front, then executed lazily against any [`DocumentStore`].

pub mod config;
pub mod document;
pub mod errors;
pub mod logger;
pub mod query;
pub mod store;
pub mod value;

pub use crate::config::QueryConfig;
pub use crate::document::{Document, DocumentId, FieldSource};
pub use crate::errors::{MangoError, Result, StoreError};
pub use crate::query::{CancelToken, Cursor, ExecOptions, QuerySpec, execute, explain, parse_query};
pub use crate::store::{DocumentStore, MemoryStore};
pub use crate::value::{FieldPath, Value};

/// Configures logging from the `CBLITE_MANGO_LOG_*` environment variables.
///
/// # Errors
/// Returns an error if the log directory or appenders cannot be created.
pub fn init() -> std::result::Result<(), Box<dyn std::error::Error>> {
    logger::configure_from_env()
}

/// Parses `raw` and runs it to completion with default limits.
///
/// # Errors
/// Any parse error, or a `StoreFailure` raised by the store.
pub fn find<S: DocumentStore + ?Sized>(raw: &[u8], store: &S) -> Result<Vec<Document>> {
    find_with(raw, store, &QueryConfig::default(), ExecOptions::default())
}

/// Like [`find`], with explicit limits and execution options.
///
/// # Errors
/// Any parse error, `StoreFailure`, or `Cancelled`.
pub fn find_with<S: DocumentStore + ?Sized>(
    raw: &[u8],
    store: &S,
    cfg: &QueryConfig,
    opts: ExecOptions,
) -> Result<Vec<Document>> {
    let spec = query::parse_query_with(raw, cfg)?;
    execute(spec, store, opts)?.try_collect()
}

/// Runs `raw` and returns the result as a serialized JSON array.
///
/// # Errors
/// Same as [`find`].
pub fn find_json<S: DocumentStore + ?Sized>(raw: &[u8], store: &S) -> Result<String> {
    let spec = parse_query(raw)?;
    execute(spec, store, ExecOptions::default())?.to_json()
}
