use thiserror::Error;

pub type Result<T, E = MangoError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum MangoError {
    #[error("malformed JSON at line {line}, column {column} (byte {offset}): {message}")]
    MalformedJson { message: String, line: usize, column: usize, offset: usize },

    #[error("invalid query shape at `{path}`: {reason}")]
    InvalidQueryShape { path: String, reason: String },

    #[error("unsupported operator `{operator}` at `{path}`")]
    UnsupportedOperator { operator: String, path: String },

    #[error("store failure: {0}")]
    StoreFailure(#[from] StoreError),

    #[error("query cancelled: {reason}")]
    Cancelled { reason: String },
}

impl MangoError {
    pub(crate) fn shape(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQueryShape { path: path.into(), reason: reason.into() }
    }

    pub(crate) fn unsupported(operator: impl Into<String>, path: impl Into<String>) -> Self {
        Self::UnsupportedOperator { operator: operator.into(), path: path.into() }
    }

    /// Builds a `MalformedJson` from a serde error, resolving the byte offset
    /// against the raw input serde was reading.
    pub(crate) fn malformed(err: &serde_json::Error, raw: &[u8]) -> Self {
        let (line, column) = (err.line(), err.column());
        Self::MalformedJson {
            message: err.to_string(),
            line,
            column,
            offset: byte_offset(raw, line, column),
        }
    }

    /// True for errors raised before any store enumeration.
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedJson { .. } | Self::InvalidQueryShape { .. } | Self::UnsupportedOperator { .. }
        )
    }
}

/// Failures raised by a `DocumentStore` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

// serde_json reports 1-based lines and columns; line 0 means "no position".
fn byte_offset(raw: &[u8], line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }
    let mut start = 0usize;
    for _ in 1..line {
        match raw[start..].iter().position(|b| *b == b'\n') {
            Some(nl) => start += nl + 1,
            None => return raw.len(),
        }
    }
    (start + column.saturating_sub(1)).min(raw.len())
}
