// Telemetry is a submodule of query
pub mod telemetry;

mod cursor;
mod eval;
mod exec;
mod parse;
mod pattern;
mod types;

pub use cursor::Cursor;
pub use eval::{compare_docs, matches, project};
pub use exec::{CancelToken, ExecOptions, QueryPlan, ScanKind, execute, explain};
pub use parse::{parse_query, parse_query_str, parse_query_value, parse_query_with, parse_selector};
pub use pattern::LikePattern;
#[cfg(feature = "regex")]
pub use pattern::RegexPattern;
pub use types::{CmpOp, Order, QuerySpec, Selector, SortSpec};
