use serde::{Deserialize, Serialize};

use super::pattern::LikePattern;
#[cfg(feature = "regex")]
use super::pattern::RegexPattern;
use crate::value::{FieldPath, Kind, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub path: FieldPath,
    pub order: Order,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CmpOp {
    #[must_use]
    pub fn from_operator(op: &str) -> Option<Self> {
        Some(match op {
            "$eq" => CmpOp::Eq,
            "$ne" => CmpOp::Ne,
            "$gt" => CmpOp::Gt,
            "$gte" => CmpOp::Gte,
            "$lt" => CmpOp::Lt,
            "$lte" => CmpOp::Lte,
            _ => return None,
        })
    }
}

/// Parsed selector tree.
///
/// `And`/`Or`/`Nor` always hold at least one child. Paths are non-empty except
/// inside `ElemMatch`, where an empty path addresses the array element itself.
#[derive(Debug, Clone)]
pub enum Selector {
    /// The empty selector `{}`.
    True,
    And(Vec<Selector>),
    Or(Vec<Selector>),
    Nor(Vec<Selector>),
    Not(Box<Selector>),
    Cmp { path: FieldPath, op: CmpOp, value: Value },
    In { path: FieldPath, values: Vec<Value> },
    Nin { path: FieldPath, values: Vec<Value> },
    Exists { path: FieldPath, exists: bool },
    Type { path: FieldPath, kind: Kind },
    Size { path: FieldPath, len: usize },
    Mod { path: FieldPath, divisor: i64, remainder: i64 },
    All { path: FieldPath, values: Vec<Value> },
    Like { path: FieldPath, pattern: LikePattern },
    #[cfg(feature = "regex")]
    Regex { path: FieldPath, pattern: RegexPattern },
    ElemMatch { path: FieldPath, selector: Box<Selector> },
}

impl Selector {
    /// Wraps a non-empty conjunction, collapsing the single-child case.
    pub(crate) fn all_of(mut parts: Vec<Selector>) -> Selector {
        match parts.len() {
            0 => Selector::True,
            1 => parts.pop().unwrap_or(Selector::True),
            _ => Selector::And(parts),
        }
    }
}

/// A fully validated query, immutable once built.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub selector: Selector,
    /// `None` returns whole documents; `Some(vec![])` returns only `_id`.
    pub projection: Option<Vec<FieldPath>>,
    pub sort: Vec<SortSpec>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl QuerySpec {
    /// Matches every document with no projection, sort or paging.
    #[must_use]
    pub fn all() -> Self {
        Self { selector: Selector::True, projection: None, sort: Vec::new(), skip: 0, limit: None }
    }
}
