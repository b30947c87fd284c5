use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::value::{FieldPath, Object, Value};

pub const ID_FIELD: &str = "_id";
pub const REV_FIELD: &str = "_rev";

/// Identifier a store assigns to each document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A document as enumerated from a store. The query core only reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub rev: Option<String>,
    pub body: Value,
}

impl Document {
    #[must_use]
    pub fn new(id: impl Into<DocumentId>, body: Value) -> Self {
        Self { id: id.into(), rev: None, body }
    }

    #[must_use]
    pub fn with_rev(mut self, rev: impl Into<String>) -> Self {
        self.rev = Some(rev.into());
        self
    }

    /// Resolves a dotted path. A top-level `_id` is always the document's id
    /// and `_rev` its revision when known, whatever the body carries.
    #[must_use]
    pub fn field_at(&self, path: &FieldPath) -> Option<FieldRef<'_>> {
        if path.depth() == 1 {
            match path.first() {
                Some(ID_FIELD) => return Some(FieldRef::Owned(Value::String(self.id.0.clone()))),
                Some(REV_FIELD) if self.rev.is_some() => {
                    return self.rev.clone().map(|r| FieldRef::Owned(Value::String(r)));
                }
                _ => {}
            }
        }
        self.body.lookup(path).map(FieldRef::Borrowed)
    }

    /// The body as an object with `_id` first (and `_rev` second when known).
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut out = match &self.body {
            Value::Object(o) => o.clone(),
            other => {
                let mut o = Object::new();
                o.insert("value", other.clone());
                o
            }
        };
        if let Some(rev) = &self.rev {
            out.insert_first(REV_FIELD, Value::String(rev.clone()));
        }
        out.insert_first(ID_FIELD, Value::String(self.id.0.clone()));
        Value::Object(out)
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.to_value().to_json()
    }
}

impl Serialize for Document {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// A resolved field, either borrowed from the body or synthesized from metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRef<'a> {
    Borrowed(&'a Value),
    Owned(Value),
}

impl std::ops::Deref for FieldRef<'_> {
    type Target = Value;
    fn deref(&self) -> &Value {
        match self {
            FieldRef::Borrowed(v) => v,
            FieldRef::Owned(v) => v,
        }
    }
}

/// Anything a selector can be evaluated against.
pub trait FieldSource {
    fn field_at(&self, path: &FieldPath) -> Option<FieldRef<'_>>;
}

impl FieldSource for Value {
    fn field_at(&self, path: &FieldPath) -> Option<FieldRef<'_>> {
        self.lookup(path).map(FieldRef::Borrowed)
    }
}

impl FieldSource for Document {
    fn field_at(&self, path: &FieldPath) -> Option<FieldRef<'_>> {
        Document::field_at(self, path)
    }
}
