//! The document-store capability the query core consumes, plus an in-memory
//! implementation used by tests and embedders without a storage engine.

use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

use crate::document::{Document, DocumentId, ID_FIELD, REV_FIELD};
use crate::errors::{MangoError, Result, StoreError};
use crate::value::Value;

/// A lazy, finite scan over a store. Each item may fail independently.
pub type DocumentStream<'a> = Box<dyn Iterator<Item = Result<Document, StoreError>> + Send + 'a>;

pub trait DocumentStore: Send + Sync {
    /// Starts a fresh scan in the store's natural order.
    ///
    /// # Errors
    /// Returns a `StoreError` when the scan cannot be opened.
    fn enumerate(&self) -> Result<DocumentStream<'_>, StoreError>;

    /// Point lookup used by the planner for `_id` equality. `None` means the
    /// store has no fast path and the planner falls back to `enumerate`.
    fn lookup(&self, _id: &DocumentId) -> Option<Result<Option<Document>, StoreError>> {
        None
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn enumerate(&self) -> Result<DocumentStream<'_>, StoreError> {
        (**self).enumerate()
    }

    fn lookup(&self, id: &DocumentId) -> Option<Result<Option<Document>, StoreError>> {
        (**self).lookup(id)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    doc: Document,
    generation: u64,
}

/// Insertion-ordered in-memory collection.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slots: Arc<RwLock<Vec<Slot>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from JSON objects, taking ids from their `_id` field.
    ///
    /// # Errors
    /// Returns `InvalidQueryShape` if any entry is not a JSON object.
    pub fn from_json_docs<I>(docs: I) -> Result<Self>
    where
        I: IntoIterator<Item = serde_json::Value>,
    {
        let store = Self::new();
        for (i, doc) in docs.into_iter().enumerate() {
            if !doc.is_object() {
                return Err(MangoError::shape(format!("[{i}]"), "document must be a JSON object"));
            }
            store.insert(Value::from(doc));
        }
        Ok(store)
    }

    /// Inserts a document body. The id comes from a string `_id` when present,
    /// otherwise a fresh UUID. An existing id is replaced in place.
    pub fn insert(&self, body: Value) -> DocumentId {
        let id = match &body {
            Value::Object(o) => o.get(ID_FIELD).and_then(Value::as_str).map(DocumentId::from),
            _ => None,
        }
        .unwrap_or_default();
        self.put(id.clone(), body);
        id
    }

    /// Writes `body` under `id`, bumping the revision generation. `_id` and
    /// `_rev` are kept as metadata only, so a stale body `_id` cannot disagree
    /// with the key.
    pub fn put(&self, id: DocumentId, mut body: Value) {
        if let Value::Object(o) = &mut body {
            o.remove(ID_FIELD);
            o.remove(REV_FIELD);
        }
        let mut slots = self.slots.write();
        if let Some(slot) = slots.iter_mut().find(|s| s.doc.id == id) {
            slot.generation += 1;
            slot.doc.body = body;
            slot.doc.rev = Some(new_rev(slot.generation));
            return;
        }
        log::trace!("memory store insert {id}");
        slots.push(Slot { doc: Document { id, rev: Some(new_rev(1)), body }, generation: 1 });
    }

    #[must_use]
    pub fn get(&self, id: &DocumentId) -> Option<Document> {
        self.slots.read().iter().find(|s| &s.doc.id == id).map(|s| s.doc.clone())
    }

    pub fn delete(&self, id: &DocumentId) -> bool {
        let mut slots = self.slots.write();
        let before = slots.len();
        slots.retain(|s| &s.doc.id != id);
        slots.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

fn new_rev(generation: u64) -> String {
    format!("{generation}-{}", Uuid::new_v4().simple())
}

impl DocumentStore for MemoryStore {
    // Snapshot under the read lock so writers are not blocked for a whole scan.
    fn enumerate(&self) -> Result<DocumentStream<'_>, StoreError> {
        let snapshot: Vec<Document> = self.slots.read().iter().map(|s| s.doc.clone()).collect();
        Ok(Box::new(snapshot.into_iter().map(Ok)))
    }

    fn lookup(&self, id: &DocumentId) -> Option<Result<Option<Document>, StoreError>> {
        Some(Ok(self.get(id)))
    }
}
