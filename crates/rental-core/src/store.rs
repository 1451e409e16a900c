//! # Document Store
//!
//! Seam between the storefront and the hosted document database.
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │              DocumentStore (trait)               │
//! │  ├── query(doc type + equality filters)          │
//! │  ├── create / patch / delete                     │
//! │  └── image_url(asset reference)                  │
//! └──────────────────────────────────────────────────┘
//!                        ▲
//!          ┌─────────────┴─────────────┐
//!  ┌───────┴────────┐         ┌────────┴────────┐
//!  │  SanityClient  │         │ InMemoryDocument│
//!  │ (rental-sanity)│         │      Store      │
//!  └────────────────┘         └─────────────────┘
//! ```
//!
//! Documents travel as JSON objects carrying the store's `_id` and `_type`
//! system fields. Typed access goes through [`crate::Repository`].

use crate::error::{RentalError, RentalResult};
use crate::records::{CarCatalog, Reference};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Equality filter on a (possibly nested, dot-separated) document path
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub path: String,
    pub value: Value,
}

/// Query for all documents of one type matching every filter
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub doc_type: String,
    pub filters: Vec<Filter>,
}

impl Query {
    pub fn of_type(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            filters: Vec::new(),
        }
    }

    /// Builder: add `path == value`
    pub fn filter(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            path: path.into(),
            value: value.into(),
        });
        self
    }

    /// Does `doc` satisfy this query?
    pub fn matches(&self, doc: &Value) -> bool {
        if doc.get("_type").and_then(Value::as_str) != Some(self.doc_type.as_str()) {
            return false;
        }
        self.filters
            .iter()
            .all(|f| lookup(doc, &f.path) == Some(&f.value))
    }
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |node, key| node.get(key))
}

/// Hosted document database operations used by the storefront.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents matching `query`, in store order
    async fn query(&self, query: &Query) -> RentalResult<Vec<Value>>;

    /// Single document by id and type
    async fn get(&self, doc_type: &str, id: &str) -> RentalResult<Option<Value>> {
        let docs = self
            .query(&Query::of_type(doc_type).filter("_id", id))
            .await?;
        Ok(docs.into_iter().next())
    }

    /// Create a document; the store assigns `_id` if absent. Returns the
    /// stored document.
    async fn create(&self, doc_type: &str, doc: Value) -> RentalResult<Value>;

    /// Merge `set` into the top level of an existing document. Returns the
    /// updated document, or `None` if no document has that id.
    async fn patch(&self, id: &str, set: Map<String, Value>) -> RentalResult<Option<Value>>;

    /// Delete a document. Returns false if nothing was deleted.
    async fn delete(&self, id: &str) -> RentalResult<bool>;

    /// Resolve an image asset reference to a public URL
    fn image_url(&self, _asset: &Reference) -> Option<String> {
        None
    }

    /// Backend name (for logging)
    fn backend_name(&self) -> &'static str;
}

/// Shared handle used by application state
pub type SharedDocumentStore = Arc<dyn DocumentStore>;

/// Process-local document store. Used for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    docs: RwLock<Vec<Value>>,
    fail_writes: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with every car in `catalog`
    pub fn seeded(catalog: &CarCatalog) -> RentalResult<Self> {
        let mut docs = Vec::with_capacity(catalog.cars.len());
        for car in &catalog.cars {
            car.validate()?;
            let mut doc = serde_json::to_value(car)?;
            stamp(&mut doc, "car")?;
            docs.push(doc);
        }
        Ok(Self {
            docs: RwLock::new(docs),
            fail_writes: AtomicBool::new(false),
        })
    }

    /// Make every subsequent write fail with a store error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }

    fn check_writable(&self) -> RentalResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RentalError::Store("write rejected".to_string()));
        }
        Ok(())
    }
}

/// Set `_type` and assign an `_id` when the document has none
fn stamp(doc: &mut Value, doc_type: &str) -> RentalResult<String> {
    let obj = doc
        .as_object_mut()
        .ok_or_else(|| RentalError::InvalidRequest("document must be a JSON object".into()))?;

    let id = match obj.get("_id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    };
    obj.insert("_id".into(), Value::String(id.clone()));
    obj.insert("_type".into(), Value::String(doc_type.to_string()));
    Ok(id)
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn query(&self, query: &Query) -> RentalResult<Vec<Value>> {
        let docs = self.docs.read().await;
        Ok(docs.iter().filter(|d| query.matches(d)).cloned().collect())
    }

    async fn create(&self, doc_type: &str, mut doc: Value) -> RentalResult<Value> {
        self.check_writable()?;
        let id = stamp(&mut doc, doc_type)?;

        let mut docs = self.docs.write().await;
        if docs.iter().any(|d| d.get("_id").and_then(Value::as_str) == Some(&id)) {
            return Err(RentalError::Store(format!("document {} already exists", id)));
        }
        docs.push(doc.clone());
        debug!(doc_type, id = %id, "Document created");
        Ok(doc)
    }

    async fn patch(&self, id: &str, set: Map<String, Value>) -> RentalResult<Option<Value>> {
        self.check_writable()?;
        let mut docs = self.docs.write().await;
        let Some(doc) = docs
            .iter_mut()
            .find(|d| d.get("_id").and_then(Value::as_str) == Some(id))
        else {
            return Ok(None);
        };

        if let Some(obj) = doc.as_object_mut() {
            for (key, value) in set {
                if key != "_id" && key != "_type" {
                    obj.insert(key, value);
                }
            }
        }
        debug!(id, "Document patched");
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, id: &str) -> RentalResult<bool> {
        self.check_writable()?;
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|d| d.get("_id").and_then(Value::as_str) != Some(id));
        Ok(docs.len() < before)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
