//! # Repositories
//!
//! Typed CRUD over a [`DocumentStore`] for one [`Record`] type.

use crate::error::{RentalError, RentalResult};
use crate::records::Record;
use crate::store::{Query, SharedDocumentStore};
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use tracing::instrument;

pub struct Repository<R> {
    store: SharedDocumentStore,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Record> Repository<R> {
    pub fn new(store: SharedDocumentStore) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    pub fn store(&self) -> &SharedDocumentStore {
        &self.store
    }

    /// Every document of this type
    pub async fn list(&self) -> RentalResult<Vec<R>> {
        self.find(Query::of_type(R::DOC_TYPE)).await
    }

    /// Documents of this type matching `query`'s filters
    pub async fn find(&self, query: Query) -> RentalResult<Vec<R>> {
        let query = Query {
            doc_type: R::DOC_TYPE.to_string(),
            ..query
        };
        self.store
            .query(&query)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Fetch by id; missing documents are a not-found error
    pub async fn get(&self, id: &str) -> RentalResult<R> {
        match self.store.get(R::DOC_TYPE, id).await? {
            Some(doc) => decode(doc),
            None => Err(RentalError::not_found(R::KIND, id)),
        }
    }

    #[instrument(skip(self, record), fields(doc_type = R::DOC_TYPE))]
    pub async fn create(&self, record: &R) -> RentalResult<R> {
        let doc = serde_json::to_value(record)?;
        decode(self.store.create(R::DOC_TYPE, doc).await?)
    }

    /// Set the non-null top-level fields of `changes` on document `id`
    #[instrument(skip(self, changes), fields(doc_type = R::DOC_TYPE))]
    pub async fn patch<P: Serialize>(&self, id: &str, changes: &P) -> RentalResult<R> {
        let set = into_set(changes)?;
        self.ensure_exists(id).await?;
        match self.store.patch(id, set).await? {
            Some(doc) => decode(doc),
            None => Err(RentalError::not_found(R::KIND, id)),
        }
    }

    #[instrument(skip(self), fields(doc_type = R::DOC_TYPE))]
    pub async fn delete(&self, id: &str) -> RentalResult<()> {
        self.ensure_exists(id).await?;
        if self.store.delete(id).await? {
            Ok(())
        } else {
            Err(RentalError::not_found(R::KIND, id))
        }
    }

    /// Store mutations address documents by id alone, so check the type first
    async fn ensure_exists(&self, id: &str) -> RentalResult<()> {
        match self.store.get(R::DOC_TYPE, id).await? {
            Some(_) => Ok(()),
            None => Err(RentalError::not_found(R::KIND, id)),
        }
    }
}

fn decode<R: Record>(doc: Value) -> RentalResult<R> {
    serde_json::from_value(doc).map_err(|e| {
        RentalError::Serialization(format!("malformed {} document: {}", R::DOC_TYPE, e))
    })
}

fn into_set<P: Serialize>(changes: &P) -> RentalResult<Map<String, Value>> {
    match serde_json::to_value(changes)? {
        Value::Object(map) => Ok(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        _ => Err(RentalError::InvalidRequest(
            "patch must be a JSON object".to_string(),
        )),
    }
}
