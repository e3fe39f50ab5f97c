//! Storage backend abstraction for the document store.
//!
//! This module defines the contract every store collaborator fulfils. The access layer
//! itself is a thin facade over these operations: it encodes caller values, forwards
//! them, and decodes results, without ever knowing the record shapes involved.
//!
//! # Overview
//!
//! The [`StoreBackend`] trait exposes the store's native operations scoped to a
//! [`Namespace`] (database plus collection). Implementations are required to be
//! thread-safe (`Send + Sync`): a single backend value is the shared client handle used
//! by every concurrent caller, and the access layer adds no locking of its own.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use docaccess::backend::{Namespace, StoreBackend};
//! use bson::doc;
//!
//! let backend = MyBackendImpl::new();
//! let users = Namespace::new("app", "users");
//!
//! let id = backend.insert_one(&users, doc! { "name": "Alice", "age": 30 }).await?;
//! let total = backend.count_documents(&users, doc! {}).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::{Bson, Document, RawDocumentBuf};
use std::fmt::{self, Debug, Display};

use crate::{
    cursor::BoxDocumentCursor,
    error::DocumentStoreResult,
    options::{FindOneOptions, UpdateOutcome},
};

/// A fully qualified collection: the database it lives in and its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Abstract interface for document storage backends.
///
/// Every operation takes its target [`Namespace`] explicitly; backends hold no
/// per-collection state on behalf of callers.
///
/// # Filters
///
/// Filters are BSON documents mapping field names to predicate values. The empty
/// document matches every document in the collection.
///
/// # Error Handling
///
/// Store-reported failures (duplicate keys, network errors during a write, rejected
/// index specifications) are returned as
/// [`DocumentStoreError::Operation`](crate::error::DocumentStoreError::Operation).
/// Backends never retry.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Verifies that the store is reachable.
    async fn ping(&self) -> DocumentStoreResult<()>;

    /// Counts the documents matching `filter`.
    async fn count_documents(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> DocumentStoreResult<u64>;

    /// Inserts one document and returns its `_id`.
    ///
    /// If the document carries no `_id`, the backend assigns a fresh `ObjectId`.
    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> DocumentStoreResult<Bson>;

    /// Inserts several documents and returns their `_id`s in input order.
    ///
    /// Partial failure is reported exactly as the store reports it; documents written
    /// before the failure are not rolled back.
    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Deletes the first document matching `filter`. Returns the number deleted (0 or 1).
    async fn delete_one(&self, namespace: &Namespace, filter: Document) -> DocumentStoreResult<u64>;

    /// Deletes every document matching `filter`. Returns the number deleted.
    async fn delete_many(&self, namespace: &Namespace, filter: Document) -> DocumentStoreResult<u64>;

    /// Merges `changes` into the first document matching `filter`.
    ///
    /// This is always a field-level merge: fields absent from `changes` are left
    /// untouched. It is never a full replacement.
    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        changes: Document,
    ) -> DocumentStoreResult<UpdateOutcome>;

    /// Merges `changes` into every document matching `filter`.
    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        changes: Document,
    ) -> DocumentStoreResult<UpdateOutcome>;

    /// Returns the first document matching `filter`, if any, still encoded.
    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOneOptions,
    ) -> DocumentStoreResult<Option<RawDocumentBuf>>;

    /// Opens a forward-only cursor over every document matching `filter`.
    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> DocumentStoreResult<BoxDocumentCursor>;

    /// Creates an ascending index on `field` and returns its name.
    ///
    /// If `unique` is true and existing documents violate the constraint, the store
    /// rejects the index.
    async fn create_index(
        &self,
        namespace: &Namespace,
        field: &str,
        unique: bool,
    ) -> DocumentStoreResult<String>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op; backends holding connections override it.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn ping(&self) -> DocumentStoreResult<()> {
        (*self).ping().await
    }

    async fn count_documents(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> DocumentStoreResult<u64> {
        (*self).count_documents(namespace, filter).await
    }

    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> DocumentStoreResult<Bson> {
        (*self).insert_one(namespace, document).await
    }

    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> DocumentStoreResult<Vec<Bson>> {
        (*self).insert_many(namespace, documents).await
    }

    async fn delete_one(&self, namespace: &Namespace, filter: Document) -> DocumentStoreResult<u64> {
        (*self).delete_one(namespace, filter).await
    }

    async fn delete_many(&self, namespace: &Namespace, filter: Document) -> DocumentStoreResult<u64> {
        (*self).delete_many(namespace, filter).await
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        changes: Document,
    ) -> DocumentStoreResult<UpdateOutcome> {
        (*self)
            .update_one(namespace, filter, changes)
            .await
    }

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        changes: Document,
    ) -> DocumentStoreResult<UpdateOutcome> {
        (*self)
            .update_many(namespace, filter, changes)
            .await
    }

    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOneOptions,
    ) -> DocumentStoreResult<Option<RawDocumentBuf>> {
        (*self)
            .find_one(namespace, filter, options)
            .await
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> DocumentStoreResult<BoxDocumentCursor> {
        (*self).find(namespace, filter).await
    }

    async fn create_index(
        &self,
        namespace: &Namespace,
        field: &str,
        unique: bool,
    ) -> DocumentStoreResult<String> {
        (*self)
            .create_index(namespace, field, unique)
            .await
    }
}

/// Factory for backends whose construction involves I/O (resolving hosts, handshakes).
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
