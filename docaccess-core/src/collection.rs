//! Collection handles for CRUD operations.
//!
//! A [`Collection`] pairs a [`Namespace`] with a borrowed backend. It accepts any
//! `Serialize` value for writes and produces any `DeserializeOwned` value for reads,
//! so the access layer stays independent of the record shapes it moves.
//!
//! # Example
//!
//! ```ignore
//! use serde::{Serialize, Deserialize};
//! use bson::doc;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! pub struct User {
//!     pub name: String,
//!     pub age: i32,
//! }
//!
//! # async fn example(store: &docaccess::store::DocumentStore<impl docaccess::backend::StoreBackend>) -> docaccess::error::DocumentStoreResult<()> {
//! let users = store.collection("app", "users");
//! let id = users.insert_one(&User { name: "Alice".into(), age: 30 }).await?;
//!
//! users.update_by_id(id.clone(), &doc! { "age": 31 }).await?;
//!
//! let mut everyone: Vec<User> = Vec::new();
//! users.find_all(&mut everyone, doc! {}).await?;
//! # Ok(()) }
//! ```

use bson::{Bson, Document, RawDocument};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    backend::{Namespace, StoreBackend},
    document::{decode, encode, id_filter},
    error::{DocumentStoreError, DocumentStoreResult},
    materialize::{Destination, materialize, materialize_with},
    options::{FindOneOptions, UpdateOutcome},
};

/// A collection within a database, with a reference to a storage backend.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend reference
/// * `B` - The storage backend type
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    namespace: Namespace,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    /// Creates a new collection reference (internal use).
    pub(crate) fn new(namespace: Namespace, backend: &'a B) -> Self {
        Self { namespace, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.namespace.collection
    }

    /// Returns the name of the database this collection lives in.
    pub fn database(&self) -> &str {
        &self.namespace.database
    }

    /// Returns the fully qualified namespace this collection targets.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Counts the documents matching `filter`. An empty filter counts the whole collection.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Operation`] if the store rejects the count.
    pub async fn count(&self, filter: Document) -> DocumentStoreResult<u64> {
        self.backend
            .count_documents(&self.namespace, filter)
            .await
    }

    /// Inserts a document and returns its `_id`, generated by the store if absent.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Serialization`] or
    /// [`DocumentStoreError::InvalidDocument`] if `document` cannot be encoded, and
    /// [`DocumentStoreError::Operation`] if the store rejects it (a unique index
    /// conflict, for instance).
    pub async fn insert_one<T>(&self, document: &T) -> DocumentStoreResult<Bson>
    where
        T: Serialize + ?Sized,
    {
        self.backend
            .insert_one(&self.namespace, encode(document)?)
            .await
    }

    /// Inserts several documents and returns their `_id`s in input order.
    ///
    /// Nothing is sent if any document fails to encode.
    pub async fn insert_many<T>(&self, documents: &[T]) -> DocumentStoreResult<Vec<Bson>>
    where
        T: Serialize,
    {
        self.backend
            .insert_many(
                &self.namespace,
                documents
                    .iter()
                    .map(encode)
                    .collect::<DocumentStoreResult<Vec<Document>>>()?,
            )
            .await
    }

    /// Deletes the first document matching `filter` and returns the number deleted.
    pub async fn delete_one(&self, filter: Document) -> DocumentStoreResult<u64> {
        self.backend
            .delete_one(&self.namespace, filter)
            .await
    }

    /// Deletes the document whose `_id` is `id`.
    pub async fn delete_by_id(&self, id: impl Into<Bson>) -> DocumentStoreResult<u64> {
        self.delete_one(id_filter(id)).await
    }

    /// Deletes every document matching `filter` and returns the number deleted.
    pub async fn delete_many(&self, filter: Document) -> DocumentStoreResult<u64> {
        self.backend
            .delete_many(&self.namespace, filter)
            .await
    }

    /// Merges the fields of `partial` into the first document matching `filter`.
    ///
    /// Fields not present in `partial` keep their stored values.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidDocument`] if `partial` does not encode to a
    /// document, and [`DocumentStoreError::Operation`] if the store rejects the update.
    pub async fn update_one<T>(&self, filter: Document, partial: &T) -> DocumentStoreResult<UpdateOutcome>
    where
        T: Serialize + ?Sized,
    {
        self.backend
            .update_one(&self.namespace, filter, encode(partial)?)
            .await
    }

    /// Merges the fields of `partial` into the document whose `_id` is `id`.
    pub async fn update_by_id<T>(&self, id: impl Into<Bson>, partial: &T) -> DocumentStoreResult<UpdateOutcome>
    where
        T: Serialize + ?Sized,
    {
        self.update_one(id_filter(id), partial).await
    }

    /// Merges the fields of `partial` into every document matching `filter`.
    pub async fn update_many<T>(&self, filter: Document, partial: &T) -> DocumentStoreResult<UpdateOutcome>
    where
        T: Serialize + ?Sized,
    {
        self.backend
            .update_many(&self.namespace, filter, encode(partial)?)
            .await
    }

    /// Returns the first document matching `filter`, decoded as `T`.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::NotFound`] if nothing matches
    /// - [`DocumentStoreError::Decode`] if the match does not fit `T`
    /// - [`DocumentStoreError::Operation`] if the query fails
    pub async fn find_one<T>(&self, filter: Document, options: FindOneOptions) -> DocumentStoreResult<T>
    where
        T: DeserializeOwned,
    {
        match self
            .backend
            .find_one(&self.namespace, filter.clone(), options)
            .await?
        {
            Some(raw) => decode(&raw, 0),
            None => Err(DocumentStoreError::NotFound(
                self.namespace.to_string(),
                filter.to_string(),
            )),
        }
    }

    /// Replaces the contents of `destination` with every document matching `filter`,
    /// in result order. Returns the number of documents materialized.
    ///
    /// This is all-or-nothing: on any error `destination` is left untouched.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::Decode`] if a document does not fit `D::Item`
    /// - [`DocumentStoreError::Sequence`] if the result stream fails mid-way
    /// - [`DocumentStoreError::Operation`] if the query cannot be opened
    pub async fn find_all<D>(&self, destination: &mut D, filter: Document) -> DocumentStoreResult<usize>
    where
        D: Destination + ?Sized,
        D::Item: DeserializeOwned,
    {
        let mut cursor = self
            .backend
            .find(&self.namespace, filter)
            .await?;

        materialize(&mut cursor, destination).await
    }

    /// Like [`find_all`](Self::find_all), decoding each raw document with `decode`.
    pub async fn find_all_with<D, F>(
        &self,
        destination: &mut D,
        filter: Document,
        decode: F,
    ) -> DocumentStoreResult<usize>
    where
        D: Destination + ?Sized,
        F: FnMut(&RawDocument, usize) -> DocumentStoreResult<D::Item>,
    {
        let mut cursor = self
            .backend
            .find(&self.namespace, filter)
            .await?;

        materialize_with(&mut cursor, destination, decode).await
    }

    /// Creates an ascending index on `field`, optionally enforcing uniqueness.
    /// Returns the index name.
    pub async fn create_index(&self, field: &str, unique: bool) -> DocumentStoreResult<String> {
        self.backend
            .create_index(&self.namespace, field, unique)
            .await
    }
}
