//! Main document store interface.
//!
//! A [`DocumentStore`] owns the connected backend (the shared client handle). It is
//! created once at process start, handed by reference to every caller, and released
//! explicitly with [`DocumentStore::shutdown`]. Per-collection work goes through
//! [`Collection`] handles borrowed from it.
//!
//! # Example
//!
//! ```ignore
//! use docaccess::store::DocumentStore;
//!
//! let store = DocumentStore::new(backend);
//! let users = store.collection("app", "users");
//! let total = users.count(doc! {}).await?;
//!
//! store.shutdown().await?;
//! ```

use crate::{
    backend::{Namespace, StoreBackend},
    collection::Collection,
    error::DocumentStoreResult,
};

/// A document store bound to a specific backend implementation.
///
/// The store itself is stateless beyond the backend; every operation is scoped by the
/// (database, collection) pair of the [`Collection`] it is issued through. It can be
/// shared freely across tasks (`&DocumentStore<B>` is `Send + Sync`).
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns a reference to the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Gets a handle on `collection` within `database`.
    ///
    /// Neither the database nor the collection needs to exist yet; stores create them
    /// on first write.
    pub fn collection<'a>(&'a self, database: &str, collection: &str) -> Collection<'a, B> {
        Collection::new(Namespace::new(database, collection), &self.backend)
    }

    /// Verifies that the store is reachable.
    pub async fn ping(&self) -> DocumentStoreResult<()> {
        self.backend.ping().await
    }

    /// Shuts down the store, releasing the backend's connections.
    ///
    /// Consumes the store, so no handle can outlive the release.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        tracing::debug!("shutting down document store");
        self.backend.shutdown().await
    }
}
