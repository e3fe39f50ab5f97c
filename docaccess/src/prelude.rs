//! Convenient re-exports of commonly used types from docaccess.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docaccess::prelude::*;
//! ```
//!
//! This provides access to:
//! - The document store and collection handles
//! - Store backends and builders
//! - Cursors and the materializer
//! - Per-call options and error types

pub use docaccess_core::{
    backend::{Namespace, StoreBackend, StoreBackendBuilder},
    collection::Collection,
    cursor::{BoxDocumentCursor, DocumentCursor},
    error::{DocumentStoreError, DocumentStoreResult},
    materialize::{Destination, materialize, materialize_with},
    options::{FindOneOptions, Sort, SortDirection, UpdateOutcome},
    store::DocumentStore,
};
