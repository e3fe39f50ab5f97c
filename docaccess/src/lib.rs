//! Main docaccess crate providing a unified interface over document stores.
//!
//! This crate is the primary entry point for users of docaccess. It re-exports the
//! core types from the sub-crates and provides access to the available storage
//! backends.
//!
//! # Features
//!
//! - **Shape-agnostic CRUD** - Write any `Serialize` value, read back any `DeserializeOwned` value
//! - **All-or-nothing materialization** - Decode a whole result sequence into a caller container or nothing at all
//! - **Multiple backends** - In-memory storage for tests, MongoDB for production
//! - **Connection modes** - Plain, credentialed and hosted (SRV) MongoDB configurations
//!
//! # Quick Start
//!
//! ```ignore
//! use docaccess::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub name: String,
//!     pub age: i32,
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // Create an in-memory store backend
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await.unwrap());
//!     let users = store.collection("app", "users");
//!
//!     let id = users
//!         .insert_one(&User { name: "Alice".to_string(), age: 30 })
//!         .await
//!         .unwrap();
//!
//!     // Updates merge fields; everything else is kept
//!     users.update_by_id(id, &doc! { "age": 31 }).await.unwrap();
//!
//!     // Replace the contents of `everyone` with every stored user
//!     let mut everyone: Vec<User> = Vec::new();
//!     users.find_all(&mut everyone, doc! {}).await.unwrap();
//!
//!     println!("Stored users: {:?}", everyone);
//!
//!     store.shutdown().await.unwrap();
//! }
//! ```
//!
//! # Custom decoding
//!
//! When the destination element is not a serde type, or only part of each document is
//! needed, [`find_all_with`](collection::Collection::find_all_with) takes the decode step
//! as a callback:
//!
//! ```ignore
//! let mut names: Vec<String> = Vec::new();
//!
//! users
//!     .find_all_with(&mut names, doc! {}, |raw, position| {
//!         raw.get_str("name")
//!             .map(str::to_owned)
//!             .map_err(|e| DocumentStoreError::Decode { position, message: e.to_string() })
//!     })
//!     .await?;
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use docaccess_core::{backend, collection, cursor, document, error, materialize, options, store};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docaccess_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docaccess_mongodb::{
        ClientConfig, ClientConfigBuilder, CommandListener, ConnectionMode, Credentials,
        MongoDbStore, MongoDbStoreBuilder, connect, should_report_command,
        CONNECT_TIMEOUT, MAX_CONN_IDLE_TIME, SERVER_SELECTION_TIMEOUT,
    };
}
