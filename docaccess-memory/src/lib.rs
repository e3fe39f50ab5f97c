//! In-memory document storage backend for docaccess.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is ideal for development
//! and testing: it follows the same contract as the MongoDB backend for `_id` assignment,
//! unique indexes, merge updates and ordered cursors.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Server-style filters** - Equality, comparison, membership and logical operators
//! - **Unique indexes** - Duplicate keys are rejected like a real store would
//! - **Failure injection** - Cursors can be made to fail mid-stream
//!
//! # Quick Start
//!
//! ```ignore
//! use docaccess::{prelude::*, memory::InMemoryStore};
//! use serde::{Serialize, Deserialize};
//! use bson::doc;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!     let users = store.collection("app", "users");
//!
//!     users.insert_one(&User { name: "Alice".to_string() }).await?;
//!
//!     let mut everyone: Vec<User> = Vec::new();
//!     users.find_all(&mut everyone, doc! {}).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docaccess_memory;

pub mod store;
pub mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
