//! A generic access layer over document stores.
//!
//! This crate is the core of the docaccess project and provides:
//!
//! - **Store backend abstraction** ([`backend`]) - The operations every store collaborator provides
//! - **Result cursors** ([`cursor`]) - Forward-only sequences of encoded documents
//! - **Materializer** ([`materialize`]) - All-or-nothing decoding of a cursor into a caller container
//! - **Collections interface** ([`collection`]) - Typed CRUD over a (database, collection) pair
//! - **Document store** ([`store`]) - Owner of the shared client handle
//! - **Document conversion** ([`document`]) - Encoding caller values to BSON and back
//! - **Options** ([`options`]) - Per-call options and operation outcomes
//! - **Error handling** ([`error`]) - Error taxonomy and result types
//!
//! # Example
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
//! let store = DocumentStore::new(InMemoryStore::new());
//! let users = store.collection("app", "users");
//!
//! users.insert_one(&User { name: "Alice".into() }).await?;
//!
//! let mut all: Vec<User> = Vec::new();
//! users.find_all(&mut all, doc! {}).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docaccess_core;

pub mod backend;
pub mod collection;
pub mod cursor;
pub mod document;
pub mod error;
pub mod materialize;
pub mod options;
pub mod store;
