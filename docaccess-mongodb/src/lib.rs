//! MongoDB backend implementation for docaccess.
//!
//! This crate provides the client configuration for MongoDB deployments and a
//! MongoDB-based implementation of the `StoreBackend` trait.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docaccess = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection modes
//!
//! - **Plain** - `mongodb://host:port`, no authentication
//! - **Credentialed** - authenticates against an explicit authentication database
//! - **Hosted** - `mongodb+srv://` addressing for hosted clusters
//!
//! All modes share fixed connect, idle and server-selection timeouts. Connection
//! failures are returned as errors and never abort the process.
//!
//! # Command observation
//!
//! With [`ClientConfigBuilder::observe_commands`] enabled, every command sent to the
//! server except `endSessions` is reported as a `tracing` debug event on the
//! `docaccess::command` target, or handed to a custom listener.
//!
//! # Example
//!
//! ```ignore
//! use docaccess::{prelude::*, mongodb::{ClientConfig, connect}};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder("localhost:27017", "my-service")
//!         .credentials("admin", "svc", "s3cret")
//!         .build()?;
//!     let store = DocumentStore::new(connect(&config).await?);
//!
//!     let total = store.collection("app", "users").count(doc! {}).await?;
//!
//!     store.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod store;

pub use config::{
    ClientConfig, ClientConfigBuilder, CommandListener, ConnectionMode, Credentials,
    CONNECT_TIMEOUT, MAX_CONN_IDLE_TIME, SERVER_SELECTION_TIMEOUT, should_report_command,
};
pub use store::{MongoDbStore, MongoDbStoreBuilder, connect};
