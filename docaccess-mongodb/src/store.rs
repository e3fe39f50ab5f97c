use std::time::Duration;

use async_trait::async_trait;
use bson::{Bson, Document, RawDocument, RawDocumentBuf, doc};
use mongodb::{
    Client, Collection as MongoCollection, Cursor, IndexModel,
    options::{FindOneOptions as MongoFindOneOptions, IndexOptions},
};
use docaccess_core::{
    backend::{Namespace, StoreBackend, StoreBackendBuilder},
    cursor::{BoxDocumentCursor, DocumentCursor},
    error::{DocumentStoreError, DocumentStoreResult},
    options::{FindOneOptions, Sort, UpdateOutcome},
};

use crate::config::{ClientConfig, SERVER_SELECTION_TIMEOUT};


/// A [`StoreBackend`] backed by a MongoDB deployment.
///
/// The wrapped [`Client`] owns the connection pool and is safe to share between
/// concurrent callers. Use [`connect`] (or [`MongoDbStoreBuilder`]) to obtain one with
/// a verified handshake.
#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    server_selection_timeout: Duration,
}

impl MongoDbStore {
    /// Wraps an existing client without contacting the server.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            server_selection_timeout: SERVER_SELECTION_TIMEOUT,
        }
    }

    pub fn builder(config: ClientConfig) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(config)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn get_collection(&self, namespace: &Namespace) -> MongoCollection<Document> {
        self.client
            .database(&namespace.database)
            .collection(&namespace.collection)
    }
}

/// Builds a client from `config` and verifies the handshake with a `ping`.
///
/// # Errors
///
/// - [`DocumentStoreError::Configuration`] if the driver rejects the configuration
/// - [`DocumentStoreError::Connection`] if the deployment cannot be reached within the
///   server-selection timeout
pub async fn connect(config: &ClientConfig) -> DocumentStoreResult<MongoDbStore> {
    let options = config.to_client_options().await?;

    let client = Client::with_options(options)
        .map_err(|e| DocumentStoreError::Connection(format!("failed to create client: {e}")))?;

    let store = MongoDbStore {
        client,
        server_selection_timeout: config.server_selection_timeout(),
    };
    store.ping().await?;

    tracing::info!(
        address = %config.address(),
        app_name = %config.app_name(),
        mode = config.mode().name(),
        "MongoDB client connected"
    );

    Ok(store)
}

/// Adapts a driver cursor to [`DocumentCursor`].
///
/// Driver errors while fetching further batches end the sequence and surface as
/// [`DocumentStoreError::Sequence`].
struct MongoCursor {
    inner: Cursor<RawDocumentBuf>,
    positioned: bool,
    finished: bool,
    error: Option<DocumentStoreError>,
}

impl MongoCursor {
    fn new(inner: Cursor<RawDocumentBuf>) -> Self {
        Self {
            inner,
            positioned: false,
            finished: false,
            error: None,
        }
    }
}

#[async_trait]
impl DocumentCursor for MongoCursor {
    async fn advance(&mut self) -> bool {
        if self.finished {
            return false;
        }

        match self.inner.advance().await {
            Ok(true) => {
                self.positioned = true;
            },
            Ok(false) => {
                self.positioned = false;
                self.finished = true;
            },
            Err(e) => {
                self.positioned = false;
                self.finished = true;
                self.error = Some(DocumentStoreError::Sequence(e.to_string()));
            },
        }

        self.positioned
    }

    fn current(&self) -> Option<&RawDocument> {
        self.positioned.then(|| self.inner.current())
    }

    fn take_error(&mut self) -> Option<DocumentStoreError> {
        self.error.take()
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn ping(&self) -> DocumentStoreResult<()> {
        tokio::time::timeout(
            self.server_selection_timeout,
            self.client
                .database("admin")
                .run_command(doc! { "ping": 1 }),
        )
        .await
        .map_err(|_| DocumentStoreError::Connection(format!(
            "no response to ping within {:?}",
            self.server_selection_timeout
        )))?
        .map_err(|e| DocumentStoreError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn count_documents(&self, namespace: &Namespace, filter: Document) -> DocumentStoreResult<u64> {
        self.get_collection(namespace)
            .count_documents(filter)
            .await
            .map_err(|e| DocumentStoreError::Operation(e.to_string()))
    }

    async fn insert_one(&self, namespace: &Namespace, document: Document) -> DocumentStoreResult<Bson> {
        Ok(
            self.get_collection(namespace)
                .insert_one(document)
                .await
                .map_err(|e| DocumentStoreError::Operation(e.to_string()))?
                .inserted_id
        )
    }

    async fn insert_many(&self, namespace: &Namespace, documents: Vec<Document>) -> DocumentStoreResult<Vec<Bson>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let mut inserted = self.get_collection(namespace)
            .insert_many(documents)
            .await
            .map_err(|e| DocumentStoreError::Operation(e.to_string()))?
            .inserted_ids
            .into_iter()
            .collect::<Vec<(usize, Bson)>>();

        inserted.sort_by_key(|(index, _)| *index);

        Ok(inserted.into_iter().map(|(_, id)| id).collect())
    }

    async fn delete_one(&self, namespace: &Namespace, filter: Document) -> DocumentStoreResult<u64> {
        Ok(
            self.get_collection(namespace)
                .delete_one(filter)
                .await
                .map_err(|e| DocumentStoreError::Operation(e.to_string()))?
                .deleted_count
        )
    }

    async fn delete_many(&self, namespace: &Namespace, filter: Document) -> DocumentStoreResult<u64> {
        Ok(
            self.get_collection(namespace)
                .delete_many(filter)
                .await
                .map_err(|e| DocumentStoreError::Operation(e.to_string()))?
                .deleted_count
        )
    }

    async fn update_one(&self, namespace: &Namespace, filter: Document, changes: Document) -> DocumentStoreResult<UpdateOutcome> {
        let result = self.get_collection(namespace)
            .update_one(filter, doc! { "$set": changes })
            .await
            .map_err(|e| DocumentStoreError::Operation(e.to_string()))?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn update_many(&self, namespace: &Namespace, filter: Document, changes: Document) -> DocumentStoreResult<UpdateOutcome> {
        let result = self.get_collection(namespace)
            .update_many(filter, doc! { "$set": changes })
            .await
            .map_err(|e| DocumentStoreError::Operation(e.to_string()))?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn find_one(&self, namespace: &Namespace, filter: Document, options: FindOneOptions) -> DocumentStoreResult<Option<RawDocumentBuf>> {
        self.get_collection(namespace)
            .clone_with_type::<RawDocumentBuf>()
            .find_one(filter)
            .with_options(
                MongoFindOneOptions::builder()
                    .sort(options.sort.as_ref().map(Sort::to_document))
                    .skip(options.skip)
                    .build()
            )
            .await
            .map_err(|e| DocumentStoreError::Operation(e.to_string()))
    }

    async fn find(&self, namespace: &Namespace, filter: Document) -> DocumentStoreResult<BoxDocumentCursor> {
        let cursor = self.get_collection(namespace)
            .clone_with_type::<RawDocumentBuf>()
            .find(filter)
            .await
            .map_err(|e| DocumentStoreError::Operation(e.to_string()))?;

        Ok(Box::new(MongoCursor::new(cursor)))
    }

    async fn create_index(&self, namespace: &Namespace, field: &str, unique: bool) -> DocumentStoreResult<String> {
        Ok(
            self.get_collection(namespace)
                .create_index(
                    IndexModel::builder()
                    .keys(doc! { field: 1 })
                    .options(
                        IndexOptions::builder()
                        .unique(unique)
                        .build()
                    )
                    .build()
                )
                .await
                .map_err(|e| DocumentStoreError::Operation(e.to_string()))?
                .index_name
        )
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;
        tracing::info!("MongoDB client shut down");

        Ok(())
    }
}

/// Builder that connects a [`MongoDbStore`] from a [`ClientConfig`].
///
/// # Example
///
/// ```ignore
/// use docaccess::{backend::StoreBackendBuilder, mongodb::{ClientConfig, MongoDbStore}};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ClientConfig::builder("localhost:27017", "my-service").build()?;
///     let store = MongoDbStore::builder(config).build().await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MongoDbStoreBuilder {
    config: ClientConfig,
}

impl MongoDbStoreBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        connect(&self.config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_reports_unreachable_server() {
        // Nothing listens on port 1; the ping fails within the selection timeout.
        let config = ClientConfig::builder("127.0.0.1:1", "tests").build().unwrap();

        let err = connect(&config).await.unwrap_err();

        assert!(matches!(err, DocumentStoreError::Connection(_)));
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_address() {
        let config = ClientConfig::builder("localhost:notaport", "tests").build().unwrap();

        let err = connect(&config).await.unwrap_err();

        assert!(matches!(err, DocumentStoreError::Configuration(_)));
    }
}
