//! In-memory storage implementation for document stores.
//!
//! Documents are kept per database and collection in insertion order, so result
//! sequences come back in the order documents were written, as they do from a
//! freshly populated MongoDB collection without an explicit sort.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Bson, Document, RawDocumentBuf, oid::ObjectId};

use docaccess_core::{
    backend::{Namespace, StoreBackend, StoreBackendBuilder},
    cursor::{BoxDocumentCursor, VecCursor},
    document::{ID_FIELD, to_raw},
    error::{DocumentStoreError, DocumentStoreResult},
    options::{FindOneOptions, UpdateOutcome},
};

use crate::evaluator::{FilterEvaluator, compare_documents, lookup, same_value};

/// State of one collection: its documents in insertion order and its unique indexes.
#[derive(Debug, Default)]
struct CollectionState {
    documents: Vec<Document>,
    /// Indexed fields, in creation order, with their uniqueness flag.
    indexes: Vec<(String, bool)>,
}

type DatabaseMap = HashMap<String, CollectionState>;
type StoreMap = HashMap<String, DatabaseMap>;


/// Thread-safe in-memory document storage backend.
///
/// This struct implements the [`StoreBackend`] trait entirely in memory using an
/// async-aware read-write lock. It honours the same contract as a real store: `_id`
/// assignment and uniqueness, unique secondary indexes, merge-only updates and ordered
/// result cursors.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Performance
///
/// Every query scans the whole collection. It is meant for development and testing.
///
/// # Example
///
/// ```ignore
/// use docaccess_memory::InMemoryStore;
/// use docaccess::backend::{Namespace, StoreBackend};
/// use bson::doc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///     let users = Namespace::new("app", "users");
///
///     store.insert_one(&users, doc! { "name": "Alice", "age": 30 }).await?;
///     assert_eq!(store.count_documents(&users, doc! {}).await?, 1);
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// database name -> (collection name -> collection state)
    store: Arc<RwLock<StoreMap>>,
    /// When set, every cursor fails after yielding this many documents.
    interrupt_cursors_after: Option<usize>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
            interrupt_cursors_after: None,
        }
    }

    /// Creates a builder for constructing an `InMemoryStore` with custom options.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

/// The `_id` field followed by every unique index field of the collection.
fn unique_fields(state: &CollectionState) -> impl Iterator<Item = &str> {
    std::iter::once(ID_FIELD).chain(
        state
            .indexes
            .iter()
            .filter(|(_, unique)| *unique)
            .map(|(field, _)| field.as_str()),
    )
}

/// Rejects `candidate` if it collides with any document other than the one at `skip`.
fn check_unique(
    state: &CollectionState,
    namespace: &Namespace,
    candidate: &Document,
    skip: Option<usize>,
) -> DocumentStoreResult<()> {
    for field in unique_fields(state) {
        let key = lookup(candidate, field);

        let collides = state
            .documents
            .iter()
            .enumerate()
            .filter(|(position, _)| Some(*position) != skip)
            .any(|(_, existing)| same_value(lookup(existing, field), key));

        if collides {
            return Err(DocumentStoreError::Operation(format!(
                "E11000 duplicate key error collection: {namespace} index: {field}_1 dup key: {{ {field}: {} }}",
                key.unwrap_or(&Bson::Null),
            )));
        }
    }

    Ok(())
}

/// Inserts one document, assigning an `_id` if absent, and returns that `_id`.
fn insert_into(
    state: &mut CollectionState,
    namespace: &Namespace,
    mut document: Document,
) -> DocumentStoreResult<Bson> {
    let id = match document.get(ID_FIELD).cloned() {
        Some(id) => id,
        None => {
            let id = Bson::ObjectId(ObjectId::new());
            let mut with_id = Document::new();
            with_id.insert(ID_FIELD, id.clone());
            for (key, value) in document {
                with_id.insert(key, value);
            }
            document = with_id;
            id
        },
    };

    check_unique(state, namespace, &document, None)?;
    state.documents.push(document);

    Ok(id)
}

/// Sets `value` at a possibly dotted path, creating missing intermediate documents.
///
/// An intermediate field that exists but holds a non-document value is an error and
/// leaves it in place.
fn set_path(document: &mut Document, path: &str, value: Bson) -> DocumentStoreResult<()> {
    let Some((head, rest)) = path.split_once('.') else {
        document.insert(path, value);
        return Ok(());
    };

    match document.get_mut(head) {
        Some(Bson::Document(inner)) => set_path(inner, rest, value),
        Some(existing) => Err(DocumentStoreError::Operation(format!(
            "Cannot create field '{}' in element {{{head}: {existing}}}",
            rest.split('.').next().unwrap_or(rest),
        ))),
        None => {
            let mut inner = Document::new();
            set_path(&mut inner, rest, value)?;
            document.insert(head, inner);
            Ok(())
        },
    }
}

/// Merges `changes` into the documents at `positions`, the way `$set` does.
///
/// Each document is merged into a copy first, so a rejected change leaves it as stored.
fn merge_into(
    state: &mut CollectionState,
    namespace: &Namespace,
    positions: Vec<usize>,
    changes: &Document,
) -> DocumentStoreResult<UpdateOutcome> {
    let mut outcome = UpdateOutcome::default();

    for position in positions {
        outcome.matched += 1;

        let original = &state.documents[position];
        let mut merged = original.clone();
        for (path, value) in changes {
            set_path(&mut merged, path, value.clone())?;
        }

        if merged == *original {
            continue;
        }
        if !same_value(merged.get(ID_FIELD), original.get(ID_FIELD)) {
            return Err(DocumentStoreError::Operation(format!(
                "Performing an update on the path '{ID_FIELD}' would modify the immutable field '{ID_FIELD}'"
            )));
        }

        check_unique(state, namespace, &merged, Some(position))?;
        state.documents[position] = merged;
        outcome.modified += 1;
    }

    Ok(outcome)
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn ping(&self) -> DocumentStoreResult<()> {
        Ok(())
    }

    async fn count_documents(&self, namespace: &Namespace, filter: Document) -> DocumentStoreResult<u64> {
        let store = self.store.read().await;
        let state = match store
            .get(&namespace.database)
            .and_then(|database| database.get(&namespace.collection))
        {
            Some(state) => state,
            None => return Ok(0),
        };

        Ok(FilterEvaluator::new(&filter)
            .positions(&state.documents)?
            .len() as u64)
    }

    async fn insert_one(&self, namespace: &Namespace, document: Document) -> DocumentStoreResult<Bson> {
        let mut store = self.store.write().await;
        let state = store
            .entry(namespace.database.clone())
            .or_default()
            .entry(namespace.collection.clone())
            .or_default();

        insert_into(state, namespace, document)
    }

    async fn insert_many(&self, namespace: &Namespace, documents: Vec<Document>) -> DocumentStoreResult<Vec<Bson>> {
        let mut store = self.store.write().await;
        let state = store
            .entry(namespace.database.clone())
            .or_default()
            .entry(namespace.collection.clone())
            .or_default();

        // Ordered insert: stop at the first failure, keeping what was written before it.
        documents
            .into_iter()
            .map(|document| insert_into(state, namespace, document))
            .collect()
    }

    async fn delete_one(&self, namespace: &Namespace, filter: Document) -> DocumentStoreResult<u64> {
        let mut store = self.store.write().await;
        let state = match store
            .get_mut(&namespace.database)
            .and_then(|database| database.get_mut(&namespace.collection))
        {
            Some(state) => state,
            None => return Ok(0),
        };

        let evaluator = FilterEvaluator::new(&filter);
        for position in 0..state.documents.len() {
            if evaluator.matches(&state.documents[position])? {
                state.documents.remove(position);
                return Ok(1);
            }
        }

        Ok(0)
    }

    async fn delete_many(&self, namespace: &Namespace, filter: Document) -> DocumentStoreResult<u64> {
        let mut store = self.store.write().await;
        let state = match store
            .get_mut(&namespace.database)
            .and_then(|database| database.get_mut(&namespace.collection))
        {
            Some(state) => state,
            None => return Ok(0),
        };

        let positions = FilterEvaluator::new(&filter).positions(&state.documents)?;
        for position in positions.iter().rev() {
            state.documents.remove(*position);
        }

        Ok(positions.len() as u64)
    }

    async fn update_one(&self, namespace: &Namespace, filter: Document, changes: Document) -> DocumentStoreResult<UpdateOutcome> {
        let mut store = self.store.write().await;
        let state = match store
            .get_mut(&namespace.database)
            .and_then(|database| database.get_mut(&namespace.collection))
        {
            Some(state) => state,
            None => return Ok(UpdateOutcome::default()),
        };

        let positions = FilterEvaluator::new(&filter)
            .positions(&state.documents)?
            .into_iter()
            .take(1)
            .collect();

        merge_into(state, namespace, positions, &changes)
    }

    async fn update_many(&self, namespace: &Namespace, filter: Document, changes: Document) -> DocumentStoreResult<UpdateOutcome> {
        let mut store = self.store.write().await;
        let state = match store
            .get_mut(&namespace.database)
            .and_then(|database| database.get_mut(&namespace.collection))
        {
            Some(state) => state,
            None => return Ok(UpdateOutcome::default()),
        };

        let positions = FilterEvaluator::new(&filter).positions(&state.documents)?;

        merge_into(state, namespace, positions, &changes)
    }

    async fn find_one(&self, namespace: &Namespace, filter: Document, options: FindOneOptions) -> DocumentStoreResult<Option<RawDocumentBuf>> {
        let store = self.store.read().await;
        let state = match store
            .get(&namespace.database)
            .and_then(|database| database.get(&namespace.collection))
        {
            Some(state) => state,
            None => return Ok(None),
        };

        let mut matches = FilterEvaluator::new(&filter)
            .positions(&state.documents)?
            .into_iter()
            .map(|position| &state.documents[position])
            .collect::<Vec<_>>();

        // Stable sort keeps insertion order among equal keys
        if let Some(sort) = &options.sort {
            matches.sort_by(|a, b| compare_documents(a, b, sort));
        }

        matches
            .into_iter()
            .nth(options.skip.unwrap_or(0) as usize)
            .map(to_raw)
            .transpose()
    }

    async fn find(&self, namespace: &Namespace, filter: Document) -> DocumentStoreResult<BoxDocumentCursor> {
        let store = self.store.read().await;
        let documents = match store
            .get(&namespace.database)
            .and_then(|database| database.get(&namespace.collection))
        {
            Some(state) => {
                let evaluator = FilterEvaluator::new(&filter);
                let mut documents = Vec::new();

                for document in &state.documents {
                    if evaluator.matches(document)? {
                        documents.push(to_raw(document)?);
                    }
                }

                documents
            },
            None => Vec::new(),
        };

        let cursor = VecCursor::new(documents);

        Ok(match self.interrupt_cursors_after {
            Some(count) => Box::new(cursor.interrupt_after(count, "cursor interrupted")),
            None => Box::new(cursor),
        })
    }

    async fn create_index(&self, namespace: &Namespace, field: &str, unique: bool) -> DocumentStoreResult<String> {
        let mut store = self.store.write().await;
        let state = store
            .entry(namespace.database.clone())
            .or_default()
            .entry(namespace.collection.clone())
            .or_default();
        let name = format!("{field}_1");

        if let Some((_, existing)) = state.indexes.iter().find(|(indexed, _)| indexed == field) {
            if *existing != unique {
                return Err(DocumentStoreError::Operation(format!(
                    "An existing index has the same name as the requested index: {name}"
                )));
            }
            return Ok(name);
        }

        if unique {
            for (position, document) in state.documents.iter().enumerate() {
                let key = lookup(document, field);
                let duplicated = state.documents[position + 1..]
                    .iter()
                    .any(|other| same_value(lookup(other, field), key));

                if duplicated {
                    return Err(DocumentStoreError::Operation(format!(
                        "E11000 duplicate key error collection: {namespace} index: {name}"
                    )));
                }
            }
        }

        state.indexes.push((field.to_string(), unique));
        tracing::debug!(%namespace, index = %name, unique, "index created");

        Ok(name)
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docaccess_memory::InMemoryStore;
/// use docaccess::backend::StoreBackendBuilder;
///
/// #[tokio::main]
/// async fn main() {
///     let store = InMemoryStore::builder().build().await.unwrap();
/// }
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder {
    interrupt_cursors_after: Option<usize>,
}

impl InMemoryStoreBuilder {
    /// Makes every cursor opened by the store fail with a sequence error after yielding
    /// `count` documents. Intended for exercising mid-stream failure handling.
    pub fn interrupt_cursors_after(mut self, count: usize) -> Self {
        self.interrupt_cursors_after = Some(count);
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new, empty [`InMemoryStore`].
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore {
            interrupt_cursors_after: self.interrupt_cursors_after,
            ..InMemoryStore::new()
        })
    }
}
