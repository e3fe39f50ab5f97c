use std::sync::Arc;

use bson::{Bson, Document, doc, oid::ObjectId};
use futures::future::join_all;
use rstest::rstest;
use serde::{Deserialize, Serialize};

use docaccess_core::{
    backend::StoreBackendBuilder,
    error::DocumentStoreError,
    options::{FindOneOptions, Sort, UpdateOutcome},
    store::DocumentStore,
};
use docaccess_memory::InMemoryStore;

const DB: &str = "inventory";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Item {
    sku: String,
    quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredItem {
    #[serde(rename = "_id")]
    id: ObjectId,
    sku: String,
    quantity: i32,
}

fn items(count: usize) -> Vec<Item> {
    (0..count)
        .map(|n| Item { sku: format!("sku-{n:04}"), quantity: n as i32 })
        .collect()
}

fn store() -> DocumentStore<InMemoryStore> {
    DocumentStore::new(InMemoryStore::new())
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(1000)]
#[tokio::test]
async fn find_all_returns_every_document_in_insertion_order(#[case] count: usize) {
    let store = store();
    let collection = store.collection(DB, "items");

    for item in items(count) {
        collection.insert_one(&item).await.unwrap();
    }

    let mut found: Vec<Item> = Vec::new();
    let materialized = collection.find_all(&mut found, doc! {}).await.unwrap();

    assert_eq!(materialized, count);
    assert_eq!(found, items(count));
}

#[tokio::test]
async fn find_all_applies_the_filter() {
    let store = store();
    let collection = store.collection(DB, "items");
    collection.insert_many(&items(10)).await.unwrap();

    let mut found: Vec<Item> = Vec::new();
    collection
        .find_all(&mut found, doc! { "quantity": { "$gte": 7 } })
        .await
        .unwrap();

    assert_eq!(found.iter().map(|i| i.quantity).collect::<Vec<_>>(), vec![7, 8, 9]);
}

#[tokio::test]
async fn find_all_aborts_on_an_incompatible_document() {
    let store = store();
    let collection = store.collection(DB, "items");

    collection.insert_many(&items(3)).await.unwrap();
    collection
        .insert_one(&doc! { "sku": "broken", "quantity": "many" })
        .await
        .unwrap();
    collection.insert_many(&items(3)).await.unwrap();

    let previous = vec![Item { sku: "previous".into(), quantity: 0 }];
    let mut found = previous.clone();
    let err = collection.find_all(&mut found, doc! {}).await.unwrap_err();

    match err {
        DocumentStoreError::Decode { position, .. } => assert_eq!(position, 3),
        other => panic!("expected a decode error, got {other:?}"),
    }
    assert_eq!(found, previous);
}

#[tokio::test]
async fn find_all_reports_a_failing_cursor() {
    let store = DocumentStore::new(
        InMemoryStore::builder()
            .interrupt_cursors_after(2)
            .build()
            .await
            .unwrap(),
    );
    let collection = store.collection(DB, "items");
    collection.insert_many(&items(2)).await.unwrap();

    let mut found: Vec<Item> = Vec::new();
    let err = collection.find_all(&mut found, doc! {}).await.unwrap_err();

    // Both documents decoded; the failure comes from the sequence itself.
    assert!(err.is_sequence());
    assert!(found.is_empty());
}

#[tokio::test]
async fn count_matches_filters() {
    let store = store();
    let collection = store.collection(DB, "items");
    collection
        .insert_many(&[
            Item { sku: "a".into(), quantity: 1 },
            Item { sku: "b".into(), quantity: 2 },
            Item { sku: "c".into(), quantity: 1 },
        ])
        .await
        .unwrap();

    assert_eq!(collection.count(doc! {}).await.unwrap(), 3);
    assert_eq!(collection.count(doc! { "quantity": 1 }).await.unwrap(), 2);
    assert_eq!(collection.count(doc! { "quantity": 5 }).await.unwrap(), 0);
}

#[tokio::test]
async fn insert_many_returns_ids_in_order() {
    let store = store();
    let collection = store.collection(DB, "items");

    let ids = collection.insert_many(&items(5)).await.unwrap();
    let mut stored: Vec<StoredItem> = Vec::new();
    collection.find_all(&mut stored, doc! {}).await.unwrap();

    assert_eq!(
        ids,
        stored.iter().map(|s| Bson::ObjectId(s.id)).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn caller_supplied_ids_are_kept() {
    let store = store();
    let collection = store.collection(DB, "items");

    let id = collection
        .insert_one(&doc! { "_id": "custom", "sku": "x", "quantity": 1 })
        .await
        .unwrap();

    assert_eq!(id, Bson::String("custom".into()));
    assert!(collection.insert_one(&doc! { "_id": "custom" }).await.is_err());
}

#[tokio::test]
async fn update_by_id_and_update_one_by_id_filter_agree() {
    let store = store();
    let left = store.collection(DB, "left");
    let right = store.collection(DB, "right");
    let original = doc! { "_id": 7, "sku": "bolt", "quantity": 10, "bin": "A3" };

    left.insert_one(&original).await.unwrap();
    right.insert_one(&original).await.unwrap();

    let partial = doc! { "quantity": 4, "reorder": true };
    let by_id = left.update_by_id(7, &partial).await.unwrap();
    let by_filter = right.update_one(doc! { "_id": 7 }, &partial).await.unwrap();

    let left_doc: Document = left.find_one(doc! { "_id": 7 }, FindOneOptions::default()).await.unwrap();
    let right_doc: Document = right.find_one(doc! { "_id": 7 }, FindOneOptions::default()).await.unwrap();

    assert_eq!(by_id, UpdateOutcome { matched: 1, modified: 1 });
    assert_eq!(by_id, by_filter);
    assert_eq!(left_doc, right_doc);
    assert_eq!(
        left_doc,
        doc! { "_id": 7, "sku": "bolt", "quantity": 4, "bin": "A3", "reorder": true }
    );
}

#[tokio::test]
async fn update_many_merges_into_every_match() {
    let store = store();
    let collection = store.collection(DB, "items");
    collection.insert_many(&items(4)).await.unwrap();

    let outcome = collection
        .update_many(doc! { "quantity": { "$lt": 2 } }, &doc! { "quantity": 100 })
        .await
        .unwrap();

    assert_eq!(outcome, UpdateOutcome { matched: 2, modified: 2 });
    assert_eq!(collection.count(doc! { "quantity": 100 }).await.unwrap(), 2);
    assert_eq!(collection.count(doc! { "sku": "sku-0000" }).await.unwrap(), 1);
}

#[tokio::test]
async fn unique_index_rejects_the_second_duplicate() {
    let store = store();
    let collection = store.collection(DB, "items");

    let name = collection.create_index("sku", true).await.unwrap();
    assert_eq!(name, "sku_1");

    let before = collection.count(doc! {}).await.unwrap();
    collection
        .insert_one(&Item { sku: "dup".into(), quantity: 1 })
        .await
        .unwrap();
    let err = collection
        .insert_one(&Item { sku: "dup".into(), quantity: 2 })
        .await
        .unwrap_err();

    assert!(matches!(err, DocumentStoreError::Operation(_)));
    assert_eq!(collection.count(doc! {}).await.unwrap(), before + 1);
}

#[tokio::test]
async fn unique_index_also_guards_updates() {
    let store = store();
    let collection = store.collection(DB, "items");
    collection.create_index("sku", true).await.unwrap();
    collection.insert_many(&items(2)).await.unwrap();

    let err = collection
        .update_one(doc! { "sku": "sku-0001" }, &doc! { "sku": "sku-0000" })
        .await
        .unwrap_err();

    assert!(matches!(err, DocumentStoreError::Operation(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_are_all_stored() {
    let store = Arc::new(store());
    let payloads = items(64);

    let handles = payloads.clone().into_iter().map(|item| {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            let id = store.collection(DB, "items").insert_one(&item).await.unwrap();
            (id, item)
        })
    });

    let inserted = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect::<Vec<_>>();

    let collection = store.collection(DB, "items");
    assert_eq!(collection.count(doc! {}).await.unwrap(), 64);

    for (id, item) in inserted {
        let found: Item = collection
            .find_one(doc! { "_id": id }, FindOneOptions::default())
            .await
            .unwrap();
        assert_eq!(found, item);
    }
}

#[tokio::test]
async fn find_one_not_found_and_options() {
    let store = store();
    let collection = store.collection(DB, "items");
    collection.insert_many(&items(5)).await.unwrap();

    let err = collection
        .find_one::<Item>(doc! { "sku": "nope" }, FindOneOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let highest: Item = collection
        .find_one(doc! {}, FindOneOptions::builder().sort(Sort::desc("quantity")).build())
        .await
        .unwrap();
    assert_eq!(highest.quantity, 4);

    let second_lowest: Item = collection
        .find_one(
            doc! {},
            FindOneOptions::builder().sort(Sort::asc("quantity")).skip(1).build(),
        )
        .await
        .unwrap();
    assert_eq!(second_lowest.quantity, 1);
}

#[tokio::test]
async fn find_one_decode_error() {
    let store = store();
    let collection = store.collection(DB, "items");
    collection.insert_one(&doc! { "sku": 12 }).await.unwrap();

    let err = collection
        .find_one::<Item>(doc! {}, FindOneOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_decode());
}

#[tokio::test]
async fn deletes() {
    let store = store();
    let collection = store.collection(DB, "items");
    let ids = collection.insert_many(&items(6)).await.unwrap();

    assert_eq!(collection.delete_by_id(ids[0].clone()).await.unwrap(), 1);
    assert_eq!(collection.delete_by_id(ids[0].clone()).await.unwrap(), 0);
    assert_eq!(collection.delete_one(doc! { "quantity": { "$gt": 0 } }).await.unwrap(), 1);
    assert_eq!(collection.delete_many(doc! { "quantity": { "$gt": 3 } }).await.unwrap(), 2);

    let mut remaining: Vec<Item> = Vec::new();
    collection.find_all(&mut remaining, doc! {}).await.unwrap();
    assert_eq!(remaining.iter().map(|i| i.quantity).collect::<Vec<_>>(), vec![2, 3]);
}

#[tokio::test]
async fn databases_and_collections_are_isolated() {
    let store = store();
    store.collection("one", "items").insert_many(&items(2)).await.unwrap();
    store.collection("two", "items").insert_many(&items(3)).await.unwrap();

    assert_eq!(store.collection("one", "items").count(doc! {}).await.unwrap(), 2);
    assert_eq!(store.collection("two", "items").count(doc! {}).await.unwrap(), 3);
    assert_eq!(store.collection("one", "other").count(doc! {}).await.unwrap(), 0);

    store.ping().await.unwrap();
    store.shutdown().await.unwrap();
}

#[tokio::test]
async fn merge_update_rejects_dotted_path_through_a_scalar() {
    let store = store();
    let people = store.collection(DB, "people");
    people.insert_one(&doc! { "_id": 1, "address": "unknown" }).await.unwrap();

    let err = people
        .update_by_id(1, &doc! { "address.city": "London" })
        .await
        .unwrap_err();
    let stored: Document = people.find_one(doc! { "_id": 1 }, FindOneOptions::default()).await.unwrap();

    assert!(matches!(err, DocumentStoreError::Operation(_)));
    assert_eq!(stored, doc! { "_id": 1, "address": "unknown" });
}

#[tokio::test]
async fn embedded_document_filters_respect_field_order() {
    let store = store();
    let collection = store.collection(DB, "items");
    collection.insert_one(&doc! { "k": { "a": 1, "b": 2 } }).await.unwrap();
    collection.insert_one(&doc! { "other": true }).await.unwrap();

    assert_eq!(collection.count(doc! { "k": { "a": 1, "b": 2 } }).await.unwrap(), 1);
    assert_eq!(collection.count(doc! { "k": { "b": 2, "a": 1 } }).await.unwrap(), 0);
    assert_eq!(collection.count(doc! { "k": { "$gte": null } }).await.unwrap(), 1);
    assert_eq!(collection.count(doc! { "k": { "$lte": null } }).await.unwrap(), 1);
}
