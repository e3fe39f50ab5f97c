//! Tests against a running MongoDB server.
//!
//! Ignored by default. Run them with
//! `DOCACCESS_MONGODB_ADDRESS=localhost:27017 cargo test -p docaccess-mongodb -- --ignored`.

use std::sync::{Arc, Mutex};

use bson::{Bson, doc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use docaccess_core::{
    error::DocumentStoreError,
    options::{FindOneOptions, Sort},
    store::DocumentStore,
};
use docaccess_mongodb::{ClientConfig, MongoDbStore, connect};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Reading {
    sensor: String,
    value: i64,
}

fn address() -> String {
    std::env::var("DOCACCESS_MONGODB_ADDRESS").unwrap_or_else(|_| "localhost:27017".to_string())
}

fn database() -> String {
    format!("docaccess_test_{}", uuid::Uuid::new_v4().simple())
}

async fn store() -> DocumentStore<MongoDbStore> {
    let config = ClientConfig::builder(address(), "docaccess-tests").build().unwrap();
    DocumentStore::new(connect(&config).await.unwrap())
}

async fn drop_database(store: &DocumentStore<MongoDbStore>, name: &str) {
    store.backend().client().database(name).drop().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn round_trip_preserves_insertion_order() {
    let store = store().await;
    let db = database();
    let readings = store.collection(&db, "readings");

    let expected = (0..250)
        .map(|n| Reading { sensor: format!("s{n}"), value: n })
        .collect::<Vec<_>>();
    readings.insert_many(&expected).await.unwrap();

    let mut found: Vec<Reading> = Vec::new();
    assert_eq!(readings.find_all(&mut found, doc! {}).await.unwrap(), 250);
    assert_eq!(found, expected);
    assert_eq!(readings.count(doc! { "value": 7 }).await.unwrap(), 1);

    drop_database(&store, &db).await;
    store.shutdown().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn decode_failure_leaves_destination_untouched() {
    let store = store().await;
    let db = database();
    let readings = store.collection(&db, "readings");

    readings.insert_one(&Reading { sensor: "a".into(), value: 1 }).await.unwrap();
    readings.insert_one(&doc! { "sensor": "b", "value": "high" }).await.unwrap();

    let mut found = vec![Reading { sensor: "kept".into(), value: 0 }];
    let err = readings.find_all(&mut found, doc! {}).await.unwrap_err();

    assert!(matches!(err, DocumentStoreError::Decode { position: 1, .. }));
    assert_eq!(found, vec![Reading { sensor: "kept".into(), value: 0 }]);

    drop_database(&store, &db).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn updates_merge_and_unique_indexes_reject_duplicates() {
    let store = store().await;
    let db = database();
    let readings = store.collection(&db, "readings");

    assert_eq!(readings.create_index("sensor", true).await.unwrap(), "sensor_1");

    let id = readings.insert_one(&Reading { sensor: "a".into(), value: 1 }).await.unwrap();
    let err = readings
        .insert_one(&Reading { sensor: "a".into(), value: 2 })
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::Operation(_)));
    assert_eq!(readings.count(doc! {}).await.unwrap(), 1);

    let outcome = readings.update_by_id(id.clone(), &doc! { "value": 5 }).await.unwrap();
    assert_eq!((outcome.matched, outcome.modified), (1, 1));

    let stored: Reading = readings.find_one(doc! { "_id": id }, FindOneOptions::default()).await.unwrap();
    assert_eq!(stored, Reading { sensor: "a".into(), value: 5 });

    let missing = readings
        .find_one::<Reading>(doc! { "sensor": "z" }, FindOneOptions::default())
        .await
        .unwrap_err();
    assert!(missing.is_not_found());

    drop_database(&store, &db).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn find_one_honours_sort_and_skip() {
    let store = store().await;
    let db = database();
    let readings = store.collection(&db, "readings");

    readings
        .insert_many(&(1..=5).map(|n| Reading { sensor: format!("s{n}"), value: n }).collect::<Vec<_>>())
        .await
        .unwrap();

    let second_highest: Reading = readings
        .find_one(doc! {}, FindOneOptions::builder().sort(Sort::desc("value")).skip(1).build())
        .await
        .unwrap();
    assert_eq!(second_highest.value, 4);

    assert_eq!(readings.delete_many(doc! { "value": { "$lte": 2 } }).await.unwrap(), 2);

    drop_database(&store, &db).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a running MongoDB server"]
async fn concurrent_inserts_are_all_stored() {
    let store = Arc::new(store().await);
    let db = database();

    let ids = join_all((0..32).map(|n| {
        let store = Arc::clone(&store);
        let db = db.clone();
        async move {
            store
                .collection(&db, "readings")
                .insert_one(&Reading { sensor: format!("s{n}"), value: n })
                .await
                .unwrap()
        }
    }))
    .await;

    let readings = store.collection(&db, "readings");
    assert_eq!(readings.count(doc! {}).await.unwrap(), 32);
    for id in ids {
        assert!(matches!(id, Bson::ObjectId(_)));
        readings
            .find_one::<Reading>(doc! { "_id": id }, FindOneOptions::default())
            .await
            .unwrap();
    }

    drop_database(&store, &db).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn command_listener_sees_commands() {
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&seen);

    let config = ClientConfig::builder(address(), "docaccess-tests")
        .command_listener(move |event| sink.lock().unwrap().push(event.command_name.clone()))
        .build()
        .unwrap();
    let store = DocumentStore::new(connect(&config).await.unwrap());
    let db = database();

    store.collection(&db, "readings").count(doc! {}).await.unwrap();
    drop_database(&store, &db).await;
    store.shutdown().await.unwrap();

    let seen = seen.lock().unwrap();
    assert!(seen.iter().any(|name| name == "ping"));
    assert!(seen.iter().any(|name| name == "aggregate"));
    assert!(!seen.iter().any(|name| name == "endSessions"));
}
