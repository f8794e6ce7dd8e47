//! Concurrent mutation tests: no duplicate IDs, no lost writes

use std::sync::Arc;
use std::time::Duration;

use intake_storage::{
    Fields, InMemoryRecordStore, JsonFileRecordStore, PREDICTION_FIELD, Record, RecordStore,
};
use serde_json::{Value, json};
use tempfile::TempDir;

const WRITERS: u64 = 48;

async fn hammer_creates(store: Arc<dyn RecordStore>) -> Vec<u64> {
    let mut handles = Vec::new();
    for i in 0..WRITERS {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let mut fields = Fields::new();
            fields.insert("n".into(), json!(i));
            store.create(fields).await.unwrap().id
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort_unstable();
    ids
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_creates_file_store() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("records.json");
    let store = Arc::new(JsonFileRecordStore::open(&path).await.unwrap());

    let ids = hammer_creates(store.clone()).await;
    assert_eq!(ids, (1..=WRITERS).collect::<Vec<_>>());

    // Everything that was acknowledged is on disk
    let reopened = JsonFileRecordStore::open(&path).await.unwrap();
    assert_eq!(reopened.list().await.unwrap().len() as u64, WRITERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_creates_memory_store() {
    let store = Arc::new(InMemoryRecordStore::new());
    let ids = hammer_creates(store).await;
    assert_eq!(ids, (1..=WRITERS).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_updates_are_not_lost() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("records.json");
    let store = Arc::new(JsonFileRecordStore::open(&path).await.unwrap());
    let record = store.create(Fields::new()).await.unwrap();

    // Each writer sets a distinct field; all of them must survive
    let mut handles = Vec::new();
    for i in 0..WRITERS {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let mut fields = Fields::new();
            fields.insert(format!("f{i}"), json!(i));
            store.update(record.id, fields).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let reopened = JsonFileRecordStore::open(&path).await.unwrap();
    let stored = reopened.get(record.id).await.unwrap();
    assert_eq!(stored.fields.len() as u64, WRITERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_see_consistent_snapshots() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(
        JsonFileRecordStore::open(temp.path().join("records.json"))
            .await
            .unwrap(),
    );

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for _ in 0..WRITERS {
                store.create(Fields::new()).await.unwrap();
            }
        })
    };

    // IDs in any snapshot are always the contiguous prefix 1..=n
    while !writer.is_finished() {
        let ids: Vec<u64> = store.list().await.unwrap().iter().map(|r| r.id).collect();
        let expected: Vec<u64> = (1..=ids.len() as u64).collect();
        assert_eq!(ids, expected);
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bulk_relabel_with_concurrent_create() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(
        JsonFileRecordStore::open(temp.path().join("records.json"))
            .await
            .unwrap(),
    );
    for _ in 0..10 {
        store.create(Fields::new()).await.unwrap();
    }

    let snapshot = store.list().await.unwrap();
    let labels = snapshot.iter().map(|r| (r.id, json!("B"))).collect();

    let creator = {
        let store = store.clone();
        tokio::spawn(async move { store.create(Fields::new()).await.unwrap() })
    };
    store
        .replace_field_all(PREDICTION_FIELD, labels)
        .await
        .unwrap();
    let late = creator.await.unwrap();

    let records = store.list().await.unwrap();
    assert_eq!(records.len(), 11);
    for record in records {
        if record.id == late.id {
            assert_eq!(record.label(), None);
        } else {
            assert_eq!(record.label(), Some("B"));
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_relabel_holds_off_concurrent_update() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(
        JsonFileRecordStore::open(temp.path().join("records.json"))
            .await
            .unwrap(),
    );
    let mut fields = Fields::new();
    fields.insert("Nombre".into(), json!("Ana"));
    store.create(fields).await.unwrap();

    let relabel = {
        let store = store.clone();
        tokio::spawn(async move {
            let slow_echo = |record: &Record| {
                std::thread::sleep(Duration::from_millis(300));
                json!(format!("para {}", record.fields["Nombre"].as_str().unwrap()))
            };
            store.relabel(PREDICTION_FIELD, &slow_echo).await.unwrap()
        })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut rename = Fields::new();
    rename.insert("Nombre".into(), json!("Eva"));
    let updated = store.update(1, rename).await.unwrap();
    let (applied, snapshot) = relabel.await.unwrap();

    assert_eq!(applied, 1);
    assert_eq!(snapshot[0].fields["Nombre"], "Ana");
    assert_eq!(snapshot[0].label(), Some("para Ana"));
    assert_eq!(updated.fields["Nombre"], "Eva");
    assert_eq!(updated.get(PREDICTION_FIELD), Some(&Value::from("para Ana")));
}
