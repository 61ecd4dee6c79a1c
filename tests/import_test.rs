mod helpers;

use serde_json::{json, Value};
use std::collections::BTreeMap;

use helpers::{raw, test_store, test_store_with};
use pantry::Seeding;

async fn blob(store: &pantry::Store, key: &str) -> Value {
    serde_json::from_str(&raw(store, key).await.unwrap()).unwrap()
}

#[tokio::test]
async fn mistyped_blob_rejects_whole_import() {
    let (store, _) = test_store();
    store.users().snapshot().await.unwrap();
    let users = raw(&store, "users").await;

    let mut collections = BTreeMap::new();
    collections.insert("users".to_string(), json!([]));
    collections.insert("payments".to_string(), json!([{ "id": 3 }]));

    let err = store.import_blobs(collections, true).await.unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("payments"));
    assert_eq!(raw(&store, "users").await, users);
    assert_eq!(raw(&store, "payments").await, None);
}

#[tokio::test]
async fn present_and_unknown_keys_are_skipped() {
    let (store, _) = test_store();
    store.users().snapshot().await.unwrap();
    let users = raw(&store, "users").await;

    let mut collections = BTreeMap::new();
    collections.insert("users".to_string(), json!([]));
    collections.insert("widgets".to_string(), json!({ "not": "checked" }));
    collections.insert("emails".to_string(), json!([]));

    let summary = store.import_blobs(collections, false).await.unwrap();
    assert_eq!(summary.imported, vec!["emails"]);
    assert_eq!(summary.skipped, vec!["users".to_string(), "widgets".to_string()]);
    assert_eq!(raw(&store, "users").await, users);
    assert_eq!(raw(&store, "emails").await.as_deref(), Some("[]"));
}

#[tokio::test]
async fn replacing_apis_drops_stale_keys() {
    let (store, _) = test_store();
    store.api_keys().await.unwrap().snapshot().await.unwrap();

    let (other, _) = test_store_with(Seeding {
        enabled: true,
        seed: 7,
    });
    other.apis().snapshot().await.unwrap();
    let mut collections = BTreeMap::new();
    collections.insert("apis".to_string(), blob(&other, "apis").await);

    let summary = store.import_blobs(collections, true).await.unwrap();
    assert_eq!(summary.imported, vec!["apis"]);
    assert_eq!(summary.cleared, vec!["api_keys"]);

    let apis = store.apis().snapshot().await.unwrap();
    assert_eq!(apis, other.apis().snapshot().await.unwrap());
    let keys = store.api_keys().await.unwrap().snapshot().await.unwrap();
    assert!(!keys.is_empty());
    assert!(keys.iter().all(|k| apis.iter().any(|a| a.id == k.api_id)));
}

#[tokio::test]
async fn importing_daily_series_with_its_sources_keeps_them() {
    let (source, _) = test_store();
    source.analytics_sources_snapshot().await.unwrap();
    source.analytics_kpis().await.unwrap();

    let (store, _) = test_store_with(Seeding {
        enabled: true,
        seed: 7,
    });
    store.seed_all().await.unwrap();

    let mut collections = BTreeMap::new();
    for key in ["analytics_daily", "analytics_sources_daily"] {
        collections.insert(key.to_string(), blob(&source, key).await);
    }
    let summary = store.import_blobs(collections, true).await.unwrap();
    assert_eq!(summary.cleared, vec!["analytics_kpis"]);

    assert_eq!(
        store.analytics_sources_snapshot().await.unwrap(),
        source.analytics_sources_snapshot().await.unwrap()
    );
    assert_eq!(raw(&store, "analytics_kpis").await, None);
    let kpis = store.analytics_kpis().await.unwrap().unwrap();
    assert_eq!(Some(kpis), source.analytics_kpis().await.unwrap());
}
