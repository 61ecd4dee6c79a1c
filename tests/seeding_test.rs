mod helpers;

use helpers::{raw, test_store, test_store_with};
use pantry::catalog::apis::{NewApi, NewApiKey};
use pantry::catalog::chats::{NewChatMessage, NewChatThread};
use pantry::{ListParams, Seeding, COLLECTION_KEYS};

#[tokio::test]
async fn seeding_is_idempotent() {
    let (store, _) = test_store();
    store.users().list(&ListParams::default()).await.unwrap();
    let first = raw(&store, "users").await.unwrap();

    store.users().list(&ListParams::default()).await.unwrap();
    let second = raw(&store, "users").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn same_seed_reproduces_every_collection() {
    let (a, _) = test_store();
    let (b, _) = test_store();
    a.seed_all().await.unwrap();
    b.seed_all().await.unwrap();

    for key in COLLECTION_KEYS {
        assert_eq!(raw(&a, key).await, raw(&b, key).await, "collection {key}");
    }
}

#[tokio::test]
async fn different_seed_changes_data() {
    let (a, _) = test_store();
    let (b, _) = test_store_with(Seeding {
        enabled: true,
        seed: 7,
    });
    let users_a = a.users().snapshot().await.unwrap();
    let users_b = b.users().snapshot().await.unwrap();
    assert_ne!(users_a, users_b);
}

#[tokio::test]
async fn seed_all_fills_every_key() {
    let (store, _) = test_store();
    let summary = store.seed_all().await.unwrap();
    assert_eq!(summary.len(), COLLECTION_KEYS.len());
    for entry in &summary {
        assert!(entry.records > 0, "{} is empty", entry.collection);
        assert!(raw(&store, entry.collection).await.is_some());
    }
}

#[tokio::test]
async fn emptied_collection_is_not_reseeded() {
    let (store, _) = test_store();
    let ids: Vec<String> = store
        .notifications()
        .snapshot()
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect();

    let removed = store.notifications().delete_bulk(&ids).await.unwrap();
    assert_eq!(removed, ids.len());

    let page = store
        .notifications()
        .list(&ListParams::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert_eq!(raw(&store, "notifications").await.as_deref(), Some("[]"));
}

#[tokio::test]
async fn corrupt_blob_is_treated_as_unseeded() {
    let (store, _) = test_store();
    store
        .blobs()
        .save_raw("users", "{not json".to_string())
        .await
        .unwrap();

    let page = store.users().list(&ListParams::default()).await.unwrap();
    assert_eq!(page.total, 24);

    let repaired = raw(&store, "users").await.unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&repaired).is_ok());
}

#[tokio::test]
async fn disabled_seeding_leaves_collections_empty() {
    let (store, _) = test_store_with(Seeding {
        enabled: false,
        seed: 42,
    });
    let page = store.users().list(&ListParams::default()).await.unwrap();
    assert_eq!(page.total, 0);
    assert_eq!(raw(&store, "users").await, None);
    assert_eq!(store.analytics_kpis().await.unwrap(), None);
}

#[tokio::test]
async fn children_attach_to_seeded_parents() {
    let (store, _) = test_store();
    let apis = store.apis().snapshot().await.unwrap();
    let keys = store.api_keys().await.unwrap().snapshot().await.unwrap();
    assert!(!keys.is_empty());
    assert!(keys.iter().all(|k| apis.iter().any(|a| a.id == k.api_id)));

    let threads = store.chats().snapshot().await.unwrap();
    let messages = store.chat_messages().await.unwrap().snapshot().await.unwrap();
    assert!(messages
        .iter()
        .all(|m| threads.iter().any(|t| t.id == m.thread_id)));
}

#[tokio::test]
async fn reset_clears_and_reseeds_on_next_access() {
    let (store, _) = test_store();
    store.seed_all().await.unwrap();
    let before = raw(&store, "payments").await;

    store.reset().await.unwrap();
    assert!(store.blobs().keys().await.unwrap().is_empty());

    store.payments().snapshot().await.unwrap();
    assert_eq!(raw(&store, "payments").await, before);
}

#[tokio::test]
async fn resetting_one_collection_leaves_others() {
    let (store, _) = test_store();
    let user = store.users().snapshot().await.unwrap().remove(0);
    store.users().delete(&user.id).await.unwrap();
    store.payments().snapshot().await.unwrap();
    let payments = raw(&store, "payments").await;

    store.reset_collection("users").await.unwrap();
    assert_eq!(raw(&store, "users").await, None);
    assert_eq!(raw(&store, "payments").await, payments);

    let reseeded = store.users().snapshot().await.unwrap();
    assert_eq!(reseeded.len(), 24);
    assert!(reseeded.iter().any(|u| u.id == user.id));
}

#[tokio::test]
async fn resetting_apis_drops_their_keys() {
    let (store, _) = test_store();
    let api = store
        .apis()
        .create(NewApi {
            name: "Internal".into(),
            base_url: "https://internal.example.com".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let key = store
        .create_api_key(NewApiKey {
            api_id: api.id.clone(),
            label: "deploy".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    store.reset_collection("apis").await.unwrap();
    assert_eq!(raw(&store, "api_keys").await, None);

    let apis = store.apis().snapshot().await.unwrap();
    let keys = store.api_keys().await.unwrap().snapshot().await.unwrap();
    assert!(!keys.is_empty());
    assert!(keys.iter().all(|k| k.id != key.id));
    assert!(keys.iter().all(|k| apis.iter().any(|a| a.id == k.api_id)));
}

#[tokio::test]
async fn resetting_chats_drops_their_messages() {
    let (store, _) = test_store();
    let thread = store
        .chats()
        .create(NewChatThread {
            participant: "Grace".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let message = store
        .send_message(NewChatMessage {
            thread_id: thread.id.clone(),
            sender: None,
            text: "hello".into(),
        })
        .await
        .unwrap();

    store.reset_collection("chats").await.unwrap();
    assert_eq!(raw(&store, "chat_messages").await, None);

    let threads = store.chats().snapshot().await.unwrap();
    let messages = store.chat_messages().await.unwrap().snapshot().await.unwrap();
    assert!(messages.iter().all(|m| m.id != message.id));
    assert!(messages
        .iter()
        .all(|m| threads.iter().any(|t| t.id == m.thread_id)));
}

#[tokio::test]
async fn resetting_unknown_collection_is_rejected() {
    let (store, _) = test_store();
    store.users().snapshot().await.unwrap();
    let err = store.reset_collection("widgets").await.unwrap_err();
    assert!(err.is_validation());
    assert!(raw(&store, "users").await.is_some());
}
