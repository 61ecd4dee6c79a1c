mod helpers;

use chrono::Duration;
use helpers::{raw, test_store};
use pantry::catalog::apis::NewApiKey;
use pantry::catalog::chats::NewChatMessage;
use pantry::ListParams;

#[tokio::test]
async fn deleting_api_removes_its_keys() {
    let (store, _) = test_store();
    let keys = store.api_keys().await.unwrap().snapshot().await.unwrap();
    let api_id = keys[0].api_id.clone();
    let others = keys.iter().filter(|k| k.api_id != api_id).count();

    store.delete_api(&api_id).await.unwrap();

    let remaining = store.api_keys().await.unwrap().snapshot().await.unwrap();
    assert_eq!(remaining.len(), others);
    assert!(remaining.iter().all(|k| k.api_id != api_id));
    assert!(store.apis().get(&api_id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn key_for_unknown_api_is_not_found() {
    let (store, _) = test_store();
    let err = store
        .create_api_key(NewApiKey {
            api_id: "missing".into(),
            label: "ci".into(),
            scopes: None,
            status: None,
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn generic_key_create_requires_existing_api() {
    let (store, _) = test_store();
    let keys = store.api_keys().await.unwrap();
    keys.snapshot().await.unwrap();
    let before = raw(&store, "api_keys").await;

    let err = keys
        .create(NewApiKey {
            api_id: "no-such-api".into(),
            label: "ci".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("no-such-api"));
    assert_eq!(raw(&store, "api_keys").await, before);
}

#[tokio::test]
async fn bulk_api_delete_removes_keys_of_each_api() {
    let (store, _) = test_store();
    let keys = store.api_keys().await.unwrap().snapshot().await.unwrap();
    let apis = store.apis().snapshot().await.unwrap();
    let ids = vec![apis[0].id.clone(), apis[1].id.clone()];
    assert!(keys.iter().any(|k| k.api_id == ids[0]));
    assert!(keys.iter().any(|k| k.api_id == ids[1]));

    assert_eq!(store.delete_apis(&ids).await.unwrap(), 2);

    let remaining = store.api_keys().await.unwrap().snapshot().await.unwrap();
    assert!(remaining.iter().all(|k| !ids.contains(&k.api_id)));
    assert_eq!(
        remaining.len(),
        keys.iter().filter(|k| !ids.contains(&k.api_id)).count()
    );
}

#[tokio::test]
async fn message_for_unknown_thread_is_not_found() {
    let (store, _) = test_store();
    store.chat_messages().await.unwrap().snapshot().await.unwrap();
    let messages = raw(&store, "chat_messages").await;
    let threads = raw(&store, "chats").await;

    let err = store
        .send_message(NewChatMessage {
            thread_id: "no-such-thread".into(),
            sender: None,
            text: "hello".into(),
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(raw(&store, "chat_messages").await, messages);
    assert_eq!(raw(&store, "chats").await, threads);
}

#[tokio::test]
async fn created_key_is_scoped_to_parent() {
    let (store, _) = test_store();
    let api = store.apis().snapshot().await.unwrap().remove(0);
    let key = store
        .create_api_key(NewApiKey {
            api_id: api.id.clone(),
            label: "deploy".into(),
            scopes: None,
            status: None,
        })
        .await
        .unwrap();
    assert_eq!(key.api_id, api.id);
    assert!(key.secret.starts_with("sk_"));

    let page = store
        .api_keys()
        .await
        .unwrap()
        .list(&ListParams::default().parent(api.id.clone()).page(1, 50))
        .await
        .unwrap();
    assert!(page.items.iter().any(|k| k.id == key.id));
    assert!(page.items.iter().all(|k| k.api_id == api.id));
}

#[tokio::test]
async fn rotation_replaces_secret_and_creation_time() {
    let (store, clock) = test_store();
    let key = store.api_keys().await.unwrap().snapshot().await.unwrap().remove(0);

    clock.advance(Duration::hours(2));
    let rotated = store.rotate_api_key(&key.id).await.unwrap();

    assert_ne!(rotated.secret, key.secret);
    assert!(rotated.secret.starts_with("sk_"));
    assert_eq!(rotated.created_at, helpers::fixed_now() + Duration::hours(2));
    assert_eq!(rotated.label, key.label);
    assert_eq!(rotated.scopes, key.scopes);

    assert!(store.rotate_api_key("missing").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn sending_a_message_bumps_the_thread() {
    let (store, clock) = test_store();
    let threads = store.chats().snapshot().await.unwrap();
    let oldest = threads.last().unwrap().clone();

    clock.advance(Duration::minutes(1));
    let message = store
        .send_message(NewChatMessage {
            thread_id: oldest.id.clone(),
            sender: None,
            text: "  see you at 3 ".into(),
        })
        .await
        .unwrap();
    assert_eq!(message.text, "see you at 3");

    let first = store
        .chats()
        .list(&ListParams::default())
        .await
        .unwrap()
        .items
        .remove(0);
    assert_eq!(first.id, oldest.id);
    assert_eq!(first.last_message, "see you at 3");

    let recent = store.list_messages(&oldest.id, 1).await.unwrap();
    assert_eq!(recent, vec![message]);
}

#[tokio::test]
async fn list_messages_returns_newest_in_chronological_order() {
    let (store, _) = test_store();
    let thread = store.chats().snapshot().await.unwrap().remove(0);
    let all: Vec<_> = store
        .chat_messages()
        .await
        .unwrap()
        .snapshot()
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.thread_id == thread.id)
        .collect();

    let recent = store.list_messages(&thread.id, 3).await.unwrap();
    assert_eq!(recent.len(), all.len().min(3));
    assert!(recent.windows(2).all(|w| w[0].sent_at <= w[1].sent_at));
    assert_eq!(recent.last(), all.last());

    assert!(store
        .list_messages("missing", 3)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn deleting_chat_removes_its_messages() {
    let (store, _) = test_store();
    let thread = store.chats().snapshot().await.unwrap().remove(0);
    store.delete_chat(&thread.id).await.unwrap();

    let messages = store.chat_messages().await.unwrap().snapshot().await.unwrap();
    assert!(messages.iter().all(|m| m.thread_id != thread.id));
}
