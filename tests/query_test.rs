mod helpers;

use chrono::NaiveDate;
use helpers::test_store;
use pantry::catalog::feedbacks::FeedbackStatus;
use pantry::{ListParams, Record, SortDir};

#[tokio::test]
async fn page_length_matches_remaining_records() {
    let (store, _) = test_store();
    let users = store.users();
    let total = users.snapshot().await.unwrap().len();
    assert_eq!(total, 24);

    for page_size in [1, 5, 7, 10, 24, 50] {
        for page in 1..=6 {
            let result = users
                .list(&ListParams::default().page(page, page_size))
                .await
                .unwrap();
            let expected = page_size.min(total.saturating_sub((page - 1) * page_size));
            assert_eq!(result.items.len(), expected, "page {page} of size {page_size}");
            assert_eq!(result.total, total);
            assert_eq!(result.total_pages, total.div_ceil(page_size));
        }
    }
}

#[tokio::test]
async fn zero_page_is_treated_as_first() {
    let (store, _) = test_store();
    let first = store.users().list(&ListParams::default()).await.unwrap();
    let zero = store
        .users()
        .list(&ListParams::default().page(0, 0))
        .await
        .unwrap();
    assert_eq!(zero.page, 1);
    assert_eq!(zero.page_size, 1);
    assert_eq!(zero.items[0], first.items[0]);
}

#[tokio::test]
async fn status_filter_counts_whole_collection() {
    let (store, _) = test_store();
    let all = store.feedbacks().snapshot().await.unwrap();
    let expected = all
        .iter()
        .filter(|f| f.status == FeedbackStatus::New)
        .count();

    let page = store
        .feedbacks()
        .list(&ListParams::default().status("new").page(1, 3))
        .await
        .unwrap();
    assert_eq!(page.total, expected);
    assert!(page.items.iter().all(|f| f.status == FeedbackStatus::New));

    let unfiltered = store
        .feedbacks()
        .list(&ListParams::default().status("all"))
        .await
        .unwrap();
    assert_eq!(unfiltered.total, all.len());
}

#[tokio::test]
async fn future_date_range_is_empty() {
    let (store, _) = test_store();
    let from = NaiveDate::from_ymd_opt(2999, 1, 1);
    let page = store
        .payments()
        .list(&ListParams::default().between(from, None))
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert_eq!(page.total_pages, 1);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn search_is_case_insensitive_over_search_fields() {
    let (store, _) = test_store();
    let users = store.users().snapshot().await.unwrap();
    let needle = users[0].name.split(' ').next().unwrap().to_uppercase();

    let page = store
        .users()
        .list(&ListParams::default().search(&needle).page(1, 100))
        .await
        .unwrap();
    assert!(page.total >= 1);
    for user in &page.items {
        let haystack = format!("{} {}", user.name, user.email).to_uppercase();
        assert!(haystack.contains(&needle));
    }

    let blank = store
        .users()
        .list(&ListParams::default().search("   "))
        .await
        .unwrap();
    assert_eq!(blank.total, users.len());
}

#[tokio::test]
async fn default_sort_is_canonical_order() {
    let (store, _) = test_store();
    let page = store
        .events()
        .list(&ListParams::default().page(1, 100))
        .await
        .unwrap();
    assert!(page.items.windows(2).all(|w| w[0].start <= w[1].start));

    let desc = store
        .events()
        .list(&ListParams::default().sort("title", SortDir::Desc).page(1, 100))
        .await
        .unwrap();
    assert!(desc
        .items
        .windows(2)
        .all(|w| w[0].title.to_lowercase() >= w[1].title.to_lowercase()));
}

#[tokio::test]
async fn ids_filter_selects_exact_records() {
    let (store, _) = test_store();
    let users = store.users().snapshot().await.unwrap();
    let wanted = vec![users[3].id.clone(), users[7].id.clone()];

    let page = store
        .users()
        .list(&ListParams::default().ids(wanted.clone()))
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|u| wanted.contains(&u.id)));
    assert!(page.items.iter().all(|u| !u.id().is_empty()));
}

#[tokio::test]
async fn listing_unknown_collection_is_a_validation_error() {
    let (store, _) = test_store();
    for key in ["widgets", "analytics_kpis"] {
        let err = store.list_json(key, &ListParams::default()).await.unwrap_err();
        assert!(err.is_validation(), "{key}");
    }
}

#[tokio::test]
async fn listed_keys_show_only_the_secret_tail() {
    let (store, _) = test_store();
    let keys = store.api_keys().await.unwrap().snapshot().await.unwrap();
    let page = store
        .list_json("api_keys", &ListParams::default().page(1, 50))
        .await
        .unwrap();
    assert_eq!(page.items.len(), keys.len());

    for item in &page.items {
        let key = keys.iter().find(|k| k.id == item["id"]).unwrap();
        let shown = item["secret"].as_str().unwrap();
        assert_ne!(shown, key.secret);
        assert_eq!(shown, key.masked_secret());
        assert!(shown.starts_with("sk_••••"));
        assert!(key.secret.ends_with(&shown[shown.len() - 4..]));
    }
}
