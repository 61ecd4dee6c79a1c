#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

use pantry::persistence::MemoryBackend;
use pantry::{ManualClock, Seeding, Store};

/// The instant every test store starts at.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

/// Fresh in-memory store on a manual clock with the default seed.
pub fn test_store() -> (Store, Arc<ManualClock>) {
    test_store_with(Seeding::default())
}

pub fn test_store_with(seeding: Seeding) -> (Store, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(fixed_now()));
    let store = Store::new(Arc::new(MemoryBackend::new()), clock.clone(), seeding);
    (store, clock)
}

/// Raw blob text under `key`, for byte-for-byte comparisons.
pub async fn raw(store: &Store, key: &str) -> Option<String> {
    store.blobs().load_raw(key).await
}
