//! Shared helpers for calendar store integration tests

#![allow(dead_code)]

use std::sync::Arc;

use calendrier_core::store::FileBackend;
use calendrier_core::{AggregateStore, EventDraft, PartitionKey, PartitionService};

pub fn memory_store() -> Arc<AggregateStore> {
    Arc::new(AggregateStore::in_memory())
}

/// File-backed store in a fresh temp dir. Keep the `TempDir` alive for the test.
pub fn file_store() -> (Arc<AggregateStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = AggregateStore::new(FileBackend::new(dir.path().join("calendar.json")));
    (Arc::new(store), dir)
}

pub fn services(store: &Arc<AggregateStore>) -> [PartitionService; 3] {
    PartitionKey::ALL.map(|key| PartitionService::new(store.clone(), key))
}

pub fn draft(n: usize) -> EventDraft {
    EventDraft::new(
        &format!("2025-09-{:02}", n % 28 + 1),
        &format!("Événement {n}"),
        &format!("Description {n}"),
    )
}
