use std::sync::Arc;

use anyhow::Result;
use calendrier_core::config::StoreConfig;
use calendrier_core::{AggregateStore, CalendarQueryService, PartitionKey, PartitionService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<AggregateStore>,
}

impl AppState {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        Ok(Self::with_store(AggregateStore::open(config)?))
    }

    pub fn with_store(store: AggregateStore) -> Self {
        AppState {
            store: Arc::new(store),
        }
    }

    pub fn partition(&self, key: PartitionKey) -> PartitionService {
        PartitionService::new(self.store.clone(), key)
    }

    pub fn query(&self) -> CalendarQueryService {
        CalendarQueryService::new(self.store.clone())
    }
}
