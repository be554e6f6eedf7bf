//! Event operations on one partition of the calendar.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::aggregate::PartitionKey;
use crate::error::{CalendarError, CalendarResult};
use crate::event::{EventDraft, EventPatch, EventRecord, new_id};
use crate::store::{AggregateStore, OnMissing};
use crate::validation::{validate, validate_patch};

/// List, append, update and remove events in the partition named by `key`.
///
/// All writes go through `AggregateStore::mutate_partition`.
#[derive(Clone)]
pub struct PartitionService {
    key: PartitionKey,
    store: Arc<AggregateStore>,
}

impl PartitionService {
    pub fn new(store: Arc<AggregateStore>, key: PartitionKey) -> Self {
        PartitionService { key, store }
    }

    /// Events in stored order. Empty if the calendar does not exist yet.
    #[instrument(skip(self), fields(partition = %self.key))]
    pub async fn list(&self) -> CalendarResult<Vec<EventRecord>> {
        let events = self
            .store
            .load_aggregate()
            .await?
            .map(|calendar| calendar.partition(self.key).to_vec())
            .unwrap_or_default();

        Ok(events)
    }

    /// Validate `draft`, give it a fresh id and add it at the end.
    /// Creates the calendar if it does not exist yet.
    #[instrument(skip(self, draft), fields(partition = %self.key))]
    pub async fn append(&self, draft: &EventDraft) -> CalendarResult<EventRecord> {
        let event = validate(draft)?;

        let mutation = self
            .store
            .mutate_partition(self.key, OnMissing::Create, move |events| {
                let record = event.into_record(unused_id(events));
                events.push(record.clone());
                Ok(record)
            })
            .await?;

        debug!(id = %mutation.output.id, "Event appended");
        Ok(mutation.output)
    }

    /// Overwrite the fields supplied in `patch` on the event with `id`.
    #[instrument(skip(self, patch), fields(partition = %self.key))]
    pub async fn update(&self, id: &str, patch: &EventPatch) -> CalendarResult<EventRecord> {
        let patch = validate_patch(patch)?;
        let key = self.key;

        let mutation = self
            .store
            .mutate_partition(key, OnMissing::Fail, |events| {
                let record = events
                    .iter_mut()
                    .find(|e| e.id == id)
                    .ok_or_else(|| CalendarError::event_not_found(key, id))?;
                patch.apply(record);
                Ok(record.clone())
            })
            .await?;

        debug!("Event updated");
        Ok(mutation.output)
    }

    /// Remove the event with `id`.
    #[instrument(skip(self), fields(partition = %self.key))]
    pub async fn remove(&self, id: &str) -> CalendarResult<()> {
        let key = self.key;

        self.store
            .mutate_partition(key, OnMissing::Fail, |events| {
                let before = events.len();
                events.retain(|e| e.id != id);
                if events.len() == before {
                    return Err(CalendarError::event_not_found(key, id));
                }
                Ok(())
            })
            .await?;

        debug!("Event removed");
        Ok(())
    }
}

fn unused_id(events: &[EventRecord]) -> String {
    loop {
        let id = new_id();
        if !events.iter().any(|e| e.id == id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotFound;

    fn service(key: PartitionKey) -> PartitionService {
        PartitionService::new(Arc::new(AggregateStore::in_memory()), key)
    }

    #[tokio::test]
    async fn test_list_without_calendar_is_empty() {
        let s1 = service(PartitionKey::S1);
        assert!(s1.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_rejects_invalid_without_creating_calendar() {
        let store = Arc::new(AggregateStore::in_memory());
        let s1 = PartitionService::new(store.clone(), PartitionKey::S1);

        let err = s1
            .append(&EventDraft::new("", "titre", "desc"))
            .await
            .unwrap_err();

        assert!(matches!(err, CalendarError::ValidationFailed(_)));
        assert_eq!(store.load_aggregate().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_append_keeps_insertion_order() {
        let general = service(PartitionKey::General);
        let later = general
            .append(&EventDraft::new("2026-01-10", "Examens", "Session de janvier"))
            .await
            .unwrap();
        let earlier = general
            .append(&EventDraft::new("2025-09-01", "Rentrée", "Début des cours"))
            .await
            .unwrap();

        let ids: Vec<String> = general.list().await.unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![later.id, earlier.id]);
    }

    #[tokio::test]
    async fn test_update_and_remove_without_calendar() {
        let s2 = service(PartitionKey::S2);

        let err = s2.update("x", &EventPatch::default()).await.unwrap_err();
        assert!(matches!(err, CalendarError::NotFound(NotFound::Calendar)));

        let err = s2.remove("x").await.unwrap_err();
        assert!(matches!(err, CalendarError::NotFound(NotFound::Calendar)));
    }

    #[tokio::test]
    async fn test_update_invalid_patch_is_rejected_before_lookup() {
        let s1 = service(PartitionKey::S1);
        let patch = EventPatch {
            titre: Some("  ".to_string()),
            ..Default::default()
        };

        let err = s1.update("missing", &patch).await.unwrap_err();
        assert!(matches!(err, CalendarError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_id_from_other_partition_is_not_visible() {
        let store = Arc::new(AggregateStore::in_memory());
        let s1 = PartitionService::new(store.clone(), PartitionKey::S1);
        let s2 = PartitionService::new(store, PartitionKey::S2);

        let e1 = s1
            .append(&EventDraft::new("2025-10-01", "TP", "Salle 12"))
            .await
            .unwrap();

        let err = s2.remove(&e1.id).await.unwrap_err();
        assert!(matches!(
            err,
            CalendarError::NotFound(NotFound::Event { partition: PartitionKey::S2, .. })
        ));
        assert_eq!(s1.list().await.unwrap(), vec![e1]);
    }
}
