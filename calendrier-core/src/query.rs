//! Whole-calendar operations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::aggregate::{CalendarAggregate, PartitionKey, Semestres};
use crate::error::{CalendarError, CalendarResult, ValidationErrors};
use crate::event::{EventDraft, EventRecord, new_id};
use crate::store::{AggregateStore, CreateResult};
use crate::validation::validate;

/// Body of `POST /`: initial events for each partition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateCalendarRequest {
    pub semestres: SemestresDraft,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SemestresDraft {
    #[serde(rename = "S1")]
    pub s1: Vec<EventDraft>,
    #[serde(rename = "S2")]
    pub s2: Vec<EventDraft>,
    pub evenements: Vec<EventDraft>,
}

impl SemestresDraft {
    fn partition(&self, key: PartitionKey) -> &[EventDraft] {
        match key {
            PartitionKey::S1 => &self.s1,
            PartitionKey::S2 => &self.s2,
            PartitionKey::General => &self.evenements,
        }
    }
}

#[derive(Clone)]
pub struct CalendarQueryService {
    store: Arc<AggregateStore>,
}

impl CalendarQueryService {
    pub fn new(store: Arc<AggregateStore>) -> Self {
        CalendarQueryService { store }
    }

    /// All three partitions from a single snapshot, or `None` if the
    /// calendar has not been created.
    #[instrument(skip(self))]
    pub async fn get_full_calendar(&self) -> CalendarResult<Option<CalendarAggregate>> {
        self.store.load_aggregate().await
    }

    /// Validate the request, assign ids and create the calendar.
    /// Fails with `AlreadyExists` if there already is one.
    #[instrument(skip(self, request))]
    pub async fn create_calendar(
        &self,
        request: &CreateCalendarRequest,
    ) -> CalendarResult<CalendarAggregate> {
        let mut errors = ValidationErrors::default();
        let mut calendar = CalendarAggregate {
            id: new_id(),
            semestres: Semestres::default(),
        };

        for key in PartitionKey::ALL {
            let events: &mut Vec<EventRecord> = calendar.partition_mut(key);
            for (index, draft) in request.semestres.partition(key).iter().enumerate() {
                match validate(draft) {
                    Ok(event) => events.push(event.into_record(new_id())),
                    Err(e) => errors.extend_prefixed(&format!("{}[{}]", key, index), e),
                }
            }
        }

        if !errors.is_empty() {
            return Err(CalendarError::ValidationFailed(errors));
        }

        match self.store.create_aggregate_if_absent(calendar).await? {
            CreateResult::Created(calendar) => Ok(calendar),
            CreateResult::AlreadyExists => Err(CalendarError::AlreadyExists),
        }
    }

    /// Remove the calendar with `id`.
    #[instrument(skip(self))]
    pub async fn delete_calendar(&self, id: &str) -> CalendarResult<()> {
        self.store.delete_aggregate(id).await
    }
}
