//! Academic calendar aggregate store.
//!
//! One calendar document holds three ordered partitions of events
//! (`S1`, `S2` and the general `evenements` list):
//! - `event` and `validation`: the entry types and their input checks
//! - `aggregate`: the calendar document and its partitions
//! - `store`: the serialized persistence boundary and its backends
//! - `partition` and `query`: the services callers use

pub mod aggregate;
pub mod config;
pub mod error;
pub mod event;
pub mod partition;
pub mod query;
pub mod store;
pub mod validation;

pub use aggregate::{CalendarAggregate, PartitionKey, Semestres};
pub use error::{CalendarError, CalendarResult, FieldError, NotFound, ValidationErrors};
pub use event::{EventDate, EventDraft, EventPatch, EventRecord};
pub use partition::PartitionService;
pub use query::{CalendarQueryService, CreateCalendarRequest, SemestresDraft};
pub use store::{AggregateStore, CreateResult, DocumentBackend, OnMissing};
