//! Persistence boundary for the calendar document.
//!
//! `DocumentBackend` is the raw document-store client: find, unique insert,
//! replace and delete of the one calendar document. `AggregateStore` wraps a
//! backend and is the only way the rest of the crate touches storage. Every
//! write (create, partition mutation, delete) runs under one store-wide
//! lock, so a read-modify-write of one partition can never overwrite a
//! concurrent change to another partition of the same document.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::aggregate::{CalendarAggregate, PartitionKey, duplicate_in};
use crate::config::{BackendKind, StoreConfig};
use crate::error::{CalendarError, CalendarResult, NotFound, ValidationErrors};
use crate::event::EventRecord;

/// Default bound on a single backend call
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Raw document-store client holding at most one calendar document.
///
/// Implementations must make each call atomic on its own: a reader never sees
/// a half-written document, and `insert_one` never inserts a second document.
/// Writes bound their own duration, and a write that reported an error must
/// not take effect afterwards.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// The stored document, or `None` if there is none
    async fn find_one(&self) -> CalendarResult<Option<CalendarAggregate>>;

    /// Insert `doc` unless a document already exists.
    /// Returns `false` (and writes nothing) if one does.
    async fn insert_one(&self, doc: &CalendarAggregate) -> CalendarResult<bool>;

    /// Replace the stored document with the same id.
    /// Returns `false` if no document with that id exists.
    async fn replace_one(&self, doc: &CalendarAggregate) -> CalendarResult<bool>;

    /// Delete the document with `id`. Returns `false` if none matched.
    async fn delete_one(&self, id: &str) -> CalendarResult<bool>;
}

/// Outcome of `AggregateStore::create_aggregate_if_absent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateResult {
    Created(CalendarAggregate),
    AlreadyExists,
}

/// What `mutate_partition` does when no calendar exists yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnMissing {
    /// Start from an empty calendar and insert it
    Create,
    /// Fail with `NotFound::Calendar`
    Fail,
}

/// Result of a partition mutation: the transform's output and the
/// partition as it was persisted.
#[derive(Debug, Clone)]
pub struct Mutation<T> {
    pub output: T,
    pub partition: Vec<EventRecord>,
}

pub struct AggregateStore {
    backend: Arc<dyn DocumentBackend>,
    write_lock: Mutex<()>,
    io_timeout: Duration,
}

impl AggregateStore {
    pub fn new(backend: impl DocumentBackend + 'static) -> Self {
        AggregateStore {
            backend: Arc::new(backend),
            write_lock: Mutex::new(()),
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    /// Store backed by process memory; contents are lost on exit.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Build the store described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self, crate::config::ConfigError> {
        let io_timeout = config.io_timeout()?;

        let store = match config.backend {
            BackendKind::Memory => Self::in_memory(),
            BackendKind::File => {
                let path = config.data_path();
                info!(path = %path.display(), "Using file-backed calendar store");
                Self::new(FileBackend::new(path).with_io_timeout(io_timeout))
            }
        };

        Ok(store.with_io_timeout(io_timeout))
    }

    /// The current calendar, or `None` if it has not been created yet.
    pub async fn load_aggregate(&self) -> CalendarResult<Option<CalendarAggregate>> {
        self.read(self.backend.find_one()).await
    }

    /// Insert `initial` as the calendar unless one already exists.
    pub async fn create_aggregate_if_absent(
        &self,
        initial: CalendarAggregate,
    ) -> CalendarResult<CreateResult> {
        if let Some((partition, id)) = initial.duplicate_id() {
            return Err(duplicate_id_error(partition, id));
        }

        let _guard = self.write_lock.lock().await;

        if logged("insert_one", self.backend.insert_one(&initial).await)? {
            info!(id = %initial.id, "Calendar created");
            Ok(CreateResult::Created(initial))
        } else {
            debug!("Calendar already exists, create skipped");
            Ok(CreateResult::AlreadyExists)
        }
    }

    /// Apply `mutate` to one partition and persist the whole calendar.
    ///
    /// The transform works on a copy of the partition; if it returns an error
    /// nothing is written. Other partitions are carried over untouched.
    pub async fn mutate_partition<T, F>(
        &self,
        key: PartitionKey,
        on_missing: OnMissing,
        mutate: F,
    ) -> CalendarResult<Mutation<T>>
    where
        F: FnOnce(&mut Vec<EventRecord>) -> CalendarResult<T> + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;

        let (mut calendar, is_new) = match self.read(self.backend.find_one()).await? {
            Some(calendar) => (calendar, false),
            None if on_missing == OnMissing::Create => (CalendarAggregate::empty(), true),
            None => return Err(CalendarError::NotFound(NotFound::Calendar)),
        };

        let mut working = calendar.partition(key).to_vec();
        let output = mutate(&mut working)?;
        if let Some(id) = duplicate_in(&working) {
            return Err(duplicate_id_error(key, id));
        }
        *calendar.partition_mut(key) = working;

        let written = if is_new {
            debug!(id = %calendar.id, "Creating calendar on first write");
            logged("insert_one", self.backend.insert_one(&calendar).await)?
        } else {
            logged("replace_one", self.backend.replace_one(&calendar).await)?
        };

        if !written {
            // Only reachable if something outside this store changed the document.
            return Err(CalendarError::storage(
                "calendar document changed outside the store",
            ));
        }

        debug!(partition = %key, events = calendar.partition(key).len(), "Partition written");

        Ok(Mutation {
            output,
            partition: calendar.partition(key).to_vec(),
        })
    }

    /// Remove the calendar with `id` entirely.
    pub async fn delete_aggregate(&self, id: &str) -> CalendarResult<()> {
        let _guard = self.write_lock.lock().await;

        if logged("delete_one", self.backend.delete_one(id).await)? {
            info!(id, "Calendar deleted");
            Ok(())
        } else {
            Err(CalendarError::NotFound(NotFound::Calendar))
        }
    }

    /// Reads have no side effects, so they can simply be dropped on timeout.
    async fn read<T>(&self, call: impl Future<Output = CalendarResult<T>>) -> CalendarResult<T> {
        let result = match tokio::time::timeout(self.io_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CalendarError::storage(format!(
                "find_one timed out after {}",
                humantime::format_duration(self.io_timeout)
            ))),
        };
        logged("find_one", result)
    }
}

fn logged<T>(op: &'static str, result: CalendarResult<T>) -> CalendarResult<T> {
    if let Err(e @ CalendarError::StorageUnavailable { .. }) = &result {
        warn!(op, error = %e, "Storage call failed");
    }
    result
}

fn duplicate_id_error(partition: PartitionKey, id: &str) -> CalendarError {
    let mut errors = ValidationErrors::default();
    errors.push("_id", format!("duplicate id '{id}' in {partition}"));
    CalendarError::ValidationFailed(errors)
}
