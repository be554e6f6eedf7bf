//! JSON file document backend.
//!
//! The calendar lives in a single JSON file. Writes go to a sibling `.tmp`
//! file which is then renamed over the target, so a reader sees either the
//! previous document or the new one, never a partial write.
//!
//! Every call is bounded by `io_timeout`. The rename (or removal) that
//! commits a write only happens while the caller is still waiting: once a
//! call has reported a timeout, its write is discarded.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::aggregate::CalendarAggregate;
use crate::error::{CalendarError, CalendarResult};
use crate::store::{DEFAULT_IO_TIMEOUT, DocumentBackend};

pub struct FileBackend {
    path: Arc<PathBuf>,
    // Serializes check-then-write sequences that run on the blocking pool.
    file_lock: Arc<Mutex<()>>,
    io_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommitState {
    Pending,
    Committed,
    Abandoned,
}

/// Decides, under one lock, whether a write commits or the caller gives up.
#[derive(Clone)]
struct CommitGate(Arc<Mutex<CommitState>>);

impl CommitGate {
    fn new() -> Self {
        CommitGate(Arc::new(Mutex::new(CommitState::Pending)))
    }

    /// Run `commit` unless the caller already timed out.
    fn commit(&self, commit: impl FnOnce() -> CalendarResult<()>) -> CalendarResult<()> {
        let mut state = self
            .0
            .lock()
            .map_err(|_| CalendarError::storage("commit state poisoned"))?;

        if *state == CommitState::Abandoned {
            return Err(CalendarError::storage("write discarded after timeout"));
        }
        commit()?;
        *state = CommitState::Committed;
        Ok(())
    }

    /// Mark the write abandoned. Returns `false` if it already committed.
    fn abandon(&self) -> CalendarResult<bool> {
        let mut state = self
            .0
            .lock()
            .map_err(|_| CalendarError::storage("commit state poisoned"))?;

        match *state {
            CommitState::Committed => Ok(false),
            _ => {
                *state = CommitState::Abandoned;
                Ok(true)
            }
        }
    }
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileBackend {
            path: Arc::new(path.into()),
            file_lock: Arc::new(Mutex::new(())),
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Run `op` on the blocking pool with the file lock held.
    ///
    /// On timeout the gate is abandoned, so `op` cannot commit anymore. If it
    /// committed just before the deadline, its real outcome is returned.
    async fn with_file<T, F>(&self, op: F) -> CalendarResult<T>
    where
        F: FnOnce(&Path, &CommitGate) -> CalendarResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = Arc::clone(&self.path);
        let lock = Arc::clone(&self.file_lock);
        let gate = CommitGate::new();
        let task_gate = gate.clone();

        let mut task = tokio::task::spawn_blocking(move || {
            let _guard = lock
                .lock()
                .map_err(|_| CalendarError::storage("calendar file lock poisoned"))?;
            op(&path, &task_gate)
        });

        let joined = match tokio::time::timeout(self.io_timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                if gate.abandon()? {
                    debug!(path = %self.path.display(), "Calendar file call abandoned");
                    return Err(CalendarError::storage(format!(
                        "calendar file call timed out after {}",
                        humantime::format_duration(self.io_timeout)
                    )));
                }
                // Committed right at the deadline; the task is finishing up.
                task.await
            }
        };

        joined.map_err(|e| CalendarError::storage_with("storage task failed", e))?
    }
}

#[async_trait]
impl DocumentBackend for FileBackend {
    async fn find_one(&self) -> CalendarResult<Option<CalendarAggregate>> {
        self.with_file(|path, _| read_document(path)).await
    }

    async fn insert_one(&self, doc: &CalendarAggregate) -> CalendarResult<bool> {
        let doc = doc.clone();
        self.with_file(move |path, gate| {
            if read_document(path)?.is_some() {
                return Ok(false);
            }
            write_document(path, &doc, gate)?;
            Ok(true)
        })
        .await
    }

    async fn replace_one(&self, doc: &CalendarAggregate) -> CalendarResult<bool> {
        let doc = doc.clone();
        self.with_file(move |path, gate| match read_document(path)? {
            Some(current) if current.id == doc.id => {
                write_document(path, &doc, gate)?;
                Ok(true)
            }
            _ => Ok(false),
        })
        .await
    }

    async fn delete_one(&self, id: &str) -> CalendarResult<bool> {
        let id = id.to_string();
        self.with_file(move |path, gate| match read_document(path)? {
            Some(current) if current.id == id => {
                gate.commit(|| {
                    std::fs::remove_file(path).map_err(|e| {
                        CalendarError::storage_with("could not delete calendar file", e)
                    })
                })?;
                Ok(true)
            }
            _ => Ok(false),
        })
        .await
    }
}

fn read_document(path: &Path) -> CalendarResult<Option<CalendarAggregate>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(CalendarError::storage_with(
                format!("could not read {}", path.display()),
                e,
            ));
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| CalendarError::storage_with(format!("corrupt calendar file {}", path.display()), e))
}

fn write_document(path: &Path, doc: &CalendarAggregate, gate: &CommitGate) -> CalendarResult<()> {
    let io_err = |e: std::io::Error| {
        CalendarError::storage_with(format!("could not write {}", path.display()), e)
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let content = serde_json::to_vec_pretty(doc)
        .map_err(|e| CalendarError::storage_with("could not serialize calendar", e))?;

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp = PathBuf::from(temp_name);

    let mut file = std::fs::File::create(&temp).map_err(io_err)?;
    file.write_all(&content).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    let committed = gate.commit(|| std::fs::rename(&temp, path).map_err(io_err));
    if committed.is_err() {
        let _ = std::fs::remove_file(&temp);
    }
    committed
}
