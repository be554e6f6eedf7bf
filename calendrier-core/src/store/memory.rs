//! In-process document backend.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::aggregate::CalendarAggregate;
use crate::error::CalendarResult;
use crate::store::DocumentBackend;

/// Holds the calendar document in memory.
///
/// Readers get a full clone taken under the read lock, so they always see
/// a complete document.
#[derive(Default)]
pub struct MemoryBackend {
    doc: RwLock<Option<CalendarAggregate>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn find_one(&self) -> CalendarResult<Option<CalendarAggregate>> {
        Ok(self.doc.read().await.clone())
    }

    async fn insert_one(&self, doc: &CalendarAggregate) -> CalendarResult<bool> {
        let mut slot = self.doc.write().await;
        if slot.is_some() {
            return Ok(false);
        }
        *slot = Some(doc.clone());
        Ok(true)
    }

    async fn replace_one(&self, doc: &CalendarAggregate) -> CalendarResult<bool> {
        let mut slot = self.doc.write().await;
        match slot.as_mut() {
            Some(current) if current.id == doc.id => {
                *current = doc.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_one(&self, id: &str) -> CalendarResult<bool> {
        let mut slot = self.doc.write().await;
        if slot.as_ref().is_some_and(|c| c.id == id) {
            *slot = None;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
