//! Error types for the calendar store.

use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::aggregate::PartitionKey;

/// Boxed error for wrapping backend-specific failures
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Errors that can occur in calendar operations.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    #[error("{0}")]
    NotFound(NotFound),

    #[error("Calendar already exists")]
    AlreadyExists,

    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },
}

impl CalendarError {
    pub fn storage(message: impl Into<String>) -> Self {
        CalendarError::StorageUnavailable {
            message: message.into(),
            source: None,
        }
    }

    pub fn storage_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        CalendarError::StorageUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn event_not_found(partition: PartitionKey, id: &str) -> Self {
        CalendarError::NotFound(NotFound::Event {
            partition,
            id: id.to_string(),
        })
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            CalendarError::ValidationFailed(_) => "validation_failed",
            CalendarError::NotFound(_) => "not_found",
            CalendarError::AlreadyExists => "already_exists",
            CalendarError::StorageUnavailable { .. } => "storage_unavailable",
        }
    }
}

impl From<ValidationErrors> for CalendarError {
    fn from(errors: ValidationErrors) -> Self {
        CalendarError::ValidationFailed(errors)
    }
}

/// What a `NotFound` refers to: the calendar itself, or one event in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFound {
    Calendar,
    Event { partition: PartitionKey, id: String },
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NotFound::Calendar => write!(f, "Calendar not found"),
            NotFound::Event { partition, id } => {
                write!(f, "Event not found in {}: {}", partition, id)
            }
        }
    }
}

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field rejected by validation, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Prefix every field message, used when validating nested payloads
    pub(crate) fn extend_prefixed(&mut self, prefix: &str, other: ValidationErrors) {
        self.0.extend(other.0.into_iter().map(|e| FieldError {
            field: e.field,
            message: format!("{prefix}: {}", e.message),
        }));
    }

    pub(crate) fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Result type alias for calendar operations.
pub type CalendarResult<T> = Result<T, CalendarError>;
