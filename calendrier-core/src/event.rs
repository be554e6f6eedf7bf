//! Calendar entry types.
//!
//! `EventRecord` is what the store holds. `EventDraft` and `EventPatch` are
//! the unvalidated shapes callers hand in; `crate::validation` turns them into
//! `NewEvent` and `ValidatedPatch`, which are the only inputs the store accepts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One calendar entry as stored in a partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub date: EventDate,
    pub titre: String,
    pub description: String,
}

/// When an entry happens: either a whole day or a precise instant.
///
/// Serialized as a string in the shape it was given: `YYYY-MM-DD` for days,
/// RFC 3339 UTC for instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EventDate {
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl FromStr for EventDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("date is empty".to_string());
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(EventDate::Date(date));
        }

        DateTime::parse_from_rfc3339(s)
            .map(|dt| EventDate::DateTime(dt.with_timezone(&Utc)))
            .map_err(|_| format!("'{}' is not a valid date (expected YYYY-MM-DD or RFC 3339)", s))
    }
}

impl TryFrom<String> for EventDate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EventDate> for String {
    fn from(date: EventDate) -> Self {
        date.to_string()
    }
}

impl fmt::Display for EventDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventDate::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventDate::DateTime(dt) => {
                write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
        }
    }
}

/// Unvalidated input for a new entry (`POST /{partition}` body)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDraft {
    pub date: Option<String>,
    pub titre: Option<String>,
    pub description: Option<String>,
}

impl EventDraft {
    pub fn new(date: &str, titre: &str, description: &str) -> Self {
        EventDraft {
            date: Some(date.to_string()),
            titre: Some(titre.to_string()),
            description: Some(description.to_string()),
        }
    }
}

/// Unvalidated partial update (`PUT /{partition}/{id}` body).
/// Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventPatch {
    pub date: Option<String>,
    pub titre: Option<String>,
    pub description: Option<String>,
}

/// A draft that passed validation, still without an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub date: EventDate,
    pub titre: String,
    pub description: String,
}

impl NewEvent {
    pub fn into_record(self, id: String) -> EventRecord {
        EventRecord {
            id,
            date: self.date,
            titre: self.titre,
            description: self.description,
        }
    }
}

/// A patch whose supplied fields all passed validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedPatch {
    pub date: Option<EventDate>,
    pub titre: Option<String>,
    pub description: Option<String>,
}

impl ValidatedPatch {
    /// Overwrite the supplied fields on `record`. The id is never touched.
    pub fn apply(&self, record: &mut EventRecord) {
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(titre) = &self.titre {
            record.titre = titre.clone();
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
    }
}

/// Fresh globally-unique identifier for events and the aggregate
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
