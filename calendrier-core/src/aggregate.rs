//! The calendar aggregate: one document, three ordered partitions.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::event::{EventRecord, new_id};

/// Names one of the three partitions of the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionKey {
    S1,
    S2,
    General,
}

impl PartitionKey {
    pub const ALL: [PartitionKey; 3] = [PartitionKey::S1, PartitionKey::S2, PartitionKey::General];

    /// Path segment used by the HTTP routes
    pub fn route_segment(&self) -> &'static str {
        match self {
            PartitionKey::S1 => "S1",
            PartitionKey::S2 => "S2",
            PartitionKey::General => "evenement",
        }
    }

    /// Key inside the stored `semestres` object
    pub fn field_name(&self) -> &'static str {
        match self {
            PartitionKey::S1 => "S1",
            PartitionKey::S2 => "S2",
            PartitionKey::General => "evenements",
        }
    }
}

impl FromStr for PartitionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S1" => Ok(PartitionKey::S1),
            "S2" => Ok(PartitionKey::S2),
            "evenement" => Ok(PartitionKey::General),
            other => Err(format!("Unknown partition: '{}'", other)),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.field_name())
    }
}

/// The `semestres` object of the calendar document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semestres {
    #[serde(rename = "S1", default)]
    pub s1: Vec<EventRecord>,
    #[serde(rename = "S2", default)]
    pub s2: Vec<EventRecord>,
    #[serde(default)]
    pub evenements: Vec<EventRecord>,
}

/// The single calendar document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarAggregate {
    #[serde(rename = "_id")]
    pub id: String,
    pub semestres: Semestres,
}

impl CalendarAggregate {
    /// A calendar with a fresh id and three empty partitions
    pub fn empty() -> Self {
        CalendarAggregate {
            id: new_id(),
            semestres: Semestres::default(),
        }
    }

    pub fn partition(&self, key: PartitionKey) -> &[EventRecord] {
        match key {
            PartitionKey::S1 => &self.semestres.s1,
            PartitionKey::S2 => &self.semestres.s2,
            PartitionKey::General => &self.semestres.evenements,
        }
    }

    pub fn partition_mut(&mut self, key: PartitionKey) -> &mut Vec<EventRecord> {
        match key {
            PartitionKey::S1 => &mut self.semestres.s1,
            PartitionKey::S2 => &mut self.semestres.s2,
            PartitionKey::General => &mut self.semestres.evenements,
        }
    }

    /// First partition holding two records with the same id, if any
    pub fn duplicate_id(&self) -> Option<(PartitionKey, &str)> {
        PartitionKey::ALL
            .into_iter()
            .find_map(|key| duplicate_in(self.partition(key)).map(|id| (key, id)))
    }
}

/// First id that appears twice in `events`
pub(crate) fn duplicate_in(events: &[EventRecord]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(events.len());
    events
        .iter()
        .map(|e| e.id.as_str())
        .find(|id| !seen.insert(*id))
}
