//! Owned, read-only copy of store contents.
//!
//! Snapshots are what persistence serializes and what store equality
//! compares. Participants are recorded by person name (the identity key),
//! never by slot id.

use crate::model::event::Event;
use crate::model::person::Person;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Persons in display order.
    pub persons: Vec<Person>,
    /// Events in display order.
    pub events: Vec<EventEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEntry {
    pub event: Event,
    /// Participant names in join order.
    pub participants: Vec<String>,
}

impl BookSnapshot {
    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.events.is_empty()
    }
}
