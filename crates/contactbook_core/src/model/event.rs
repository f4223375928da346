//! Event domain record.
//!
//! # Responsibility
//! - Define the calendar-like record that links participants.
//!
//! # Invariants
//! - Identity is `(title, start_ms)`, title compared case-insensitively.
//! - `end_ms` should not be earlier than `start_ms` when set.
//! - Participants are not part of the record; the store keeps them in a
//!   separate relation table.

use crate::model::validation::{
    check_description, check_title, normalize_spaces, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EventWire")]
pub struct Event {
    pub title: String,
    pub description: String,
    /// Unix epoch milliseconds.
    pub start_ms: i64,
    /// Unix epoch milliseconds. Must be >= `start_ms` when set.
    pub end_ms: Option<i64>,
}

#[derive(Deserialize)]
struct EventWire {
    title: String,
    #[serde(default)]
    description: String,
    start_ms: i64,
    #[serde(default)]
    end_ms: Option<i64>,
}

impl TryFrom<EventWire> for Event {
    type Error = ValidationError;

    fn try_from(value: EventWire) -> Result<Self, Self::Error> {
        let event = Event {
            title: value.title,
            description: value.description,
            start_ms: value.start_ms,
            end_ms: value.end_ms,
        };
        event.validate()?;
        Ok(event)
    }
}

/// Identity key of an event as typed by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventKey {
    pub title: String,
    pub start_ms: i64,
}

impl EventKey {
    pub fn new(title: &str, start_ms: i64) -> Self {
        Self {
            title: normalize_spaces(title),
            start_ms,
        }
    }

    /// Case-folded, whitespace-collapsed form used by the store index.
    pub(crate) fn normalized(&self) -> (String, i64) {
        (normalize_spaces(&self.title).to_lowercase(), self.start_ms)
    }
}

impl Display for EventKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.title, self.start_ms)
    }
}

impl Event {
    /// Creates an event; point events pass `end_ms = None`.
    pub fn new(
        title: &str,
        description: &str,
        start_ms: i64,
        end_ms: Option<i64>,
    ) -> Result<Self, ValidationError> {
        let event = Self {
            title: normalize_spaces(title),
            description: description.trim().to_string(),
            start_ms,
            end_ms,
        };
        event.validate()?;
        Ok(event)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_title(&self.title)?;
        check_description(&self.description)?;
        if let Some(end) = self.end_ms {
            if end < self.start_ms {
                return Err(ValidationError::InvalidEventWindow {
                    start: self.start_ms,
                    end,
                });
            }
        }
        Ok(())
    }

    pub fn key(&self) -> EventKey {
        EventKey {
            title: self.title.clone(),
            start_ms: self.start_ms,
        }
    }

    pub fn is_same_event(&self, other: &Event) -> bool {
        self.key().normalized() == other.key().normalized()
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Start: {}", self.title, self.start_ms)?;
        if let Some(end) = self.end_ms {
            write!(f, " End: {end}")?;
        }
        if !self.description.is_empty() {
            write!(f, " Description: {}", self.description)?;
        }
        Ok(())
    }
}
