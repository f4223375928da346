//! In-memory entity store and its invertible mutations.
//!
//! # Responsibility
//! - Hold the canonical person/event collections and the participation
//!   relation between them.
//! - Expose every write as a `Mutation` whose application yields its own
//!   inverse, so callers can undo without re-deriving prior state.
//!
//! # Invariants
//! - No two persons (or events) share an identity key.
//! - Every participant id in the relation table names a live person.
//! - A failed operation leaves the store unchanged.

use crate::model::validation::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod entity_store;
mod mutation;
mod snapshot;
mod unique_list;

pub use entity_store::{EntityStore, EventId, PersonId, StoreContents};
pub use mutation::{Mutation, ParticipationLink, RemovedEvent, RemovedPerson};
pub use snapshot::{BookSnapshot, EventEntry};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of a store operation. All variants are user-level errors; the
/// store is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Validation(ValidationError),
    DuplicatePerson(String),
    PersonNotFound(String),
    DuplicateEvent(String),
    EventNotFound(String),
    AlreadyParticipating { person: String, event: String },
    NotParticipating { person: String, event: String },
    DanglingParticipant { person: String, event: String },
    InvalidPosition { position: usize, len: usize },
    InvalidOrder,
    /// The relation table does not hold exactly one entry per event.
    RelationMismatch { events: usize, relations: usize },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicatePerson(name) => {
                write!(f, "this person already exists in the address book: {name}")
            }
            Self::PersonNotFound(name) => write!(f, "person not found: {name}"),
            Self::DuplicateEvent(key) => {
                write!(f, "this event already exists in the event list: {key}")
            }
            Self::EventNotFound(key) => write!(f, "event not found: {key}"),
            Self::AlreadyParticipating { person, event } => {
                write!(f, "{person} already participates in {event}")
            }
            Self::NotParticipating { person, event } => {
                write!(f, "{person} does not participate in {event}")
            }
            Self::DanglingParticipant { person, event } => {
                write!(f, "event {event} references unknown person {person}")
            }
            Self::InvalidPosition { position, len } => {
                write!(f, "position {position} is out of range for length {len}")
            }
            Self::InvalidOrder => write!(f, "event order is not a permutation of the event list"),
            Self::RelationMismatch { events, relations } => write!(
                f,
                "participation table has {relations} entries for {events} events"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
