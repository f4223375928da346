//! Domain records for the contact book.
//!
//! # Responsibility
//! - Define the canonical person/event/tag records held by the entity store.
//! - Own field-level validation so every layer sees the same rules.
//!
//! # Invariants
//! - A `Person` is identified by its name, compared case-insensitively.
//! - An `Event` is identified by `(title, start_ms)`, title compared
//!   case-insensitively.
//! - `event.end_ms` is never earlier than `event.start_ms`.

pub mod event;
pub mod person;
pub mod tag;
pub mod validation;
