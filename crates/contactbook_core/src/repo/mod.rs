//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the contact book data access contract.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Read paths validate every row through the model constructors.
//! - Malformed files surface as `RepoError::InvalidData`, never as an
//!   empty book.

pub mod book_repo;
