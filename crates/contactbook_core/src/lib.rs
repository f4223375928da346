//! Core domain logic for the contact book.
//! This crate owns every business invariant: identity uniqueness,
//! participation integrity and exact undo/redo.

pub mod command;
pub mod config;
pub mod db;
pub mod history;
pub mod logging;
pub mod model;
pub mod parser;
pub mod repo;
pub mod service;
pub mod store;

pub use command::{Command, CommandError, CommandResult, ExecutedCommand};
pub use config::{AppConfig, ConfigError};
pub use history::{History, HistoryDirection, HistoryError, HistoryResult};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::event::{Event, EventKey};
pub use model::person::Person;
pub use model::tag::Tag;
pub use model::validation::ValidationError;
pub use parser::{parse_instruction, Instruction, ParseError};
pub use repo::book_repo::{
    load_book, load_store, save_book, BookRepository, RepoError, RepoResult,
    SqliteBookRepository,
};
pub use service::book_service::{
    BookService, CommandOutcome, ServiceError, ServiceResult, StoreListener,
};
pub use store::{BookSnapshot, EntityStore, EventEntry, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
