//! Contact book use-case service.
//!
//! # Responsibility
//! - Own one entity store and its history; nothing else mutates them.
//! - Dispatch parsed instructions and notify store listeners.
//!
//! # Invariants
//! - Only commands whose execute succeeded are recorded.
//! - Listeners are notified once after every successful execute/undo/redo.
//! - Two services never share history.

use crate::command::{Command, CommandError};
use crate::history::{History, HistoryError};
use crate::parser::{parse_instruction, Instruction, ParseError};
use crate::store::{BookSnapshot, EntityStore};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::time::Instant;

const HISTORY_LISTING_LIMIT: usize = 10;

/// Observer of store changes, e.g. a list view.
pub trait StoreListener {
    fn on_store_changed(&mut self, store: &EntityStore);
}

/// Service error across parse, command and history layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    Parse(ParseError),
    Command(CommandError),
    History(HistoryError),
}

impl ServiceError {
    /// Whether this error signals broken store invariants rather than bad
    /// input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::History(err) if err.is_fatal())
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Command(err) => write!(f, "{err}"),
            Self::History(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Command(err) => Some(err),
            Self::History(err) => Some(err),
        }
    }
}

impl From<ParseError> for ServiceError {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

impl From<CommandError> for ServiceError {
    fn from(value: CommandError) -> Self {
        Self::Command(value)
    }
}

impl From<HistoryError> for ServiceError {
    fn from(value: HistoryError) -> Self {
        Self::History(value)
    }
}

/// Result of one dispatched instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Message for the user.
    pub feedback: String,
    /// Whether the store changed (callers persist on `true`).
    pub mutated: bool,
    /// Whether the user asked to leave.
    pub exit: bool,
}

impl CommandOutcome {
    fn mutated(feedback: impl Into<String>) -> Self {
        Self {
            feedback: feedback.into(),
            mutated: true,
            exit: false,
        }
    }

    fn read_only(feedback: impl Into<String>) -> Self {
        Self {
            feedback: feedback.into(),
            mutated: false,
            exit: false,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Command dispatcher over one store and one history.
pub struct BookService {
    store: EntityStore,
    history: History,
    listeners: Vec<Box<dyn StoreListener>>,
}

impl Debug for BookService {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookService")
            .field("persons", &self.store.person_count())
            .field("events", &self.store.event_count())
            .field("undo_depth", &self.history.undo_depth())
            .field("redo_depth", &self.history.redo_depth())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl BookService {
    /// Creates a service over an existing store with empty history.
    pub fn new(store: EntityStore) -> Self {
        Self {
            store,
            history: History::new(),
            listeners: Vec::new(),
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Owned copy for persistence.
    pub fn snapshot(&self) -> BookSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&mut self, listener: Box<dyn StoreListener>) {
        self.listeners.push(listener);
    }

    /// Executes a command and records it on success.
    pub fn execute(&mut self, command: Command) -> ServiceResult<CommandOutcome> {
        let started_at = Instant::now();
        let word = command.word();
        match command.execute(&mut self.store) {
            Ok(executed) => {
                let feedback = executed.feedback().to_string();
                self.history.record(executed);
                info!(
                    "event=command_execute module=service status=ok command={} duration_ms={}",
                    word,
                    started_at.elapsed().as_millis()
                );
                self.notify();
                Ok(CommandOutcome::mutated(feedback))
            }
            Err(err) => {
                warn!(
                    "event=command_execute module=service status=error command={} error={}",
                    word, err
                );
                Err(err.into())
            }
        }
    }

    pub fn undo(&mut self) -> ServiceResult<CommandOutcome> {
        let result = self.history.undo(&mut self.store);
        self.finish_history_step("undo", result)
            .map(|description| CommandOutcome::mutated(format!("Undo success: {description}")))
    }

    pub fn redo(&mut self) -> ServiceResult<CommandOutcome> {
        let result = self.history.redo(&mut self.store);
        self.finish_history_step("redo", result)
            .map(|feedback| CommandOutcome::mutated(format!("Redo success: {feedback}")))
    }

    pub fn dispatch(&mut self, instruction: Instruction) -> ServiceResult<CommandOutcome> {
        match instruction {
            Instruction::Execute(command) => self.execute(command),
            Instruction::Undo => self.undo(),
            Instruction::Redo => self.redo(),
            Instruction::List => Ok(CommandOutcome::read_only(self.render_listing())),
            Instruction::History => Ok(CommandOutcome::read_only(self.render_history())),
            Instruction::Exit => Ok(CommandOutcome {
                feedback: "Exiting contact book as requested ...".to_string(),
                mutated: false,
                exit: true,
            }),
        }
    }

    /// Parses and dispatches one input line.
    pub fn execute_line(&mut self, input: &str) -> ServiceResult<CommandOutcome> {
        let instruction = parse_instruction(input, &self.store).map_err(|err| {
            warn!(
                "event=command_parse module=service status=error usage=\"{}\"",
                err.usage
            );
            ServiceError::from(err)
        })?;
        self.dispatch(instruction)
    }

    fn finish_history_step(
        &mut self,
        action: &'static str,
        result: Result<String, HistoryError>,
    ) -> ServiceResult<String> {
        match result {
            Ok(message) => {
                self.notify();
                Ok(message)
            }
            Err(err) => {
                // Integrity violations are already logged at `error` by history.
                if !err.is_fatal() {
                    info!(
                        "event=command_{} module=service status=error error={}",
                        action, err
                    );
                }
                Err(err.into())
            }
        }
    }

    fn notify(&mut self) {
        for listener in &mut self.listeners {
            listener.on_store_changed(&self.store);
        }
    }

    fn render_listing(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("Persons ({}):", self.store.person_count()));
        for (index, person) in self.store.persons().enumerate() {
            lines.push(format!("  {}. {person}", index + 1));
        }
        lines.push(format!("Events ({}):", self.store.event_count()));
        for (index, event) in self.store.events().enumerate() {
            let participants = self
                .store
                .participants_of(&event.key())
                .map(|persons| {
                    persons
                        .iter()
                        .map(|person| person.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            lines.push(format!("  {}. {event} Participants: [{participants}]", index + 1));
        }
        lines.join("\n")
    }

    fn render_history(&self) -> String {
        let undo = self.history.undo_descriptions(HISTORY_LISTING_LIMIT);
        let redo = self.history.redo_descriptions(HISTORY_LISTING_LIMIT);
        format!(
            "Undoable ({}): {}\nRedoable ({}): {}",
            self.history.undo_depth(),
            undo.join("; "),
            self.history.redo_depth(),
            redo.join("; ")
        )
    }
}
