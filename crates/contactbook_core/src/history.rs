//! Linear undo/redo history.
//!
//! # Responsibility
//! - Own the `undoable` and `redoable` stacks for one store.
//! - Revert and replay commands through the store's mutation layer.
//!
//! # Invariants
//! - Only successfully executed commands enter `undoable`.
//! - Recording a new command clears `redoable`.
//! - A failed undo/redo is an integrity violation: the command is dropped,
//!   not pushed to the opposite stack.
//!
//! ```text
//! record(c1) record(c2) record(c3)   undoable [c1 c2 c3]  redoable []
//! undo() undo()                      undoable [c1]        redoable [c3 c2]
//! record(c4)                         undoable [c1 c4]     redoable []
//! ```

use crate::command::{Command, CommandError, ExecutedCommand};
use crate::store::EntityStore;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type HistoryResult<T> = Result<T, HistoryError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

impl HistoryDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

/// History failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// Nothing to undo/redo. User-facing.
    Empty(HistoryDirection),
    /// A previously successful command could not be reverted or replayed.
    /// Signals a bug in invariant maintenance, not bad input.
    IntegrityViolation {
        direction: HistoryDirection,
        command: String,
        source: CommandError,
    },
}

impl HistoryError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::IntegrityViolation { .. })
    }
}

impl Display for HistoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(HistoryDirection::Undo) => write!(f, "No more commands to undo!"),
            Self::Empty(HistoryDirection::Redo) => write!(f, "No more commands to redo!"),
            Self::IntegrityViolation {
                direction,
                command,
                source,
            } => write!(
                f,
                "internal error: {} of `{command}` failed: {source}",
                direction.as_str()
            ),
        }
    }
}

impl Error for HistoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Empty(_) => None,
            Self::IntegrityViolation { source, .. } => Some(source),
        }
    }
}

/// Undo/redo stacks (newest at the back).
#[derive(Debug, Default)]
pub struct History {
    undoable: Vec<ExecutedCommand>,
    redoable: Vec<Command>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a command whose execute already succeeded and discards the
    /// redo branch.
    pub fn record(&mut self, executed: ExecutedCommand) {
        if !self.redoable.is_empty() {
            info!(
                "event=history_truncate module=history status=ok discarded={}",
                self.redoable.len()
            );
        }
        self.redoable.clear();
        self.undoable.push(executed);
    }

    /// Reverts the most recent command.
    ///
    /// Returns the description of the reverted command.
    pub fn undo(&mut self, store: &mut EntityStore) -> HistoryResult<String> {
        let executed = self
            .undoable
            .pop()
            .ok_or(HistoryError::Empty(HistoryDirection::Undo))?;
        let description = executed.command().describe();

        match executed.undo(store) {
            Ok(command) => {
                self.redoable.push(command);
                info!(
                    "event=history_undo module=history status=ok undo_depth={} redo_depth={}",
                    self.undoable.len(),
                    self.redoable.len()
                );
                Ok(description)
            }
            Err(err) => Err(integrity_violation(
                HistoryDirection::Undo,
                description,
                err.into(),
            )),
        }
    }

    /// Replays the most recently undone command.
    ///
    /// Returns the command's execute feedback.
    pub fn redo(&mut self, store: &mut EntityStore) -> HistoryResult<String> {
        let command = self
            .redoable
            .pop()
            .ok_or(HistoryError::Empty(HistoryDirection::Redo))?;
        let description = command.describe();

        match command.execute(store) {
            Ok(executed) => {
                let feedback = executed.feedback().to_string();
                self.undoable.push(executed);
                info!(
                    "event=history_redo module=history status=ok undo_depth={} redo_depth={}",
                    self.undoable.len(),
                    self.redoable.len()
                );
                Ok(feedback)
            }
            Err(err) => Err(integrity_violation(
                HistoryDirection::Redo,
                description,
                err,
            )),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undoable.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redoable.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undoable.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redoable.len()
    }

    /// Descriptions of undoable commands, most recent first.
    pub fn undo_descriptions(&self, limit: usize) -> Vec<String> {
        self.undoable
            .iter()
            .rev()
            .take(limit)
            .map(|executed| executed.command().describe())
            .collect()
    }

    /// Descriptions of redoable commands, most recent first.
    pub fn redo_descriptions(&self, limit: usize) -> Vec<String> {
        self.redoable
            .iter()
            .rev()
            .take(limit)
            .map(Command::describe)
            .collect()
    }

    pub fn clear(&mut self) {
        self.undoable.clear();
        self.redoable.clear();
    }
}

fn integrity_violation(
    direction: HistoryDirection,
    command: String,
    source: CommandError,
) -> HistoryError {
    error!(
        "event=history_{} module=history status=fatal error_code=integrity_violation command=\"{}\" error={}",
        direction.as_str(),
        command,
        source
    );
    HistoryError::IntegrityViolation {
        direction,
        command,
        source,
    }
}
