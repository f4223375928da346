//! Reversible units of work over the entity store.
//!
//! # Responsibility
//! - Define the closed set of user-level commands.
//! - Execute a command into an [`ExecutedCommand`] that carries its own
//!   undo plan.
//!
//! # Invariants
//! - `Command::execute` consumes the command, so a command cannot be
//!   applied twice without an intervening undo.
//! - A failed execute leaves the store unchanged and produces nothing to
//!   record in history.
//! - `ExecutedCommand::undo` restores the exact pre-execute store,
//!   participation links and ordering included.

use crate::model::event::{Event, EventKey};
use crate::model::person::Person;
use crate::model::tag::Tag;
use crate::store::{EntityStore, Mutation, StoreError, StoreResult};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CommandResult<T> = Result<T, CommandError>;

/// User-facing command failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Store(StoreError),
    /// `RemoveTag` found no person carrying the tag.
    TagNotInUse(String),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::TagNotInUse(tag) => write!(f, "no person is tagged with `{tag}`"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::TagNotInUse(_) => None,
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Fully validated command, as produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddPerson(Person),
    DeletePerson { name: String },
    EditPerson { target: String, edited: Person },
    ClearAll,
    AddEvent(Event),
    DeleteEvent { key: EventKey },
    EditEvent { target: EventKey, edited: Event },
    AddParticipant { person: String, event: EventKey },
    RemoveParticipant { person: String, event: EventKey },
    SortEvents,
    /// Strips one tag from every person carrying it.
    RemoveTag { tag: Tag },
}

impl Command {
    /// Stable command word, also used as the log label.
    pub fn word(&self) -> &'static str {
        match self {
            Self::AddPerson(_) => "add",
            Self::DeletePerson { .. } => "delete",
            Self::EditPerson { .. } => "edit",
            Self::ClearAll => "clear",
            Self::AddEvent(_) => "eventadd",
            Self::DeleteEvent { .. } => "eventdelete",
            Self::EditEvent { .. } => "eventedit",
            Self::AddParticipant { .. } => "join",
            Self::RemoveParticipant { .. } => "leave",
            Self::SortEvents => "sortevents",
            Self::RemoveTag { .. } => "untag",
        }
    }

    /// One-line description for history listings.
    pub fn describe(&self) -> String {
        match self {
            Self::AddPerson(person) => format!("add person {}", person.name),
            Self::DeletePerson { name } => format!("delete person {name}"),
            Self::EditPerson { target, edited } => {
                format!("edit person {target} -> {}", edited.name)
            }
            Self::ClearAll => "clear all".to_string(),
            Self::AddEvent(event) => format!("add event {}", event.key()),
            Self::DeleteEvent { key } => format!("delete event {key}"),
            Self::EditEvent { target, edited } => {
                format!("edit event {target} -> {}", edited.key())
            }
            Self::AddParticipant { person, event } => format!("{person} joins {event}"),
            Self::RemoveParticipant { person, event } => format!("{person} leaves {event}"),
            Self::SortEvents => "sort events".to_string(),
            Self::RemoveTag { tag } => format!("remove tag {tag}"),
        }
    }

    /// Applies the forward mutation.
    ///
    /// # Errors
    /// - Any `StoreError` raised by the forward mutation; the store is left
    ///   unchanged.
    pub fn execute(self, store: &mut EntityStore) -> CommandResult<ExecutedCommand> {
        let (undo_plan, feedback) = match &self {
            Self::AddPerson(person) => {
                let inverse = store.add_person(person.clone())?;
                (vec![inverse], format!("New person added: {person}"))
            }
            Self::DeletePerson { name } => {
                let deleted = store
                    .person(name)
                    .cloned()
                    .ok_or_else(|| StoreError::PersonNotFound(name.clone()))?;
                let inverse = store.remove_person(name)?;
                (vec![inverse], format!("Deleted Person: {deleted}"))
            }
            Self::EditPerson { target, edited } => {
                let inverse = store.update_person(target, edited.clone())?;
                (vec![inverse], format!("Edited Person: {edited}"))
            }
            Self::ClearAll => (
                vec![store.clear()],
                "Address book has been cleared!".to_string(),
            ),
            Self::AddEvent(event) => {
                let inverse = store.add_event(event.clone())?;
                (vec![inverse], format!("New event added: {event}"))
            }
            Self::DeleteEvent { key } => {
                let deleted = store
                    .event(key)
                    .cloned()
                    .ok_or_else(|| StoreError::EventNotFound(key.to_string()))?;
                let inverse = store.remove_event(key)?;
                (vec![inverse], format!("Deleted Event: {deleted}"))
            }
            Self::EditEvent { target, edited } => {
                let inverse = store.update_event(target, edited.clone())?;
                (vec![inverse], format!("Edited Event: {edited}"))
            }
            Self::AddParticipant { person, event } => {
                let inverse = store.add_participant(person, event)?;
                (vec![inverse], format!("{person} now participates in {event}"))
            }
            Self::RemoveParticipant { person, event } => {
                let inverse = store.remove_participant(person, event)?;
                (
                    vec![inverse],
                    format!("{person} no longer participates in {event}"),
                )
            }
            Self::SortEvents => (vec![store.sort_events()], "Events sorted.".to_string()),
            Self::RemoveTag { tag } => {
                let undo_plan = remove_tag(store, tag)?;
                (undo_plan, format!("Removed tag {tag} from all persons."))
            }
        };

        Ok(ExecutedCommand {
            command: self,
            undo_plan,
            feedback,
        })
    }
}

fn remove_tag(store: &mut EntityStore, tag: &Tag) -> CommandResult<Vec<Mutation>> {
    let edits: Vec<Mutation> = store
        .persons()
        .filter(|person| person.has_tag(tag))
        .filter_map(|person| {
            let id = store.person_id(&person.name)?;
            let mut edited = person.clone();
            edited.tags.remove(tag);
            Some(Mutation::ReplacePerson {
                id,
                person: Box::new(edited),
            })
        })
        .collect();

    if edits.is_empty() {
        return Err(CommandError::TagNotInUse(tag.as_str().to_string()));
    }
    Ok(store.apply_batch(edits)?)
}

/// A command that has mutated the store, plus what it takes to revert it.
#[derive(Debug)]
pub struct ExecutedCommand {
    command: Command,
    undo_plan: Vec<Mutation>,
    feedback: String,
}

impl ExecutedCommand {
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Message shown to the user after a successful execute.
    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    /// Reverts the command and hands it back for a later redo.
    ///
    /// # Errors
    /// - A `StoreError` here means the store no longer matches the state the
    ///   plan was computed for. The store is left as it was before the call.
    pub fn undo(self, store: &mut EntityStore) -> StoreResult<Command> {
        store.apply_batch(self.undo_plan)?;
        Ok(self.command)
    }
}
