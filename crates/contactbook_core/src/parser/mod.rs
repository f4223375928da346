//! Text command language.
//!
//! # Responsibility
//! - Turn one input line into a fully validated [`Instruction`].
//! - Resolve 1-based display indexes to identity keys against the store, so
//!   commands never carry positions.
//!
//! # Invariants
//! - A returned `Command` passed record validation; the core never sees a
//!   partially constructed command.

mod tokenizer;

use crate::command::Command;
use crate::model::event::{Event, EventKey};
use crate::model::person::Person;
use crate::model::tag::{parse_tags, Tag};
use crate::model::validation::ValidationError;
use crate::store::EntityStore;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokenizer::{
    tokenize, ArgumentMultimap, PREFIX_ADDRESS, PREFIX_DESCRIPTION, PREFIX_EMAIL, PREFIX_FINISH,
    PREFIX_NAME, PREFIX_PHONE, PREFIX_PORTRAIT, PREFIX_START, PREFIX_TAG,
};

pub const USAGE_ADD: &str =
    "add: Adds a person. Parameters: n/NAME p/PHONE e/EMAIL a/ADDRESS [pt/PORTRAIT] [t/TAG]...";
pub const USAGE_DELETE: &str = "delete: Deletes the person at INDEX. Parameters: INDEX";
pub const USAGE_EDIT: &str =
    "edit: Edits the person at INDEX. Parameters: INDEX [n/NAME] [p/PHONE] [e/EMAIL] [a/ADDRESS] [t/TAG]...";
pub const USAGE_PORTRAIT: &str =
    "portrait: Sets the portrait of the person at INDEX. Parameters: INDEX pt/PATH";
pub const USAGE_CLEAR: &str = "clear: Clears all persons and events.";
pub const USAGE_UNTAG: &str = "untag: Removes TAG from every person. Parameters: TAG";
pub const USAGE_EVENT_ADD: &str =
    "eventadd: Adds an event. Parameters: n/TITLE s/START_MS [f/END_MS] [d/DESCRIPTION]";
pub const USAGE_EVENT_DELETE: &str =
    "eventdelete: Deletes the event at INDEX. Parameters: INDEX";
pub const USAGE_EVENT_EDIT: &str =
    "eventedit: Edits the event at INDEX. Parameters: INDEX [n/TITLE] [s/START_MS] [f/END_MS] [d/DESCRIPTION]";
pub const USAGE_JOIN: &str =
    "join: Adds a person to an event. Parameters: PERSON_INDEX EVENT_INDEX";
pub const USAGE_LEAVE: &str =
    "leave: Removes a person from an event. Parameters: PERSON_INDEX EVENT_INDEX";
pub const USAGE_SORT_EVENTS: &str = "sortevents: Sorts events by start time.";
pub const USAGE_GENERAL: &str = "Commands: add delete edit portrait clear untag eventadd eventdelete eventedit join leave sortevents undo redo list history exit";

/// Parsed user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Execute(Command),
    Undo,
    Redo,
    List,
    History,
    Exit,
}

/// Input rejected by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Usage message for the command being parsed.
    pub usage: &'static str,
    pub detail: String,
}

impl ParseError {
    fn new(usage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            usage,
            detail: detail.into(),
        }
    }

    fn invalid(usage: &'static str, err: ValidationError) -> Self {
        Self::new(usage, err.to_string())
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid command format! {}\n{}", self.detail, self.usage)
    }
}

impl Error for ParseError {}

type ParseResult<T> = Result<T, ParseError>;

/// Parses one line against the current store contents.
pub fn parse_instruction(input: &str, store: &EntityStore) -> ParseResult<Instruction> {
    let trimmed = input.trim();
    let (word, args) = match trimmed.find(char::is_whitespace) {
        Some(split) => (&trimmed[..split], &trimmed[split..]),
        None => (trimmed, ""),
    };

    let command = match word {
        "add" => parse_add(args)?,
        "delete" => Command::DeletePerson {
            name: person_at(store, args, USAGE_DELETE)?.name.clone(),
        },
        "edit" => parse_edit(args, store)?,
        "portrait" => parse_portrait(args, store)?,
        "clear" => no_args(args, Command::ClearAll, USAGE_CLEAR)?,
        "untag" => Command::RemoveTag {
            tag: Tag::new(args).map_err(|err| ParseError::invalid(USAGE_UNTAG, err))?,
        },
        "eventadd" => parse_event_add(args)?,
        "eventdelete" => Command::DeleteEvent {
            key: event_at(store, args, USAGE_EVENT_DELETE)?.key(),
        },
        "eventedit" => parse_event_edit(args, store)?,
        "join" => {
            let (person, event) = parse_link(args, store, USAGE_JOIN)?;
            Command::AddParticipant { person, event }
        }
        "leave" => {
            let (person, event) = parse_link(args, store, USAGE_LEAVE)?;
            Command::RemoveParticipant { person, event }
        }
        "sortevents" => no_args(args, Command::SortEvents, USAGE_SORT_EVENTS)?,
        "undo" => return Ok(Instruction::Undo),
        "redo" => return Ok(Instruction::Redo),
        "list" => return Ok(Instruction::List),
        "history" => return Ok(Instruction::History),
        "exit" => return Ok(Instruction::Exit),
        "" => return Err(ParseError::new(USAGE_GENERAL, "empty input")),
        other => {
            return Err(ParseError::new(
                USAGE_GENERAL,
                format!("unknown command `{other}`"),
            ))
        }
    };
    Ok(Instruction::Execute(command))
}

fn parse_add(args: &str) -> ParseResult<Command> {
    let map = tokenize(
        args,
        &[
            PREFIX_NAME,
            PREFIX_PHONE,
            PREFIX_EMAIL,
            PREFIX_ADDRESS,
            PREFIX_PORTRAIT,
            PREFIX_TAG,
        ],
    );
    if !map.preamble().is_empty() {
        return Err(ParseError::new(USAGE_ADD, "unexpected preamble"));
    }
    let name = required(&map, PREFIX_NAME, USAGE_ADD)?;
    let phone = required(&map, PREFIX_PHONE, USAGE_ADD)?;
    let email = required(&map, PREFIX_EMAIL, USAGE_ADD)?;
    let address = required(&map, PREFIX_ADDRESS, USAGE_ADD)?;

    let tags = parse_tags(map.all_values(PREFIX_TAG))
        .map_err(|err| ParseError::invalid(USAGE_ADD, err))?;
    let person = Person::new(name, phone, email, address)
        .and_then(|person| person.with_portrait(map.value(PREFIX_PORTRAIT)))
        .map_err(|err| ParseError::invalid(USAGE_ADD, err))?
        .with_tags(tags);
    Ok(Command::AddPerson(person))
}

fn parse_edit(args: &str, store: &EntityStore) -> ParseResult<Command> {
    let map = tokenize(
        args,
        &[
            PREFIX_NAME,
            PREFIX_PHONE,
            PREFIX_EMAIL,
            PREFIX_ADDRESS,
            PREFIX_TAG,
        ],
    );
    let target = person_at(store, map.preamble(), USAGE_EDIT)?;
    let touched = [
        PREFIX_NAME,
        PREFIX_PHONE,
        PREFIX_EMAIL,
        PREFIX_ADDRESS,
        PREFIX_TAG,
    ]
    .iter()
    .any(|prefix| map.has(prefix));
    if !touched {
        return Err(ParseError::new(
            USAGE_EDIT,
            "at least one field to edit must be provided",
        ));
    }

    let name = map.value(PREFIX_NAME).unwrap_or(&target.name);
    let phone = map.value(PREFIX_PHONE).unwrap_or(&target.phone);
    let email = map.value(PREFIX_EMAIL).unwrap_or(&target.email);
    let address = map.value(PREFIX_ADDRESS).unwrap_or(&target.address);
    // A lone empty `t/` clears every tag.
    let tags = if map.has(PREFIX_TAG) {
        let values: Vec<&String> = map
            .all_values(PREFIX_TAG)
            .iter()
            .filter(|value| !value.is_empty())
            .collect();
        parse_tags(values).map_err(|err| ParseError::invalid(USAGE_EDIT, err))?
    } else {
        target.tags.clone()
    };

    let edited = Person::new(name, phone, email, address)
        .and_then(|person| person.with_portrait(target.portrait.as_deref()))
        .map_err(|err| ParseError::invalid(USAGE_EDIT, err))?
        .with_tags(tags);
    Ok(Command::EditPerson {
        target: target.name.clone(),
        edited,
    })
}

fn parse_portrait(args: &str, store: &EntityStore) -> ParseResult<Command> {
    let map = tokenize(args, &[PREFIX_PORTRAIT]);
    let target = person_at(store, map.preamble(), USAGE_PORTRAIT)?;
    let path = map
        .value(PREFIX_PORTRAIT)
        .ok_or_else(|| ParseError::new(USAGE_PORTRAIT, "missing pt/ prefix"))?;
    let edited = target
        .clone()
        .with_portrait(Some(path))
        .map_err(|err| ParseError::invalid(USAGE_PORTRAIT, err))?;
    Ok(Command::EditPerson {
        target: target.name.clone(),
        edited,
    })
}

fn parse_event_add(args: &str) -> ParseResult<Command> {
    let map = tokenize(
        args,
        &[PREFIX_NAME, PREFIX_DESCRIPTION, PREFIX_START, PREFIX_FINISH],
    );
    if !map.preamble().is_empty() {
        return Err(ParseError::new(USAGE_EVENT_ADD, "unexpected preamble"));
    }
    let title = required(&map, PREFIX_NAME, USAGE_EVENT_ADD)?;
    let start = parse_millis(required(&map, PREFIX_START, USAGE_EVENT_ADD)?, USAGE_EVENT_ADD)?;
    let end = map
        .value(PREFIX_FINISH)
        .map(|value| parse_millis(value, USAGE_EVENT_ADD))
        .transpose()?;
    let description = map.value(PREFIX_DESCRIPTION).unwrap_or("");

    let event = Event::new(title, description, start, end)
        .map_err(|err| ParseError::invalid(USAGE_EVENT_ADD, err))?;
    Ok(Command::AddEvent(event))
}

fn parse_event_edit(args: &str, store: &EntityStore) -> ParseResult<Command> {
    let map = tokenize(
        args,
        &[PREFIX_NAME, PREFIX_DESCRIPTION, PREFIX_START, PREFIX_FINISH],
    );
    let target = event_at(store, map.preamble(), USAGE_EVENT_EDIT)?;
    let touched = [PREFIX_NAME, PREFIX_DESCRIPTION, PREFIX_START, PREFIX_FINISH]
        .iter()
        .any(|prefix| map.has(prefix));
    if !touched {
        return Err(ParseError::new(
            USAGE_EVENT_EDIT,
            "at least one field to edit must be provided",
        ));
    }

    let title = map.value(PREFIX_NAME).unwrap_or(&target.title);
    let description = map
        .value(PREFIX_DESCRIPTION)
        .unwrap_or(&target.description);
    let start = match map.value(PREFIX_START) {
        Some(value) => parse_millis(value, USAGE_EVENT_EDIT)?,
        None => target.start_ms,
    };
    // An empty `f/` turns the event into a point event.
    let end = match map.value(PREFIX_FINISH) {
        Some("") => None,
        Some(value) => Some(parse_millis(value, USAGE_EVENT_EDIT)?),
        None => target.end_ms,
    };

    let edited = Event::new(title, description, start, end)
        .map_err(|err| ParseError::invalid(USAGE_EVENT_EDIT, err))?;
    Ok(Command::EditEvent {
        target: target.key(),
        edited,
    })
}

fn parse_link(
    args: &str,
    store: &EntityStore,
    usage: &'static str,
) -> ParseResult<(String, EventKey)> {
    let mut parts = args.split_whitespace();
    let (Some(person_index), Some(event_index), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::new(
            usage,
            "expected PERSON_INDEX and EVENT_INDEX",
        ));
    };
    let person = person_at(store, person_index, usage)?;
    let event = event_at(store, event_index, usage)?;
    Ok((person.name.clone(), event.key()))
}

fn no_args(args: &str, command: Command, usage: &'static str) -> ParseResult<Command> {
    if args.trim().is_empty() {
        Ok(command)
    } else {
        Err(ParseError::new(usage, "this command takes no arguments"))
    }
}

fn required<'a>(
    map: &'a ArgumentMultimap,
    prefix: &str,
    usage: &'static str,
) -> ParseResult<&'a str> {
    map.value(prefix)
        .ok_or_else(|| ParseError::new(usage, format!("missing {prefix}/ prefix")))
}

/// Parses a 1-based index into a zero-based position.
fn parse_index(value: &str, usage: &'static str) -> ParseResult<usize> {
    match value.trim().parse::<usize>() {
        Ok(index) if index > 0 => Ok(index - 1),
        _ => Err(ParseError::new(
            usage,
            format!("index `{}` is not a positive integer", value.trim()),
        )),
    }
}

fn parse_millis(value: &str, usage: &'static str) -> ParseResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ParseError::new(usage, format!("`{value}` is not an epoch-millisecond value")))
}

fn person_at<'s>(
    store: &'s EntityStore,
    value: &str,
    usage: &'static str,
) -> ParseResult<&'s Person> {
    let position = parse_index(value, usage)?;
    store
        .person_at(position)
        .ok_or_else(|| ParseError::new(usage, "The person index provided is invalid"))
}

fn event_at<'s>(
    store: &'s EntityStore,
    value: &str,
    usage: &'static str,
) -> ParseResult<&'s Event> {
    let position = parse_index(value, usage)?;
    store
        .event_at(position)
        .ok_or_else(|| ParseError::new(usage, "The event index provided is invalid"))
}
