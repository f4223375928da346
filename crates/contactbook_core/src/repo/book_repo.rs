//! Contact book repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist a whole `BookSnapshot` (persons, events, participation) and
//!   load it back in the same display order.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `save` replaces the stored book atomically.
//! - `load` rejects invalid persisted state instead of masking it.

use crate::db::{open_db, open_existing_db, DbError};
use crate::model::event::Event;
use crate::model::person::{person_key, Person};
use crate::model::tag::Tag;
use crate::model::validation::ValidationError;
use crate::store::{BookSnapshot, EntityStore, EventEntry};
use log::{error, info};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for book persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted book data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        if value.is_malformed_file() {
            return Self::InvalidData(value.to_string());
        }
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(DbError::Sqlite(value))
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

/// Storage contract for whole-book persistence.
pub trait BookRepository {
    fn load(&self) -> RepoResult<BookSnapshot>;
    fn save(&self, snapshot: &BookSnapshot) -> RepoResult<()>;
}

/// SQLite-backed book repository bound to one migrated connection.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn load(&self) -> RepoResult<BookSnapshot> {
        let mut tags_by_person: HashMap<String, BTreeSet<Tag>> = HashMap::new();
        {
            let mut stmt = self
                .conn
                .prepare("SELECT person_key, tag FROM person_tags ORDER BY person_key, tag")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (key, tag) = row?;
                tags_by_person
                    .entry(key)
                    .or_default()
                    .insert(Tag::new(&tag)?);
            }
        }

        let mut persons = Vec::new();
        let mut names_by_key = HashMap::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT name, name_key, phone, email, address, portrait
                 FROM persons ORDER BY position",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            })?;
            for row in rows {
                let (name, key, phone, email, address, portrait) = row?;
                if person_key(&name) != key {
                    return Err(RepoError::InvalidData(format!(
                        "persons.name_key `{key}` does not match name `{name}`"
                    )));
                }
                let tags = tags_by_person.remove(&key).unwrap_or_default();
                let person = Person::new(&name, &phone, &email, &address)?
                    .with_portrait(portrait.as_deref())?
                    .with_tags(tags);
                names_by_key.insert(key, person.name.clone());
                persons.push(person);
            }
        }
        if let Some(key) = tags_by_person.keys().next() {
            return Err(RepoError::InvalidData(format!(
                "person_tags references unknown person `{key}`"
            )));
        }

        let mut events = Vec::new();
        let mut stmt = self.conn.prepare(
            "SELECT position, title, description, start_ms, end_ms
             FROM events ORDER BY position",
        )?;
        let mut participant_stmt = self.conn.prepare(
            "SELECT person_key FROM event_participants
             WHERE event_position = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<i64>>(4)?,
            ))
        })?;
        for row in rows {
            let (position, title, description, start_ms, end_ms) = row?;
            let event = Event::new(&title, &description, start_ms, end_ms)?;
            let keys = participant_stmt
                .query_map([position], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            let participants = keys
                .into_iter()
                .map(|key| {
                    names_by_key.get(&key).cloned().ok_or_else(|| {
                        RepoError::InvalidData(format!(
                            "event `{}` lists unknown participant `{key}`",
                            event.key()
                        ))
                    })
                })
                .collect::<RepoResult<Vec<_>>>()?;
            events.push(EventEntry {
                event,
                participants,
            });
        }

        Ok(BookSnapshot { persons, events })
    }

    fn save(&self, snapshot: &BookSnapshot) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute_batch(
            "DELETE FROM event_participants;
             DELETE FROM events;
             DELETE FROM person_tags;
             DELETE FROM persons;",
        )?;

        for (position, person) in snapshot.persons.iter().enumerate() {
            let key = person.identity_key();
            tx.execute(
                "INSERT INTO persons (position, name, name_key, phone, email, address, portrait)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    position as i64,
                    person.name,
                    key,
                    person.phone,
                    person.email,
                    person.address,
                    person.portrait,
                ],
            )?;
            for tag in &person.tags {
                tx.execute(
                    "INSERT INTO person_tags (person_key, tag) VALUES (?1, ?2)",
                    params![key, tag.as_str()],
                )?;
            }
        }

        for (position, entry) in snapshot.events.iter().enumerate() {
            let event = &entry.event;
            let (title_key, _) = event.key().normalized();
            tx.execute(
                "INSERT INTO events (position, title, title_key, description, start_ms, end_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    position as i64,
                    event.title,
                    title_key,
                    event.description,
                    event.start_ms,
                    event.end_ms,
                ],
            )?;
            for (slot, name) in entry.participants.iter().enumerate() {
                tx.execute(
                    "INSERT INTO event_participants (event_position, person_key, position)
                     VALUES (?1, ?2, ?3)",
                    params![position as i64, person_key(name), slot as i64],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

/// Loads the book stored at `path`.
///
/// Returns `Ok(None)` when no file exists yet.
///
/// # Errors
/// - `RepoError::InvalidData` when the file is not a contact book database
///   or holds values the model rejects.
pub fn load_book(path: impl AsRef<Path>) -> RepoResult<Option<BookSnapshot>> {
    let path = path.as_ref();
    if !path.exists() {
        info!(
            "event=book_load module=repo status=ok found=false path={}",
            path.display()
        );
        return Ok(None);
    }

    let started_at = Instant::now();
    let result = open_existing_db(path)
        .map_err(RepoError::from)
        .and_then(|conn| SqliteBookRepository::new(&conn).load());
    match result {
        Ok(snapshot) => {
            info!(
                "event=book_load module=repo status=ok found=true persons={} events={} duration_ms={}",
                snapshot.persons.len(),
                snapshot.events.len(),
                started_at.elapsed().as_millis()
            );
            Ok(Some(snapshot))
        }
        Err(err) => {
            error!(
                "event=book_load module=repo status=error path={} error={}",
                path.display(),
                err
            );
            Err(err)
        }
    }
}

/// Replaces the book stored at `path` with `snapshot`, creating the file
/// when needed.
///
/// # Errors
/// - `RepoError::InvalidData` when `path` holds some other database; it is
///   left untouched.
pub fn save_book(snapshot: &BookSnapshot, path: impl AsRef<Path>) -> RepoResult<()> {
    let path = path.as_ref();
    let started_at = Instant::now();
    let has_content = std::fs::metadata(path).is_ok_and(|meta| meta.len() > 0);
    let opened = if has_content {
        open_existing_db(path)
    } else {
        open_db(path)
    };
    let result = opened
        .map_err(RepoError::from)
        .and_then(|conn| SqliteBookRepository::new(&conn).save(snapshot));
    match &result {
        Ok(()) => info!(
            "event=book_save module=repo status=ok persons={} events={} duration_ms={}",
            snapshot.persons.len(),
            snapshot.events.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=book_save module=repo status=error path={} error={}",
            path.display(),
            err
        ),
    }
    result
}

/// Loads the book at `path` into a store, starting empty when no file
/// exists.
pub fn load_store(path: impl AsRef<Path>) -> RepoResult<EntityStore> {
    match load_book(path)? {
        Some(snapshot) => EntityStore::from_snapshot(snapshot)
            .map_err(|err| RepoError::InvalidData(err.to_string())),
        None => Ok(EntityStore::new()),
    }
}
