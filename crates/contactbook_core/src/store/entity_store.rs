//! Entity store: arena-held persons/events plus the participation table.

use super::mutation::{Mutation, RemovedEvent, RemovedPerson};
use super::snapshot::{BookSnapshot, EventEntry};
use super::unique_list::UniqueList;
use super::{StoreError, StoreResult};
use crate::model::event::{Event, EventKey};
use crate::model::person::{person_key, Person};
use std::collections::HashMap;
use uuid::Uuid;

/// Stable arena slot of a person. Survives edits; never reused.
pub type PersonId = Uuid;
/// Stable arena slot of an event. Survives edits; never reused.
pub type EventId = Uuid;

/// Full store contents, moved out by `clear` and back in by its inverse.
#[derive(Debug, Clone, Default)]
pub struct StoreContents {
    pub(super) persons: UniqueList<Person>,
    pub(super) events: UniqueList<Event>,
    pub(super) participants: HashMap<EventId, Vec<PersonId>>,
}

/// Canonical in-memory contact book.
///
/// Key-based writes (`add_person`, `remove_person`, ...) resolve identity
/// keys to slot ids and delegate to [`EntityStore::apply`]. Each returns the
/// inverse [`Mutation`].
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    pub(super) persons: UniqueList<Person>,
    pub(super) events: UniqueList<Event>,
    /// Relation table: event slot -> participant slots in join order.
    pub(super) participants: HashMap<EventId, Vec<PersonId>>,
}

impl PartialEq for EntityStore {
    /// Stores are equal when their snapshots are; slot ids are not compared.
    fn eq(&self, other: &Self) -> bool {
        self.snapshot() == other.snapshot()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from a snapshot.
    ///
    /// # Errors
    /// - Duplicate persons/events, invalid records, or participants that do
    ///   not name a person in the snapshot.
    pub fn from_snapshot(snapshot: BookSnapshot) -> StoreResult<Self> {
        let mut store = Self::new();
        for person in snapshot.persons {
            store.add_person(person)?;
        }
        for entry in snapshot.events {
            let key = entry.event.key();
            store.add_event(entry.event)?;
            for name in &entry.participants {
                if store.person(name).is_none() {
                    return Err(StoreError::DanglingParticipant {
                        person: name.clone(),
                        event: key.to_string(),
                    });
                }
                store.add_participant(name, &key)?;
            }
        }
        Ok(store)
    }

    /// Owned copy of the current contents in display order.
    pub fn snapshot(&self) -> BookSnapshot {
        let persons = self.persons().cloned().collect();
        let events = self
            .events
            .iter()
            .map(|(id, event)| EventEntry {
                event: event.clone(),
                participants: self
                    .participant_ids(id)
                    .iter()
                    .filter_map(|person_id| self.persons.get(*person_id))
                    .map(|person| person.name.clone())
                    .collect(),
            })
            .collect();
        BookSnapshot { persons, events }
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub fn persons(&self) -> impl Iterator<Item = &Person> + '_ {
        self.persons.iter().map(|(_, person)| person)
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter().map(|(_, event)| event)
    }

    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.events.is_empty()
    }

    pub fn person(&self, name: &str) -> Option<&Person> {
        self.person_id(name).and_then(|id| self.persons.get(id))
    }

    pub fn event(&self, key: &EventKey) -> Option<&Event> {
        self.event_id(key).and_then(|id| self.events.get(id))
    }

    /// Person at a zero-based display position.
    pub fn person_at(&self, position: usize) -> Option<&Person> {
        self.persons
            .ids()
            .get(position)
            .and_then(|id| self.persons.get(*id))
    }

    /// Event at a zero-based display position.
    pub fn event_at(&self, position: usize) -> Option<&Event> {
        self.events
            .ids()
            .get(position)
            .and_then(|id| self.events.get(*id))
    }

    pub fn person_id(&self, name: &str) -> Option<PersonId> {
        self.persons.id_of(&person_key(name))
    }

    pub fn event_id(&self, key: &EventKey) -> Option<EventId> {
        self.events.id_of(&key.normalized())
    }

    /// Participants of one event in join order.
    pub fn participants_of(&self, key: &EventKey) -> StoreResult<Vec<&Person>> {
        let event_id = self
            .event_id(key)
            .ok_or_else(|| StoreError::EventNotFound(key.to_string()))?;
        Ok(self
            .participant_ids(event_id)
            .iter()
            .filter_map(|id| self.persons.get(*id))
            .collect())
    }

    /// Events one person participates in, in event display order.
    pub fn events_of(&self, name: &str) -> StoreResult<Vec<&Event>> {
        let person_id = self
            .person_id(name)
            .ok_or_else(|| StoreError::PersonNotFound(name.to_string()))?;
        Ok(self
            .events
            .iter()
            .filter(|(event_id, _)| self.participant_ids(*event_id).contains(&person_id))
            .map(|(_, event)| event)
            .collect())
    }

    pub fn is_participating(&self, name: &str, key: &EventKey) -> bool {
        match (self.person_id(name), self.event_id(key)) {
            (Some(person_id), Some(event_id)) => {
                self.participant_ids(event_id).contains(&person_id)
            }
            _ => false,
        }
    }

    /// Verifies the relation table against both collections.
    ///
    /// Only fails if a mutation broke an invariant.
    pub fn check_integrity(&self) -> StoreResult<()> {
        if self.participants.len() != self.events.len() {
            return Err(StoreError::RelationMismatch {
                events: self.events.len(),
                relations: self.participants.len(),
            });
        }
        for (event_id, event) in self.events.iter() {
            let participants = self
                .participants
                .get(&event_id)
                .ok_or_else(|| StoreError::EventNotFound(event.key().to_string()))?;
            for (index, person_id) in participants.iter().enumerate() {
                if !self.persons.contains_id(*person_id) {
                    return Err(StoreError::DanglingParticipant {
                        person: person_id.to_string(),
                        event: event.key().to_string(),
                    });
                }
                if participants[..index].contains(person_id) {
                    return Err(StoreError::AlreadyParticipating {
                        person: person_id.to_string(),
                        event: event.key().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub(super) fn participant_ids(&self, event_id: EventId) -> &[PersonId] {
        self.participants
            .get(&event_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // ---------------------------------------------------------------------
    // Key-based writes. Each returns the inverse mutation.
    // ---------------------------------------------------------------------

    /// Appends a person.
    ///
    /// # Errors
    /// - `DuplicatePerson` when an equal person exists.
    pub fn add_person(&mut self, person: Person) -> StoreResult<Mutation> {
        let position = self.persons.len();
        self.apply(Mutation::RestorePerson(Box::new(RemovedPerson {
            id: Uuid::new_v4(),
            position,
            person,
            links: Vec::new(),
        })))
    }

    /// Removes a person and severs every participation link to it.
    ///
    /// The returned inverse remembers the exact links severed.
    pub fn remove_person(&mut self, name: &str) -> StoreResult<Mutation> {
        let id = self
            .person_id(name)
            .ok_or_else(|| StoreError::PersonNotFound(name.to_string()))?;
        self.apply(Mutation::DeletePerson { id })
    }

    /// Replaces `target` with `edited` in place.
    ///
    /// Participation links follow automatically because they reference the
    /// slot, not the record.
    pub fn update_person(&mut self, target: &str, edited: Person) -> StoreResult<Mutation> {
        let id = self
            .person_id(target)
            .ok_or_else(|| StoreError::PersonNotFound(target.to_string()))?;
        self.apply(Mutation::ReplacePerson {
            id,
            person: Box::new(edited),
        })
    }

    pub fn add_event(&mut self, event: Event) -> StoreResult<Mutation> {
        let position = self.events.len();
        self.apply(Mutation::RestoreEvent(Box::new(RemovedEvent {
            id: Uuid::new_v4(),
            position,
            event,
            participants: Vec::new(),
        })))
    }

    pub fn remove_event(&mut self, key: &EventKey) -> StoreResult<Mutation> {
        let id = self
            .event_id(key)
            .ok_or_else(|| StoreError::EventNotFound(key.to_string()))?;
        self.apply(Mutation::DeleteEvent { id })
    }

    pub fn update_event(&mut self, target: &EventKey, edited: Event) -> StoreResult<Mutation> {
        let id = self
            .event_id(target)
            .ok_or_else(|| StoreError::EventNotFound(target.to_string()))?;
        self.apply(Mutation::ReplaceEvent {
            id,
            event: Box::new(edited),
        })
    }

    /// Appends `name` to the participants of `key`.
    pub fn add_participant(&mut self, name: &str, key: &EventKey) -> StoreResult<Mutation> {
        let (person, event) = self.resolve_link(name, key)?;
        self.apply(Mutation::Link {
            event,
            person,
            position: None,
        })
    }

    pub fn remove_participant(&mut self, name: &str, key: &EventKey) -> StoreResult<Mutation> {
        let (person, event) = self.resolve_link(name, key)?;
        self.apply(Mutation::Unlink { event, person })
    }

    /// Stable-sorts events chronologically, ties broken by title.
    pub fn sort_events(&mut self) -> Mutation {
        let previous = self.events.ids().to_vec();
        let mut order: Vec<(EventId, i64, String)> = self
            .events
            .iter()
            .map(|(id, event)| (id, event.start_ms, event.title.to_lowercase()))
            .collect();
        order.sort_by(|left, right| left.1.cmp(&right.1).then_with(|| left.2.cmp(&right.2)));
        self.events
            .set_order(order.into_iter().map(|(id, _, _)| id).collect());
        Mutation::Reorder { order: previous }
    }

    /// Empties the store.
    pub fn clear(&mut self) -> Mutation {
        Mutation::ReplaceContents(Box::new(self.take_contents()))
    }

    pub(super) fn take_contents(&mut self) -> StoreContents {
        StoreContents {
            persons: std::mem::take(&mut self.persons),
            events: std::mem::take(&mut self.events),
            participants: std::mem::take(&mut self.participants),
        }
    }

    fn resolve_link(&self, name: &str, key: &EventKey) -> StoreResult<(PersonId, EventId)> {
        let person = self
            .person_id(name)
            .ok_or_else(|| StoreError::PersonNotFound(name.to_string()))?;
        let event = self
            .event_id(key)
            .ok_or_else(|| StoreError::EventNotFound(key.to_string()))?;
        Ok((person, event))
    }
}

#[cfg(test)]
mod tests {
    use super::EntityStore;
    use crate::model::event::Event;
    use crate::store::StoreError;
    use uuid::Uuid;

    #[test]
    fn integrity_check_reports_relation_table_mismatch() {
        let mut store = EntityStore::new();
        store
            .add_event(Event::new("Party", "", 0, None).unwrap())
            .unwrap();
        store.check_integrity().unwrap();

        store.participants.insert(Uuid::new_v4(), Vec::new());
        assert_eq!(
            store.check_integrity(),
            Err(StoreError::RelationMismatch {
                events: 1,
                relations: 2,
            })
        );
    }
}
