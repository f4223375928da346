//! Atomic, invertible store mutations.
//!
//! # Invariants
//! - `apply` checks every precondition before touching state; on error the
//!   store is unchanged.
//! - `apply(m)` returns `m⁻¹` such that applying `m⁻¹` immediately after
//!   restores the previous contents, slot ids and positions included.

use super::entity_store::{EntityStore, EventId, PersonId, StoreContents};
use super::{StoreError, StoreResult};
use crate::model::event::Event;
use crate::model::person::Person;
use log::error;

/// A participation link severed by a person removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipationLink {
    pub event: EventId,
    /// Index of the person inside the event's participant list.
    pub position: usize,
}

/// Everything needed to put a removed person back.
#[derive(Debug, Clone)]
pub struct RemovedPerson {
    pub id: PersonId,
    pub position: usize,
    pub person: Person,
    /// Severed links in event display order.
    pub links: Vec<ParticipationLink>,
}

/// Everything needed to put a removed event back.
#[derive(Debug, Clone)]
pub struct RemovedEvent {
    pub id: EventId,
    pub position: usize,
    pub event: Event,
    pub participants: Vec<PersonId>,
}

/// Closed set of store writes.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Insert a person at a position and re-create its participation links.
    RestorePerson(Box<RemovedPerson>),
    /// Remove a person, cascading into every event that references it.
    DeletePerson { id: PersonId },
    ReplacePerson { id: PersonId, person: Box<Person> },
    RestoreEvent(Box<RemovedEvent>),
    DeleteEvent { id: EventId },
    ReplaceEvent { id: EventId, event: Box<Event> },
    /// Add a participant; `None` appends.
    Link {
        event: EventId,
        person: PersonId,
        position: Option<usize>,
    },
    Unlink { event: EventId, person: PersonId },
    /// Set the event display order.
    Reorder { order: Vec<EventId> },
    ReplaceContents(Box<StoreContents>),
}

impl Mutation {
    /// Short label for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RestorePerson(_) => "restore_person",
            Self::DeletePerson { .. } => "delete_person",
            Self::ReplacePerson { .. } => "replace_person",
            Self::RestoreEvent(_) => "restore_event",
            Self::DeleteEvent { .. } => "delete_event",
            Self::ReplaceEvent { .. } => "replace_event",
            Self::Link { .. } => "link",
            Self::Unlink { .. } => "unlink",
            Self::Reorder { .. } => "reorder",
            Self::ReplaceContents(_) => "replace_contents",
        }
    }
}

impl EntityStore {
    /// Applies one mutation and returns its inverse.
    pub fn apply(&mut self, mutation: Mutation) -> StoreResult<Mutation> {
        match mutation {
            Mutation::RestorePerson(removed) => self.restore_person(*removed),
            Mutation::DeletePerson { id } => self.delete_person(id),
            Mutation::ReplacePerson { id, person } => self.replace_person(id, *person),
            Mutation::RestoreEvent(removed) => self.restore_event(*removed),
            Mutation::DeleteEvent { id } => self.delete_event(id),
            Mutation::ReplaceEvent { id, event } => self.replace_event(id, *event),
            Mutation::Link {
                event,
                person,
                position,
            } => self.link(event, person, position),
            Mutation::Unlink { event, person } => self.unlink(event, person),
            Mutation::Reorder { order } => self.reorder(order),
            Mutation::ReplaceContents(contents) => Ok(self.replace_contents(*contents)),
        }
    }

    /// Applies mutations in order; all or nothing.
    ///
    /// Returns the undo plan: the inverses in the order they must be applied.
    /// When a step fails, the already-applied steps are rolled back before
    /// the error is returned.
    pub fn apply_batch(&mut self, mutations: Vec<Mutation>) -> StoreResult<Vec<Mutation>> {
        let mut inverses = Vec::with_capacity(mutations.len());
        for mutation in mutations {
            match self.apply(mutation) {
                Ok(inverse) => inverses.push(inverse),
                Err(err) => {
                    self.rollback(inverses);
                    return Err(err);
                }
            }
        }
        inverses.reverse();
        Ok(inverses)
    }

    fn rollback(&mut self, mut applied_inverses: Vec<Mutation>) {
        while let Some(inverse) = applied_inverses.pop() {
            let kind = inverse.kind();
            if let Err(err) = self.apply(inverse) {
                error!(
                    "event=store_rollback module=store status=fatal error_code=integrity_violation mutation={} error={}",
                    kind, err
                );
            }
        }
    }

    fn restore_person(&mut self, removed: RemovedPerson) -> StoreResult<Mutation> {
        let RemovedPerson {
            id,
            position,
            person,
            links,
        } = removed;

        person.validate()?;
        if self.persons.contains_id(id) || self.persons.id_of(&person.identity_key()).is_some() {
            return Err(StoreError::DuplicatePerson(person.name));
        }
        check_position(position, self.persons.len())?;
        for link in &links {
            let participants = self
                .participants
                .get(&link.event)
                .ok_or_else(|| StoreError::EventNotFound(link.event.to_string()))?;
            check_position(link.position, participants.len())?;
        }

        self.persons.insert_at(position, id, person);
        for link in links {
            if let Some(participants) = self.participants.get_mut(&link.event) {
                participants.insert(link.position, id);
            }
        }
        Ok(Mutation::DeletePerson { id })
    }

    fn delete_person(&mut self, id: PersonId) -> StoreResult<Mutation> {
        if !self.persons.contains_id(id) {
            return Err(StoreError::PersonNotFound(id.to_string()));
        }

        let links: Vec<ParticipationLink> = self
            .events
            .ids()
            .iter()
            .filter_map(|event_id| {
                self.participant_ids(*event_id)
                    .iter()
                    .position(|person_id| *person_id == id)
                    .map(|position| ParticipationLink {
                        event: *event_id,
                        position,
                    })
            })
            .collect();

        for link in &links {
            if let Some(participants) = self.participants.get_mut(&link.event) {
                participants.remove(link.position);
            }
        }
        let (position, person) = self
            .persons
            .remove(id)
            .ok_or_else(|| StoreError::PersonNotFound(id.to_string()))?;

        Ok(Mutation::RestorePerson(Box::new(RemovedPerson {
            id,
            position,
            person,
            links,
        })))
    }

    fn replace_person(&mut self, id: PersonId, person: Person) -> StoreResult<Mutation> {
        person.validate()?;
        if !self.persons.contains_id(id) {
            return Err(StoreError::PersonNotFound(id.to_string()));
        }
        if self.persons.key_taken_by_other(&person.identity_key(), id) {
            return Err(StoreError::DuplicatePerson(person.name));
        }

        let previous = self
            .persons
            .replace(id, person)
            .ok_or_else(|| StoreError::PersonNotFound(id.to_string()))?;
        Ok(Mutation::ReplacePerson {
            id,
            person: Box::new(previous),
        })
    }

    fn restore_event(&mut self, removed: RemovedEvent) -> StoreResult<Mutation> {
        let RemovedEvent {
            id,
            position,
            event,
            participants,
        } = removed;

        event.validate()?;
        if self.events.contains_id(id) || self.events.id_of(&event.key().normalized()).is_some() {
            return Err(StoreError::DuplicateEvent(event.key().to_string()));
        }
        check_position(position, self.events.len())?;
        for (index, person_id) in participants.iter().enumerate() {
            if !self.persons.contains_id(*person_id) {
                return Err(StoreError::DanglingParticipant {
                    person: person_id.to_string(),
                    event: event.key().to_string(),
                });
            }
            if participants[..index].contains(person_id) {
                return Err(StoreError::AlreadyParticipating {
                    person: self.person_label(*person_id),
                    event: event.key().to_string(),
                });
            }
        }

        self.events.insert_at(position, id, event);
        self.participants.insert(id, participants);
        Ok(Mutation::DeleteEvent { id })
    }

    fn delete_event(&mut self, id: EventId) -> StoreResult<Mutation> {
        let (position, event) = self
            .events
            .remove(id)
            .ok_or_else(|| StoreError::EventNotFound(id.to_string()))?;
        let participants = self.participants.remove(&id).unwrap_or_default();
        Ok(Mutation::RestoreEvent(Box::new(RemovedEvent {
            id,
            position,
            event,
            participants,
        })))
    }

    fn replace_event(&mut self, id: EventId, event: Event) -> StoreResult<Mutation> {
        event.validate()?;
        if !self.events.contains_id(id) {
            return Err(StoreError::EventNotFound(id.to_string()));
        }
        if self.events.key_taken_by_other(&event.key().normalized(), id) {
            return Err(StoreError::DuplicateEvent(event.key().to_string()));
        }

        let previous = self
            .events
            .replace(id, event)
            .ok_or_else(|| StoreError::EventNotFound(id.to_string()))?;
        Ok(Mutation::ReplaceEvent {
            id,
            event: Box::new(previous),
        })
    }

    fn link(
        &mut self,
        event: EventId,
        person: PersonId,
        position: Option<usize>,
    ) -> StoreResult<Mutation> {
        if !self.persons.contains_id(person) {
            return Err(StoreError::PersonNotFound(person.to_string()));
        }
        let current = self
            .participants
            .get(&event)
            .ok_or_else(|| StoreError::EventNotFound(event.to_string()))?;
        if current.contains(&person) {
            return Err(StoreError::AlreadyParticipating {
                person: self.person_label(person),
                event: self.event_label(event),
            });
        }
        let position = position.unwrap_or(current.len());
        check_position(position, current.len())?;

        if let Some(participants) = self.participants.get_mut(&event) {
            participants.insert(position, person);
        }
        Ok(Mutation::Unlink { event, person })
    }

    fn unlink(&mut self, event: EventId, person: PersonId) -> StoreResult<Mutation> {
        let current = self
            .participants
            .get(&event)
            .ok_or_else(|| StoreError::EventNotFound(event.to_string()))?;
        let position = current
            .iter()
            .position(|id| *id == person)
            .ok_or_else(|| StoreError::NotParticipating {
                person: self.person_label(person),
                event: self.event_label(event),
            })?;

        if let Some(participants) = self.participants.get_mut(&event) {
            participants.remove(position);
        }
        Ok(Mutation::Link {
            event,
            person,
            position: Some(position),
        })
    }

    fn reorder(&mut self, order: Vec<EventId>) -> StoreResult<Mutation> {
        if !self.events.is_permutation(&order) {
            return Err(StoreError::InvalidOrder);
        }
        let previous = self.events.ids().to_vec();
        self.events.set_order(order);
        Ok(Mutation::Reorder { order: previous })
    }

    fn replace_contents(&mut self, contents: StoreContents) -> Mutation {
        let previous = self.take_contents();
        self.persons = contents.persons;
        self.events = contents.events;
        self.participants = contents.participants;
        Mutation::ReplaceContents(Box::new(previous))
    }

    fn person_label(&self, id: PersonId) -> String {
        self.persons
            .get(id)
            .map(|person| person.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn event_label(&self, id: EventId) -> String {
        self.events
            .get(id)
            .map(|event| event.key().to_string())
            .unwrap_or_else(|| id.to_string())
    }
}

fn check_position(position: usize, len: usize) -> StoreResult<()> {
    if position > len {
        Err(StoreError::InvalidPosition { position, len })
    } else {
        Ok(())
    }
}
