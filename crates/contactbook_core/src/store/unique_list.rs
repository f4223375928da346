//! Ordered arena with identity-key uniqueness.
//!
//! Records are addressed by a stable `Uuid` slot id. Display order is kept
//! separately from the record map, and an identity index rejects a second
//! record with an equal key. Callers check preconditions before calling the
//! mutating methods; these methods do not re-validate.

use crate::model::event::Event;
use crate::model::person::Person;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use uuid::Uuid;

/// Record type with a value-equality identity key.
pub trait Identified {
    type Key: Eq + Hash + Clone + Debug;

    fn identity(&self) -> Self::Key;
}

impl Identified for Person {
    type Key = String;

    fn identity(&self) -> Self::Key {
        self.identity_key()
    }
}

impl Identified for Event {
    type Key = (String, i64);

    fn identity(&self) -> Self::Key {
        self.key().normalized()
    }
}

#[derive(Debug, Clone)]
pub struct UniqueList<T: Identified> {
    order: Vec<Uuid>,
    records: HashMap<Uuid, T>,
    index: HashMap<T::Key, Uuid>,
}

impl<T: Identified> Default for UniqueList<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            records: HashMap::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Identified> UniqueList<T> {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Slot ids in display order.
    pub fn ids(&self) -> &[Uuid] {
        &self.order
    }

    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.records.get(&id)
    }

    pub fn contains_id(&self, id: Uuid) -> bool {
        self.records.contains_key(&id)
    }

    pub fn id_of(&self, key: &T::Key) -> Option<Uuid> {
        self.index.get(key).copied()
    }

    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.order.iter().position(|current| *current == id)
    }

    /// Records in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Uuid, &T)> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.records.get(id).map(|record| (*id, record)))
    }

    /// Returns whether `key` belongs to a record other than `id`.
    pub fn key_taken_by_other(&self, key: &T::Key, id: Uuid) -> bool {
        matches!(self.index.get(key), Some(owner) if *owner != id)
    }

    pub fn insert_at(&mut self, position: usize, id: Uuid, record: T) {
        debug_assert!(position <= self.order.len());
        debug_assert!(!self.records.contains_key(&id));
        self.index.insert(record.identity(), id);
        self.records.insert(id, record);
        self.order.insert(position, id);
    }

    pub fn remove(&mut self, id: Uuid) -> Option<(usize, T)> {
        let position = self.position(id)?;
        let record = self.records.remove(&id)?;
        self.order.remove(position);
        self.index.remove(&record.identity());
        Some((position, record))
    }

    /// Swaps the record stored at `id`, keeping its slot and position.
    pub fn replace(&mut self, id: Uuid, record: T) -> Option<T> {
        let slot = self.records.get_mut(&id)?;
        let previous = std::mem::replace(slot, record);
        self.index.remove(&previous.identity());
        if let Some(current) = self.records.get(&id) {
            self.index.insert(current.identity(), id);
        }
        Some(previous)
    }

    /// Returns whether `order` is a permutation of the current slot ids.
    pub fn is_permutation(&self, order: &[Uuid]) -> bool {
        if order.len() != self.order.len() {
            return false;
        }
        let mut seen = std::collections::HashSet::with_capacity(order.len());
        order
            .iter()
            .all(|id| self.records.contains_key(id) && seen.insert(*id))
    }

    pub fn set_order(&mut self, order: Vec<Uuid>) {
        debug_assert!(self.is_permutation(&order));
        self.order = order;
    }
}

#[cfg(test)]
mod tests {
    use super::UniqueList;
    use crate::model::person::Person;
    use uuid::Uuid;

    fn person(name: &str) -> Person {
        Person::new(name, "12345", "x@example.com", "street").unwrap()
    }

    #[test]
    fn replace_keeps_position_and_reindexes() {
        let mut list = UniqueList::default();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        list.insert_at(0, first, person("Alice"));
        list.insert_at(1, second, person("Benson"));

        let previous = list.replace(first, person("Carl")).unwrap();
        assert_eq!(previous.name, "Alice");
        assert_eq!(list.position(first), Some(0));
        assert_eq!(list.id_of(&"carl".to_string()), Some(first));
        assert_eq!(list.id_of(&"alice".to_string()), None);
    }

    #[test]
    fn is_permutation_rejects_duplicates_and_unknown_ids() {
        let mut list = UniqueList::default();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        list.insert_at(0, first, person("Alice"));
        list.insert_at(1, second, person("Benson"));

        assert!(list.is_permutation(&[second, first]));
        assert!(!list.is_permutation(&[first, first]));
        assert!(!list.is_permutation(&[first, Uuid::new_v4()]));
    }
}
