//! Slot arena for one entity type.
//!
//! # Invariants
//! - Slot indices are monotonic and never reused after removal.
//! - An id is assigned at most once per slot and indexed for lookup.

use crate::model::{EntityId, Key};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Slot<T> {
    id: Option<EntityId>,
    value: T,
}

#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Option<Slot<T>>>,
    by_id: BTreeMap<EntityId, u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            by_id: BTreeMap::new(),
            len: 0,
        }
    }
}

impl<T> Arena<T> {
    pub(crate) fn insert(&mut self, value: T) -> Key<T> {
        let index = self.slots.len() as u32;
        self.slots.push(Some(Slot { id: None, value }));
        self.len += 1;
        Key::new(index)
    }

    pub fn get(&self, key: Key<T>) -> Option<&T> {
        self.slot(key.index()).map(|slot| &slot.value)
    }

    pub(crate) fn get_mut(&mut self, key: Key<T>) -> Option<&mut T> {
        self.slots
            .get_mut(key.index() as usize)
            .and_then(Option::as_mut)
            .map(|slot| &mut slot.value)
    }

    pub fn contains(&self, key: Key<T>) -> bool {
        self.contains_index(key.index())
    }

    pub(crate) fn contains_index(&self, index: u32) -> bool {
        self.slot(index).is_some()
    }

    /// Persisted id of the slot, `None` while the entity is new.
    pub fn id(&self, key: Key<T>) -> Option<EntityId> {
        self.id_at(key.index())
    }

    pub(crate) fn id_at(&self, index: u32) -> Option<EntityId> {
        self.slot(index).and_then(|slot| slot.id)
    }

    pub fn key_of(&self, id: EntityId) -> Option<Key<T>> {
        self.by_id.get(&id).map(|index| Key::new(*index))
    }

    /// Assigns the persisted id. Returns `false` when the slot is missing or
    /// already carries an id.
    pub(crate) fn assign_id(&mut self, index: u32, id: EntityId) -> bool {
        let Some(slot) = self.slots.get_mut(index as usize).and_then(Option::as_mut) else {
            return false;
        };
        if slot.id.is_some() || self.by_id.contains_key(&id) {
            return false;
        }
        slot.id = Some(id);
        self.by_id.insert(id, index);
        true
    }

    pub(crate) fn remove_at(&mut self, index: u32) -> Option<T> {
        let slot = self.slots.get_mut(index as usize)?.take()?;
        if let Some(id) = slot.id {
            self.by_id.remove(&id);
        }
        self.len -= 1;
        Some(slot.value)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live keys in creation order.
    pub fn keys(&self) -> impl Iterator<Item = Key<T>> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Key<T>, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|slot| (Key::new(index as u32), &slot.value))
        })
    }

    fn slot(&self, index: u32) -> Option<&Slot<T>> {
        self.slots.get(index as usize).and_then(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::Arena;

    #[test]
    fn removed_slots_are_not_reused() {
        let mut arena = Arena::default();
        let first = arena.insert("a");
        assert_eq!(arena.remove_at(first.index()), Some("a"));
        let second = arena.insert("b");

        assert_ne!(first, second);
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.get(second), Some(&"b"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn ids_are_assigned_once() {
        let mut arena = Arena::default();
        let key = arena.insert(1_u8);

        assert!(arena.assign_id(key.index(), 10));
        assert!(!arena.assign_id(key.index(), 11));
        assert_eq!(arena.id(key), Some(10));
        assert_eq!(arena.key_of(10), Some(key));

        arena.remove_at(key.index());
        assert_eq!(arena.key_of(10), None);
    }
}
