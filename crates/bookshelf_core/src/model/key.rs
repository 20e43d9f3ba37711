//! Typed arena handles.
//!
//! # Responsibility
//! - Identify an entity slot inside one `EntityGraph` arena.
//! - Provide a kind-erased form for bookkeeping across arenas.
//!
//! # Invariants
//! - A key is only meaningful for the graph that issued it.
//! - Slot indices are never reused, so a stale key never aliases a newer entity.

use super::{Entity, EntityKind};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Handle of an entity of type `T` inside an arena.
pub struct Key<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub(crate) fn new(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Raw slot index inside the owning arena.
    pub fn index(self) -> u32 {
        self.index
    }
}

impl<T: Entity> Key<T> {
    /// Erases the entity type, keeping the kind tag.
    pub fn erase(self) -> AnyKey {
        AnyKey {
            kind: T::KIND,
            index: self.index,
        }
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Key<T> {}

impl<T> PartialOrd for Key<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Key<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.index)
    }
}

/// Kind-tagged key used where several entity types share one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnyKey {
    pub kind: EntityKind,
    pub index: u32,
}

impl AnyKey {
    /// Recovers the typed key when the kind matches `T`.
    pub fn typed<T: Entity>(self) -> Option<Key<T>> {
        (self.kind == T::KIND).then(|| Key::new(self.index))
    }
}

impl<T: Entity> From<Key<T>> for AnyKey {
    fn from(value: Key<T>) -> Self {
        value.erase()
    }
}

#[cfg(test)]
mod tests {
    use super::{AnyKey, Key};
    use crate::model::{Book, EntityKind, Genre};

    #[test]
    fn erased_key_only_downcasts_to_its_own_kind() {
        let key: Key<Book> = Key::new(7);
        let erased = AnyKey::from(key);

        assert_eq!(erased.kind, EntityKind::Book);
        assert_eq!(erased.typed::<Book>(), Some(key));
        assert_eq!(erased.typed::<Genre>(), None);
    }
}
