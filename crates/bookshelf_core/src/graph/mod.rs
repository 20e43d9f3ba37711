//! Arena-backed entity graph.
//!
//! # Responsibility
//! - Own every loaded or newly created entity of one unit of work.
//! - Provide typed lookups (`get`, `find`, `find_by`, `keys`).
//! - Record which entities were mutated since the last commit.
//!
//! # Invariants
//! - Relationships are stored as keys into sibling arenas, never as owning
//!   pointers.
//! - Every bidirectional relationship is kept symmetric by the mutators in
//!   `sync`; nothing else writes relationship fields.
//!
//! # See also
//! - `crate::uow` for staging and commit.

mod arena;
mod follow;
mod sync;

pub use arena::Arena;
pub use follow::FollowIndex;

use crate::model::{
    AnyKey, Author, Book, Comment, Contract, Editor, Entity, EntityId, EntityKind, Genre, Key,
    Publisher, RelationId, Review, Series, User, ValidationError,
};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    pub(crate) authors: Arena<Author>,
    pub(crate) books: Arena<Book>,
    pub(crate) genres: Arena<Genre>,
    pub(crate) editors: Arena<Editor>,
    pub(crate) publishers: Arena<Publisher>,
    pub(crate) series: Arena<Series>,
    pub(crate) reviews: Arena<Review>,
    pub(crate) comments: Arena<Comment>,
    pub(crate) contracts: Arena<Contract>,
    pub(crate) users: Arena<User>,
    pub(crate) follows: FollowIndex,
    /// Entities mutated since the last commit.
    pub(crate) touched: BTreeSet<AnyKey>,
    /// Children detached from an orphan-removal collection.
    pub(crate) orphaned: BTreeSet<AnyKey>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert<T: Entity>(&mut self, value: T) -> Key<T> {
        T::arena_mut(self).insert(value)
    }

    pub fn get<T: Entity>(&self, key: Key<T>) -> Option<&T> {
        T::arena(self).get(key)
    }

    /// Mutable access for scalar edits. Marks the entity as changed.
    pub fn get_mut<T: Entity>(&mut self, key: Key<T>) -> Option<&mut T> {
        if !self.contains(key) {
            return None;
        }
        self.touch(key);
        T::arena_mut(self).get_mut(key)
    }

    pub fn contains<T: Entity>(&self, key: Key<T>) -> bool {
        T::arena(self).contains(key)
    }

    /// Persisted id, `None` until the first successful commit.
    pub fn id<T: Entity>(&self, key: Key<T>) -> Option<EntityId> {
        T::arena(self).id(key)
    }

    pub fn find<T: Entity>(&self, id: EntityId) -> Option<Key<T>> {
        T::arena(self).key_of(id)
    }

    pub fn find_by<T, F>(&self, mut predicate: F) -> Vec<Key<T>>
    where
        T: Entity,
        F: FnMut(&T) -> bool,
    {
        T::arena(self)
            .iter()
            .filter(|(_, value)| predicate(value))
            .map(|(key, _)| key)
            .collect()
    }

    pub fn keys<T: Entity>(&self) -> Vec<Key<T>> {
        T::arena(self).keys().collect()
    }

    pub fn iter<T: Entity>(&self) -> impl Iterator<Item = (Key<T>, &T)> + '_ {
        T::arena(self).iter()
    }

    pub fn count<T: Entity>(&self) -> usize {
        T::arena(self).len()
    }

    pub fn follows(&self) -> &FollowIndex {
        &self.follows
    }

    /// Whether any entity changed since the last commit.
    pub fn has_changes(&self) -> bool {
        !self.touched.is_empty() || !self.orphaned.is_empty()
    }

    pub(crate) fn touch(&mut self, key: impl Into<AnyKey>) {
        self.touched.insert(key.into());
    }

    pub(crate) fn clear_journal(&mut self) {
        self.touched.clear();
        self.orphaned.clear();
    }

    pub(crate) fn contains_any(&self, key: AnyKey) -> bool {
        match key.kind {
            EntityKind::Author => self.authors.contains_index(key.index),
            EntityKind::Series => self.series.contains_index(key.index),
            EntityKind::Publisher => self.publishers.contains_index(key.index),
            EntityKind::Genre => self.genres.contains_index(key.index),
            EntityKind::Editor => self.editors.contains_index(key.index),
            EntityKind::User => self.users.contains_index(key.index),
            EntityKind::Contract => self.contracts.contains_index(key.index),
            EntityKind::Book => self.books.contains_index(key.index),
            EntityKind::Review => self.reviews.contains_index(key.index),
            EntityKind::Comment => self.comments.contains_index(key.index),
        }
    }

    pub(crate) fn id_any(&self, key: AnyKey) -> Option<EntityId> {
        match key.kind {
            EntityKind::Author => self.authors.id_at(key.index),
            EntityKind::Series => self.series.id_at(key.index),
            EntityKind::Publisher => self.publishers.id_at(key.index),
            EntityKind::Genre => self.genres.id_at(key.index),
            EntityKind::Editor => self.editors.id_at(key.index),
            EntityKind::User => self.users.id_at(key.index),
            EntityKind::Contract => self.contracts.id_at(key.index),
            EntityKind::Book => self.books.id_at(key.index),
            EntityKind::Review => self.reviews.id_at(key.index),
            EntityKind::Comment => self.comments.id_at(key.index),
        }
    }

    pub(crate) fn assign_id_any(&mut self, key: AnyKey, id: EntityId) -> bool {
        match key.kind {
            EntityKind::Author => self.authors.assign_id(key.index, id),
            EntityKind::Series => self.series.assign_id(key.index, id),
            EntityKind::Publisher => self.publishers.assign_id(key.index, id),
            EntityKind::Genre => self.genres.assign_id(key.index, id),
            EntityKind::Editor => self.editors.assign_id(key.index, id),
            EntityKind::User => self.users.assign_id(key.index, id),
            EntityKind::Contract => self.contracts.assign_id(key.index, id),
            EntityKind::Book => self.books.assign_id(key.index, id),
            EntityKind::Review => self.reviews.assign_id(key.index, id),
            EntityKind::Comment => self.comments.assign_id(key.index, id),
        }
    }

    pub(crate) fn validate_any(&self, key: AnyKey) -> Result<(), ValidationError> {
        fn check<T: Entity>(graph: &EntityGraph, key: AnyKey) -> Result<(), ValidationError> {
            match key.typed::<T>().and_then(|key| graph.get(key)) {
                Some(value) => value.validate(),
                None => Ok(()),
            }
        }

        match key.kind {
            EntityKind::Author => check::<Author>(self, key),
            EntityKind::Series => check::<Series>(self, key),
            EntityKind::Publisher => check::<Publisher>(self, key),
            EntityKind::Genre => check::<Genre>(self, key),
            EntityKind::Editor => check::<Editor>(self, key),
            EntityKind::User => check::<User>(self, key),
            EntityKind::Contract => check::<Contract>(self, key),
            EntityKind::Book => check::<Book>(self, key),
            EntityKind::Review => check::<Review>(self, key),
            EntityKind::Comment => check::<Comment>(self, key),
        }
    }

    /// Live keys of one kind, in creation order.
    pub(crate) fn keys_any(&self, kind: EntityKind) -> Vec<AnyKey> {
        fn erased<T: Entity>(graph: &EntityGraph) -> Vec<AnyKey> {
            T::arena(graph).keys().map(Key::erase).collect()
        }

        match kind {
            EntityKind::Author => erased::<Author>(self),
            EntityKind::Series => erased::<Series>(self),
            EntityKind::Publisher => erased::<Publisher>(self),
            EntityKind::Genre => erased::<Genre>(self),
            EntityKind::Editor => erased::<Editor>(self),
            EntityKind::User => erased::<User>(self),
            EntityKind::Contract => erased::<Contract>(self),
            EntityKind::Book => erased::<Book>(self),
            EntityKind::Review => erased::<Review>(self),
            EntityKind::Comment => erased::<Comment>(self),
        }
    }

    /// Inverse-side entities referenced by `owner` through `relation`.
    pub(crate) fn targets(&self, relation: RelationId, owner: AnyKey) -> Vec<AnyKey> {
        match relation {
            RelationId::ContractAuthor => self
                .typed_get::<Contract>(owner)
                .map(|contract| erase_all(contract.author))
                .unwrap_or_default(),
            RelationId::BookAuthor => self
                .typed_get::<Book>(owner)
                .map(|book| erase_all(book.author))
                .unwrap_or_default(),
            RelationId::BookSeries => self
                .typed_get::<Book>(owner)
                .map(|book| erase_all(book.series))
                .unwrap_or_default(),
            RelationId::BookPublisher => self
                .typed_get::<Book>(owner)
                .map(|book| erase_all(book.publisher))
                .unwrap_or_default(),
            RelationId::BookGenre => self
                .typed_get::<Book>(owner)
                .map(|book| erase_all(book.genres.iter().copied()))
                .unwrap_or_default(),
            RelationId::BookEditor => self
                .typed_get::<Book>(owner)
                .map(|book| erase_all(book.editors.iter().copied()))
                .unwrap_or_default(),
            RelationId::ReviewBook => self
                .typed_get::<Review>(owner)
                .map(|review| erase_all(review.book))
                .unwrap_or_default(),
            RelationId::CommentReview => self
                .typed_get::<Comment>(owner)
                .map(|comment| erase_all(comment.review))
                .unwrap_or_default(),
            RelationId::UserFollow => owner
                .typed::<User>()
                .map(|user| erase_all(self.follows.following(user)))
                .unwrap_or_default(),
        }
    }

    /// Owning-side entities that reference `inverse` through `relation`.
    pub(crate) fn owners(&self, relation: RelationId, inverse: AnyKey) -> Vec<AnyKey> {
        match relation {
            RelationId::ContractAuthor => self
                .typed_get::<Author>(inverse)
                .map(|author| erase_all(author.contract))
                .unwrap_or_default(),
            RelationId::BookAuthor => self
                .typed_get::<Author>(inverse)
                .map(|author| erase_all(author.books.iter().copied()))
                .unwrap_or_default(),
            RelationId::BookSeries => self
                .typed_get::<Series>(inverse)
                .map(|series| erase_all(series.books.iter().copied()))
                .unwrap_or_default(),
            RelationId::BookPublisher => self
                .typed_get::<Publisher>(inverse)
                .map(|publisher| erase_all(publisher.books.iter().copied()))
                .unwrap_or_default(),
            RelationId::BookGenre => self
                .typed_get::<Genre>(inverse)
                .map(|genre| erase_all(genre.books.iter().copied()))
                .unwrap_or_default(),
            RelationId::BookEditor => self
                .typed_get::<Editor>(inverse)
                .map(|editor| erase_all(editor.books.iter().copied()))
                .unwrap_or_default(),
            RelationId::ReviewBook => self
                .typed_get::<Book>(inverse)
                .map(|book| erase_all(book.reviews.iter().copied()))
                .unwrap_or_default(),
            RelationId::CommentReview => self
                .typed_get::<Review>(inverse)
                .map(|review| erase_all(review.comments.iter().copied()))
                .unwrap_or_default(),
            RelationId::UserFollow => inverse
                .typed::<User>()
                .map(|user| erase_all(self.follows.followers(user)))
                .unwrap_or_default(),
        }
    }

    fn typed_get<T: Entity>(&self, key: AnyKey) -> Option<&T> {
        key.typed::<T>().and_then(|key| self.get(key))
    }
}

fn erase_all<T: Entity>(keys: impl IntoIterator<Item = Key<T>>) -> Vec<AnyKey> {
    keys.into_iter().map(Key::erase).collect()
}

#[cfg(test)]
mod tests {
    use super::EntityGraph;
    use crate::model::{Genre, RelationId};

    #[test]
    fn find_by_filters_in_creation_order() {
        let mut graph = EntityGraph::new();
        let poetry = graph.insert(Genre::new("Poesía"));
        graph.insert(Genre::new("Ensayo Filosófico"));
        let gothic = graph.insert(Genre::new("Terror Gótico"));

        let found = graph.find_by::<Genre, _>(|genre| genre.name().contains('ó'));
        assert_eq!(found.len(), 2);
        assert_eq!(found[1], gothic);
        assert_eq!(
            graph.find_by::<Genre, _>(|genre| genre.name().starts_with("Poe")),
            vec![poetry]
        );
    }

    #[test]
    fn get_mut_records_the_change() {
        let mut graph = EntityGraph::new();
        let genre = graph.insert(Genre::new("Poesia"));
        assert!(!graph.has_changes());

        graph.get_mut(genre).unwrap().set_name("Poesía");
        assert!(graph.has_changes());
        assert_eq!(graph.get(genre).unwrap().name(), "Poesía");
        assert!(graph.owners(RelationId::BookGenre, genre.erase()).is_empty());
    }
}
