//! Publisher entity.

use super::validation::require_text;
use super::{Book, Entity, EntityKind, Key, ValidationError};
use crate::graph::{Arena, EntityGraph};

/// Publishing house. Books detached from `books` are orphan-removed.
#[derive(Debug, Clone)]
pub struct Publisher {
    name: String,
    city: String,
    pub(crate) books: Vec<Key<Book>>,
}

impl Publisher {
    pub fn new(name: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            city: city.into(),
            books: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn books(&self) -> &[Key<Book>] {
        &self.books
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.name = value.into();
    }

    pub fn set_city(&mut self, value: impl Into<String>) {
        self.city = value.into();
    }
}

impl Entity for Publisher {
    const KIND: EntityKind = EntityKind::Publisher;

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::KIND, "name", &self.name)
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn arena(graph: &EntityGraph) -> &Arena<Self> {
        &graph.publishers
    }

    fn arena_mut(graph: &mut EntityGraph) -> &mut Arena<Self> {
        &mut graph.publishers
    }
}
