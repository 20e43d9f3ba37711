//! Series entity.

use super::validation::require_text;
use super::{Book, Entity, EntityKind, Key, ValidationError};
use crate::graph::{Arena, EntityGraph};

#[derive(Debug, Clone)]
pub struct Series {
    name: String,
    description: String,
    pub(crate) books: Vec<Key<Book>>,
}

impl Series {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            books: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn books(&self) -> &[Key<Book>] {
        &self.books
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.name = value.into();
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.description = value.into();
    }
}

impl Entity for Series {
    const KIND: EntityKind = EntityKind::Series;

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::KIND, "name", &self.name)
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn arena(graph: &EntityGraph) -> &Arena<Self> {
        &graph.series
    }

    fn arena_mut(graph: &mut EntityGraph) -> &mut Arena<Self> {
        &mut graph.series
    }
}
