//! Editor entity.

use super::validation::require_text;
use super::{Book, Entity, EntityKind, Key, ValidationError};
use crate::graph::{Arena, EntityGraph};

#[derive(Debug, Clone)]
pub struct Editor {
    name: String,
    pub(crate) books: Vec<Key<Book>>,
}

impl Editor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            books: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn books(&self) -> &[Key<Book>] {
        &self.books
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.name = value.into();
    }
}

impl Entity for Editor {
    const KIND: EntityKind = EntityKind::Editor;

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::KIND, "name", &self.name)
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn arena(graph: &EntityGraph) -> &Arena<Self> {
        &graph.editors
    }

    fn arena_mut(graph: &mut EntityGraph) -> &mut Arena<Self> {
        &mut graph.editors
    }
}
