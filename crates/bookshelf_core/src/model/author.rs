//! Author entity.

use super::validation::require_text;
use super::{Book, Contract, Entity, EntityKind, Key, ValidationError};
use crate::graph::{Arena, EntityGraph};

#[derive(Debug, Clone)]
pub struct Author {
    first_name: String,
    last_name: String,
    bio: String,
    pub(crate) books: Vec<Key<Book>>,
    pub(crate) contract: Option<Key<Contract>>,
}

impl Author {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        bio: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            bio: bio.into(),
            books: Vec::new(),
            contract: None,
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn bio(&self) -> &str {
        &self.bio
    }

    /// Display name, derived and never stored.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn books(&self) -> &[Key<Book>] {
        &self.books
    }

    pub fn contract(&self) -> Option<Key<Contract>> {
        self.contract
    }

    pub fn set_first_name(&mut self, value: impl Into<String>) {
        self.first_name = value.into();
    }

    pub fn set_last_name(&mut self, value: impl Into<String>) {
        self.last_name = value.into();
    }

    pub fn set_bio(&mut self, value: impl Into<String>) {
        self.bio = value.into();
    }
}

impl Entity for Author {
    const KIND: EntityKind = EntityKind::Author;

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::KIND, "first_name", &self.first_name)?;
        require_text(Self::KIND, "last_name", &self.last_name)
    }

    fn label(&self) -> String {
        self.full_name()
    }

    fn arena(graph: &EntityGraph) -> &Arena<Self> {
        &graph.authors
    }

    fn arena_mut(graph: &mut EntityGraph) -> &mut Arena<Self> {
        &mut graph.authors
    }
}

#[cfg(test)]
mod tests {
    use super::Author;
    use crate::model::Entity;

    #[test]
    fn full_name_joins_first_and_last() {
        let author = Author::new("Dolores", "Redondo", "");
        assert_eq!(author.full_name(), "Dolores Redondo");
        assert_eq!(author.label(), "Dolores Redondo");
    }

    #[test]
    fn blank_last_name_fails_validation() {
        let author = Author::new("Dolores", " ", "");
        let err = author.validate().unwrap_err();
        assert_eq!(err.field, "last_name");
    }
}
