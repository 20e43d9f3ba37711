//! Comment entity.

use super::validation::require_text;
use super::{Entity, EntityKind, Key, Review, ValidationError};
use crate::graph::{Arena, EntityGraph};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Comment {
    content: String,
    created_at: DateTime<Utc>,
    pub(crate) review: Option<Key<Review>>,
}

impl Comment {
    /// Creates a comment stamped with the current time.
    pub fn new(content: impl Into<String>) -> Self {
        Self::with_created_at(content, Utc::now())
    }

    pub fn with_created_at(content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            created_at,
            review: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn review(&self) -> Option<Key<Review>> {
        self.review
    }

    pub fn set_content(&mut self, value: impl Into<String>) {
        self.content = value.into();
    }
}

impl Entity for Comment {
    const KIND: EntityKind = EntityKind::Comment;

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::KIND, "content", &self.content)
    }

    fn label(&self) -> String {
        self.content.chars().take(40).collect()
    }

    fn arena(graph: &EntityGraph) -> &Arena<Self> {
        &graph.comments
    }

    fn arena_mut(graph: &mut EntityGraph) -> &mut Arena<Self> {
        &mut graph.comments
    }
}
