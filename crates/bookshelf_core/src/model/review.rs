//! Review entity.

use super::validation::require_text;
use super::{Book, Comment, Entity, EntityKind, Key, ValidationError};
use crate::graph::{Arena, EntityGraph};
use chrono::{DateTime, Utc};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Reader review. Always belongs to exactly one book once persisted.
#[derive(Debug, Clone)]
pub struct Review {
    rating: u8,
    body: String,
    created_at: DateTime<Utc>,
    pub(crate) book: Option<Key<Book>>,
    pub(crate) comments: Vec<Key<Comment>>,
}

impl Review {
    /// Creates a review stamped with the current time.
    pub fn new(rating: u8, body: impl Into<String>) -> Self {
        Self::with_created_at(rating, body, Utc::now())
    }

    pub fn with_created_at(
        rating: u8,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            rating,
            body: body.into(),
            created_at,
            book: None,
            comments: Vec::new(),
        }
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn book(&self) -> Option<Key<Book>> {
        self.book
    }

    pub fn comments(&self) -> &[Key<Comment>] {
        &self.comments
    }

    pub fn set_rating(&mut self, value: u8) {
        self.rating = value;
    }

    pub fn set_body(&mut self, value: impl Into<String>) {
        self.body = value.into();
    }
}

impl Entity for Review {
    const KIND: EntityKind = EntityKind::Review;

    fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(ValidationError::new(
                Self::KIND,
                "rating",
                format!("must be between {MIN_RATING} and {MAX_RATING}"),
            ));
        }
        require_text(Self::KIND, "body", &self.body)
    }

    fn label(&self) -> String {
        format!("{}/{}", self.rating, MAX_RATING)
    }

    fn arena(graph: &EntityGraph) -> &Arena<Self> {
        &graph.reviews
    }

    fn arena_mut(graph: &mut EntityGraph) -> &mut Arena<Self> {
        &mut graph.reviews
    }
}
