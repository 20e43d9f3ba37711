//! Book entity.

use super::validation::require_text;
use super::{
    Author, Editor, Entity, EntityKind, Genre, Key, Publisher, Review, Series, ValidationError,
};
use crate::graph::{Arena, EntityGraph};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Book {
    title: String,
    isbn: String,
    publication_date: DateTime<Utc>,
    pub(crate) author: Option<Key<Author>>,
    pub(crate) series: Option<Key<Series>>,
    pub(crate) publisher: Option<Key<Publisher>>,
    pub(crate) editors: Vec<Key<Editor>>,
    pub(crate) genres: Vec<Key<Genre>>,
    pub(crate) reviews: Vec<Key<Review>>,
}

impl Book {
    pub fn new(
        title: impl Into<String>,
        isbn: impl Into<String>,
        publication_date: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            isbn: isbn.into(),
            publication_date,
            author: None,
            series: None,
            publisher: None,
            editors: Vec::new(),
            genres: Vec::new(),
            reviews: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Globally unique across all books.
    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn publication_date(&self) -> DateTime<Utc> {
        self.publication_date
    }

    pub fn author(&self) -> Option<Key<Author>> {
        self.author
    }

    pub fn series(&self) -> Option<Key<Series>> {
        self.series
    }

    pub fn publisher(&self) -> Option<Key<Publisher>> {
        self.publisher
    }

    pub fn editors(&self) -> &[Key<Editor>] {
        &self.editors
    }

    pub fn genres(&self) -> &[Key<Genre>] {
        &self.genres
    }

    pub fn reviews(&self) -> &[Key<Review>] {
        &self.reviews
    }

    pub fn set_title(&mut self, value: impl Into<String>) {
        self.title = value.into();
    }

    pub fn set_isbn(&mut self, value: impl Into<String>) {
        self.isbn = value.into();
    }

    pub fn set_publication_date(&mut self, value: DateTime<Utc>) {
        self.publication_date = value;
    }
}

impl Entity for Book {
    const KIND: EntityKind = EntityKind::Book;

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::KIND, "title", &self.title)?;
        require_text(Self::KIND, "isbn", &self.isbn)
    }

    fn label(&self) -> String {
        self.title.clone()
    }

    fn arena(graph: &EntityGraph) -> &Arena<Self> {
        &graph.books
    }

    fn arena_mut(graph: &mut EntityGraph) -> &mut Arena<Self> {
        &mut graph.books
    }
}
