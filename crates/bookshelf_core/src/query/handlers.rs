//! Custom query handlers.

use super::{CatalogReader, QueryOutput, QueryRequest};
use crate::model::EntityKind;

pub const SEARCH_BOOKS_BY_TITLE: &str = "searchBooksByTitle";
pub const SEARCH_GENRES_BY_TERM: &str = "searchGenresByTerm";

/// Maximum number of genres returned by one term search.
pub const GENRE_SEARCH_LIMIT: usize = 10;

/// A named read operation that replaces the generic listing.
pub trait QueryHandler: Send + Sync {
    fn operation_name(&self) -> &str;

    /// Returns `None` when the request is not addressed at this handler,
    /// either by operation name or by resource.
    fn handle(&self, reader: &dyn CatalogReader, request: &QueryRequest) -> Option<QueryOutput>;
}

/// `searchBooksByTitle(title)`: unbounded case-insensitive title match.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchBooksByTitle;

impl QueryHandler for SearchBooksByTitle {
    fn operation_name(&self) -> &str {
        SEARCH_BOOKS_BY_TITLE
    }

    fn handle(&self, reader: &dyn CatalogReader, request: &QueryRequest) -> Option<QueryOutput> {
        if request.resource() != EntityKind::Book
            || request.operation_name() != Some(SEARCH_BOOKS_BY_TITLE)
        {
            return None;
        }
        let books = match request.arg("title") {
            Some(title) => reader.books_by_title_fragment(title),
            None => Vec::new(),
        };
        Some(QueryOutput::Books(books))
    }
}

/// `searchGenresByTerm(term)`: name-ordered, capped genre match.
#[derive(Debug, Clone, Copy)]
pub struct SearchGenresByTerm {
    limit: usize,
}

impl SearchGenresByTerm {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for SearchGenresByTerm {
    fn default() -> Self {
        Self::new(GENRE_SEARCH_LIMIT)
    }
}

impl QueryHandler for SearchGenresByTerm {
    fn operation_name(&self) -> &str {
        SEARCH_GENRES_BY_TERM
    }

    fn handle(&self, reader: &dyn CatalogReader, request: &QueryRequest) -> Option<QueryOutput> {
        if request.resource() != EntityKind::Genre
            || request.operation_name() != Some(SEARCH_GENRES_BY_TERM)
        {
            return None;
        }
        let genres = match request.arg("term") {
            Some(term) => reader.genres_by_term(term, self.limit),
            None => Vec::new(),
        };
        Some(QueryOutput::Genres(genres))
    }
}
