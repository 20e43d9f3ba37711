//! Query handler dispatch.
//!
//! # Responsibility
//! - Route named read operations to custom handlers.
//! - Fall back to generic collection listing for everything else.
//!
//! # Invariants
//! - At most one handler is registered per operation name.
//! - Dispatch never fails: unmatched requests get the generic listing.

mod dispatch;
mod handlers;
mod reader;

pub use dispatch::{DispatchError, QueryDispatcher};
pub use handlers::{
    QueryHandler, SearchBooksByTitle, SearchGenresByTerm, GENRE_SEARCH_LIMIT,
    SEARCH_BOOKS_BY_TITLE, SEARCH_GENRES_BY_TERM,
};
pub use reader::CatalogReader;

use crate::api::{BookSummary, GenreSummary, ResourceSummary};
use crate::model::EntityKind;
use serde::Serialize;
use std::collections::BTreeMap;

/// One read request addressed at a resource collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    resource: EntityKind,
    operation: Option<String>,
    args: BTreeMap<String, String>,
}

impl QueryRequest {
    /// Plain collection read with no named operation.
    pub fn collection(resource: EntityKind) -> Self {
        Self {
            resource,
            operation: None,
            args: BTreeMap::new(),
        }
    }

    pub fn operation(resource: EntityKind, name: impl Into<String>) -> Self {
        Self {
            resource,
            operation: Some(name.into()),
            args: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    pub fn resource(&self) -> EntityKind {
        self.resource
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "items", rename_all = "camelCase")]
pub enum QueryOutput {
    Books(Vec<BookSummary>),
    Genres(Vec<GenreSummary>),
    Collection(Vec<ResourceSummary>),
}

impl QueryOutput {
    pub fn len(&self) -> usize {
        match self {
            Self::Books(items) => items.len(),
            Self::Genres(items) => items.len(),
            Self::Collection(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
