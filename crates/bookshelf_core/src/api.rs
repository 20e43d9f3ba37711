//! Per-operation projections handed to the API layer.
//!
//! # Responsibility
//! - Expose exactly the fields each read/write operation may serialize.
//!
//! # Invariants
//! - Projections never carry password material.
//! - Field names serialize as camelCase.

use crate::graph::EntityGraph;
use crate::model::{Book, Entity, EntityId, EntityKind, Genre, Key, Review, User};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: Option<EntityId>,
    pub title: String,
    pub isbn: String,
    pub author_name: Option<String>,
    pub publication_date: DateTime<Utc>,
}

impl BookSummary {
    pub fn from_graph(graph: &EntityGraph, key: Key<Book>) -> Option<Self> {
        let book = graph.get(key)?;
        Some(Self {
            id: graph.id(key),
            title: book.title().to_string(),
            isbn: book.isbn().to_string(),
            author_name: book
                .author()
                .and_then(|author| graph.get(author))
                .map(|author| author.full_name()),
            publication_date: book.publication_date(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreSummary {
    pub id: Option<EntityId>,
    pub name: String,
}

impl GenreSummary {
    pub fn from_graph(graph: &EntityGraph, key: Key<Genre>) -> Option<Self> {
        let genre = graph.get(key)?;
        Some(Self {
            id: graph.id(key),
            name: genre.name().to_string(),
        })
    }
}

/// Generic listing entry for any entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub kind: EntityKind,
    pub id: Option<EntityId>,
    pub label: String,
}

impl ResourceSummary {
    pub fn from_graph<T: Entity>(graph: &EntityGraph, key: Key<T>) -> Option<Self> {
        let value = graph.get(key)?;
        Some(Self {
            kind: T::KIND,
            id: graph.id(key),
            label: value.label(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub id: Option<EntityId>,
    pub rating: u8,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub comment_count: usize,
}

impl ReviewSummary {
    pub fn from_graph(graph: &EntityGraph, key: Key<Review>) -> Option<Self> {
        let review = graph.get(key)?;
        Some(Self {
            id: graph.id(key),
            rating: review.rating(),
            body: review.body().to_string(),
            created_at: review.created_at(),
            comment_count: review.comments().len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRef {
    pub id: Option<EntityId>,
    pub full_name: String,
}

/// Full read view of one book.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetail {
    pub id: Option<EntityId>,
    pub title: String,
    pub isbn: String,
    pub publication_date: DateTime<Utc>,
    pub author: Option<AuthorRef>,
    pub series: Option<String>,
    pub publisher: Option<String>,
    pub genres: Vec<GenreSummary>,
    pub editors: Vec<String>,
    pub reviews: Vec<ReviewSummary>,
}

impl BookDetail {
    pub fn from_graph(graph: &EntityGraph, key: Key<Book>) -> Option<Self> {
        let book = graph.get(key)?;
        let author = book.author().and_then(|author| {
            graph.get(author).map(|value| AuthorRef {
                id: graph.id(author),
                full_name: value.full_name(),
            })
        });
        Some(Self {
            id: graph.id(key),
            title: book.title().to_string(),
            isbn: book.isbn().to_string(),
            publication_date: book.publication_date(),
            author,
            series: book
                .series()
                .and_then(|series| graph.get(series))
                .map(|series| series.name().to_string()),
            publisher: book
                .publisher()
                .and_then(|publisher| graph.get(publisher))
                .map(|publisher| publisher.name().to_string()),
            genres: book
                .genres()
                .iter()
                .filter_map(|genre| GenreSummary::from_graph(graph, *genre))
                .collect(),
            editors: book
                .editors()
                .iter()
                .filter_map(|editor| graph.get(*editor))
                .map(|editor| editor.name().to_string())
                .collect(),
            reviews: book
                .reviews()
                .iter()
                .filter_map(|review| ReviewSummary::from_graph(graph, *review))
                .collect(),
        })
    }
}

/// Public profile of a user, including the follow graph by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Option<EntityId>,
    pub email: String,
    pub username: String,
    pub roles: Vec<String>,
    pub following: Vec<EntityId>,
    pub followers: Vec<EntityId>,
}

impl UserProfile {
    pub fn from_graph(graph: &EntityGraph, key: Key<User>) -> Option<Self> {
        let user = graph.get(key)?;
        let ids = |keys: Vec<Key<User>>| {
            keys.into_iter()
                .filter_map(|key| graph.id(key))
                .collect::<Vec<_>>()
        };
        Some(Self {
            id: graph.id(key),
            email: user.email().to_string(),
            username: user.username().to_string(),
            roles: user.roles(),
            following: ids(graph.following(key)),
            followers: ids(graph.followers(key)),
        })
    }
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReceipt {
    pub id: EntityId,
    pub email: String,
}
