//! Read-side interface consumed by query handlers.

use crate::api::{BookSummary, GenreSummary, ResourceSummary};
use crate::graph::EntityGraph;
use crate::model::{
    Author, Book, Comment, Contract, Editor, Entity, EntityKind, Genre, Publisher, Review, Series,
    User,
};

/// Filtered and generic reads over the catalog.
pub trait CatalogReader {
    /// Books whose title contains `fragment` as given (whitespace included),
    /// case-insensitively, ordered by id. An empty fragment matches nothing.
    fn books_by_title_fragment(&self, fragment: &str) -> Vec<BookSummary>;

    /// Genres whose name contains `term` as given, case-insensitively,
    /// ordered by name and capped at `limit`. An empty term matches every
    /// genre.
    fn genres_by_term(&self, term: &str, limit: usize) -> Vec<GenreSummary>;

    /// Every entity of one kind, in id order.
    fn list_collection(&self, kind: EntityKind) -> Vec<ResourceSummary>;
}

impl CatalogReader for EntityGraph {
    fn books_by_title_fragment(&self, fragment: &str) -> Vec<BookSummary> {
        if fragment.is_empty() {
            return Vec::new();
        }
        let needle = fragment.to_lowercase();
        let mut books = self
            .iter::<Book>()
            .filter(|(_, book)| book.title().to_lowercase().contains(&needle))
            .filter_map(|(key, _)| BookSummary::from_graph(self, key))
            .collect::<Vec<_>>();
        books.sort_by(|left, right| {
            left.id
                .cmp(&right.id)
                .then_with(|| left.title.cmp(&right.title))
        });
        books
    }

    fn genres_by_term(&self, term: &str, limit: usize) -> Vec<GenreSummary> {
        let needle = term.to_lowercase();
        let mut genres = self
            .iter::<Genre>()
            .map(|(key, genre)| (genre.name().to_lowercase(), key))
            .filter(|(name, _)| name.contains(&needle))
            .filter_map(|(name, key)| {
                GenreSummary::from_graph(self, key).map(|summary| (name, summary))
            })
            .collect::<Vec<_>>();
        genres.sort_by(|(left_name, left), (right_name, right)| {
            left_name.cmp(right_name).then_with(|| left.id.cmp(&right.id))
        });
        genres
            .into_iter()
            .take(limit)
            .map(|(_, summary)| summary)
            .collect()
    }

    fn list_collection(&self, kind: EntityKind) -> Vec<ResourceSummary> {
        fn list<T: Entity>(graph: &EntityGraph) -> Vec<ResourceSummary> {
            let mut items = graph
                .keys::<T>()
                .into_iter()
                .filter_map(|key| ResourceSummary::from_graph(graph, key))
                .collect::<Vec<_>>();
            items.sort_by_key(|item| item.id);
            items
        }

        match kind {
            EntityKind::Author => list::<Author>(self),
            EntityKind::Series => list::<Series>(self),
            EntityKind::Publisher => list::<Publisher>(self),
            EntityKind::Genre => list::<Genre>(self),
            EntityKind::Editor => list::<Editor>(self),
            EntityKind::User => list::<User>(self),
            EntityKind::Contract => list::<Contract>(self),
            EntityKind::Book => list::<Book>(self),
            EntityKind::Review => list::<Review>(self),
            EntityKind::Comment => list::<Comment>(self),
        }
    }
}
