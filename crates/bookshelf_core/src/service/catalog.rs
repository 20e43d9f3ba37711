//! Catalog writes and reads by id.

use crate::api::{BookDetail, BookSummary};
use crate::error::{CatalogError, CatalogResult};
use crate::model::{
    Author, Book, Comment, Contract, Editor, Entity, EntityId, Genre, Publisher, Review, Series,
};
use crate::query::{QueryDispatcher, QueryOutput, QueryRequest, GENRE_SEARCH_LIMIT};
use crate::store::{CatalogStore, StoreError};
use crate::uow::{CommitSummary, UnitOfWork};
use chrono::{DateTime, Utc};
use log::info;

/// Input for `CatalogService::create_book`. Related entities are given by id.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub isbn: String,
    pub publication_date: DateTime<Utc>,
    pub author_id: EntityId,
    pub series_id: Option<EntityId>,
    pub publisher_id: Option<EntityId>,
    pub genre_ids: Vec<EntityId>,
    pub editor_ids: Vec<EntityId>,
}

pub struct CatalogService<S: CatalogStore> {
    store: S,
    dispatcher: QueryDispatcher,
}

impl<S: CatalogStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self::with_genre_limit(store, GENRE_SEARCH_LIMIT)
    }

    pub fn with_genre_limit(store: S, genre_limit: usize) -> Self {
        Self {
            store,
            dispatcher: QueryDispatcher::with_default_handlers(genre_limit),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn dispatcher_mut(&mut self) -> &mut QueryDispatcher {
        &mut self.dispatcher
    }

    /// Creates a book linked to existing author, series, publisher, genres
    /// and editors.
    ///
    /// # Errors
    /// - `NotFound` when any referenced id is missing.
    /// - `Validation` / `Conflict` from the commit.
    pub fn create_book(&mut self, input: NewBook) -> CatalogResult<BookSummary> {
        let mut uow = UnitOfWork::begin(&self.store)?;
        let author = uow.require::<Author>(input.author_id)?;
        let series = input
            .series_id
            .map(|id| uow.require::<Series>(id))
            .transpose()?;
        let publisher = input
            .publisher_id
            .map(|id| uow.require::<Publisher>(id))
            .transpose()?;
        let genres = input
            .genre_ids
            .iter()
            .map(|id| uow.require::<Genre>(*id))
            .collect::<CatalogResult<Vec<_>>>()?;
        let editors = input
            .editor_ids
            .iter()
            .map(|id| uow.require::<Editor>(*id))
            .collect::<CatalogResult<Vec<_>>>()?;

        let book = uow.add(Book::new(input.title, input.isbn, input.publication_date));
        let graph = uow.graph_mut();
        graph.set_book_author(book, Some(author));
        graph.set_book_series(book, series);
        graph.set_book_publisher(book, publisher);
        for genre in genres {
            graph.add_book_genre(book, genre);
        }
        for editor in editors {
            graph.add_book_editor(book, editor);
        }
        uow.commit(&mut self.store)?;

        let summary =
            BookSummary::from_graph(uow.graph(), book).ok_or_else(missing_after_commit)?;
        info!(
            "event=book_create module=service status=ok book_id={}",
            summary.id.unwrap_or_default()
        );
        Ok(summary)
    }

    /// Adds a review to an existing book and returns its id.
    pub fn add_review(
        &mut self,
        book_id: EntityId,
        rating: u8,
        body: &str,
    ) -> CatalogResult<EntityId> {
        let mut uow = UnitOfWork::begin(&self.store)?;
        let book = uow.require::<Book>(book_id)?;
        let review = uow.add(Review::new(rating, body));
        uow.graph_mut().set_review_book(review, Some(book));
        uow.commit(&mut self.store)?;
        uow.graph().id(review).ok_or_else(missing_after_commit)
    }

    /// Adds a comment to an existing review and returns its id.
    pub fn add_comment(&mut self, review_id: EntityId, content: &str) -> CatalogResult<EntityId> {
        let mut uow = UnitOfWork::begin(&self.store)?;
        let review = uow.require::<Review>(review_id)?;
        let comment = uow.add(Comment::new(content));
        uow.graph_mut().set_comment_review(comment, Some(review));
        uow.commit(&mut self.store)?;
        uow.graph().id(comment).ok_or_else(missing_after_commit)
    }

    /// Signs a new contract for an author. An existing contract is removed.
    pub fn sign_contract(
        &mut self,
        author_id: EntityId,
        date_signed: DateTime<Utc>,
        royalty_rate: f64,
    ) -> CatalogResult<EntityId> {
        let mut uow = UnitOfWork::begin(&self.store)?;
        let author = uow.require::<Author>(author_id)?;
        let previous = uow.graph().get(author).and_then(Author::contract);

        let contract = uow.add(Contract::new(date_signed, royalty_rate));
        if let Some(previous) = previous {
            uow.remove(previous);
        }
        uow.graph_mut().set_contract_author(contract, Some(author));
        uow.commit(&mut self.store)?;
        uow.graph().id(contract).ok_or_else(missing_after_commit)
    }

    /// Removes one entity by id, with its cascades.
    ///
    /// # Errors
    /// - `NotFound` when the id is missing.
    /// - `Integrity(RestrictedRemoval)` when surviving books still refer to it.
    pub fn delete<T: Entity>(&mut self, id: EntityId) -> CatalogResult<CommitSummary> {
        let mut uow = UnitOfWork::begin(&self.store)?;
        let key = uow.require::<T>(id)?;
        uow.remove(key);
        let summary = uow.commit(&mut self.store)?;
        info!(
            "event=entity_delete module=service status=ok entity={} id={id} removed={}",
            T::KIND,
            summary.removed
        );
        Ok(summary)
    }

    pub fn book_detail(&self, book_id: EntityId) -> CatalogResult<BookDetail> {
        let graph = self.store.load()?;
        graph
            .find::<Book>(book_id)
            .and_then(|key| BookDetail::from_graph(&graph, key))
            .ok_or_else(|| CatalogError::not_found(Book::KIND, book_id))
    }

    /// Runs a read request through the query dispatcher.
    pub fn query(&self, request: &QueryRequest) -> CatalogResult<QueryOutput> {
        let graph = self.store.load()?;
        Ok(self.dispatcher.dispatch(&graph, request))
    }
}

fn missing_after_commit() -> CatalogError {
    CatalogError::Store(StoreError::InvalidData(
        "committed entity has no id".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::{CatalogService, NewBook};
    use crate::error::{CatalogError, IntegrityViolation};
    use crate::model::{Author, Book, EntityKind, Genre};
    use crate::store::MemoryCatalogStore;
    use crate::uow::UnitOfWork;
    use chrono::{TimeZone, Utc};

    fn service_with_author_and_genre() -> (CatalogService<MemoryCatalogStore>, i64, i64) {
        let mut store = MemoryCatalogStore::new();
        let mut uow = UnitOfWork::new();
        let author = uow.add(Author::new("Ana María", "Matute", ""));
        let genre = uow.add(Genre::new("Novela"));
        uow.commit(&mut store).unwrap();
        let author = uow.graph().id(author).unwrap();
        let genre = uow.graph().id(genre).unwrap();
        (CatalogService::new(store), author, genre)
    }

    fn new_book(author_id: i64, genre_ids: Vec<i64>) -> NewBook {
        NewBook {
            title: "Olvidado Rey Gudú".into(),
            isbn: "978-84-670-1234-5".into(),
            publication_date: Utc.with_ymd_and_hms(1996, 1, 1, 0, 0, 0).unwrap(),
            author_id,
            series_id: None,
            publisher_id: None,
            genre_ids,
            editor_ids: Vec::new(),
        }
    }

    #[test]
    fn create_book_links_author_and_genres() {
        let (mut service, author, genre) = service_with_author_and_genre();
        let summary = service.create_book(new_book(author, vec![genre])).unwrap();
        assert_eq!(summary.author_name.as_deref(), Some("Ana María Matute"));

        let detail = service.book_detail(summary.id.unwrap()).unwrap();
        assert_eq!(detail.genres.len(), 1);
        assert_eq!(detail.genres[0].name, "Novela");
    }

    #[test]
    fn create_book_with_unknown_genre_is_not_found() {
        let (mut service, author, _) = service_with_author_and_genre();
        assert!(matches!(
            service.create_book(new_book(author, vec![404])),
            Err(CatalogError::NotFound { entity: EntityKind::Genre, id: 404 })
        ));
        assert_eq!(service.store().row_count(EntityKind::Book), 0);
    }

    #[test]
    fn genre_delete_is_restricted_while_books_use_it() {
        let (mut service, author, genre) = service_with_author_and_genre();
        let book = service.create_book(new_book(author, vec![genre])).unwrap();

        assert!(matches!(
            service.delete::<Genre>(genre),
            Err(CatalogError::Integrity(IntegrityViolation::RestrictedRemoval { .. }))
        ));
        service.delete::<Book>(book.id.unwrap()).unwrap();
        service.delete::<Genre>(genre).unwrap();
        assert_eq!(service.store().row_count(EntityKind::Genre), 0);
    }

    #[test]
    fn signing_again_replaces_the_contract() {
        let (mut service, author, _) = service_with_author_and_genre();
        let date = Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap();
        let first = service.sign_contract(author, date, 0.1).unwrap();
        let second = service.sign_contract(author, date, 0.15).unwrap();

        assert_ne!(first, second);
        assert_eq!(service.store().row_count(EntityKind::Contract), 1);
        assert!(service.store().row(EntityKind::Contract, first).is_none());
    }
}
