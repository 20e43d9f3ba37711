use bookshelf_core::query::{
    CatalogReader, QueryHandler, SearchGenresByTerm, GENRE_SEARCH_LIMIT, SEARCH_BOOKS_BY_TITLE,
    SEARCH_GENRES_BY_TERM,
};
use bookshelf_core::{
    Author, Book, CatalogService, DispatchError, EntityGraph, EntityKind, Genre,
    MemoryCatalogStore, QueryDispatcher, QueryOutput, QueryRequest, UnitOfWork,
};
use chrono::{TimeZone, Utc};
use std::sync::Arc;

fn catalog(titles: &[&str], genres: &[&str]) -> EntityGraph {
    let mut store = MemoryCatalogStore::new();
    let mut uow = UnitOfWork::new();
    let author = uow.add(Author::new("Carlos", "Ruiz Zafón", ""));
    let date = Utc.with_ymd_and_hms(2001, 4, 1, 0, 0, 0).unwrap();
    for (position, title) in titles.iter().enumerate() {
        let book = uow.add(Book::new(*title, format!("978840800{position:04}"), date));
        uow.graph_mut().set_book_author(book, Some(author));
    }
    for name in genres {
        uow.add(Genre::new(*name));
    }
    uow.commit(&mut store).unwrap();
    uow.into_graph()
}

fn book_titles(output: QueryOutput) -> Vec<String> {
    match output {
        QueryOutput::Books(books) => books.into_iter().map(|book| book.title).collect(),
        other => panic!("expected books, got {other:?}"),
    }
}

fn genre_names(output: QueryOutput) -> Vec<String> {
    match output {
        QueryOutput::Genres(genres) => genres.into_iter().map(|genre| genre.name).collect(),
        other => panic!("expected genres, got {other:?}"),
    }
}

#[test]
fn title_search_is_case_insensitive_substring() {
    let graph = catalog(&["La Saga del Mar", "El Viaje"], &[]);
    let dispatcher = QueryDispatcher::with_default_handlers(GENRE_SEARCH_LIMIT);
    let request =
        QueryRequest::operation(EntityKind::Book, SEARCH_BOOKS_BY_TITLE).with_arg("title", "saga");

    assert_eq!(
        book_titles(dispatcher.dispatch(&graph, &request)),
        vec!["La Saga del Mar"]
    );
}

#[test]
fn blank_or_missing_title_returns_empty() {
    let graph = catalog(&["La Saga del Mar", "El Viaje"], &[]);
    let dispatcher = QueryDispatcher::with_default_handlers(GENRE_SEARCH_LIMIT);

    let blank =
        QueryRequest::operation(EntityKind::Book, SEARCH_BOOKS_BY_TITLE).with_arg("title", "");
    assert!(book_titles(dispatcher.dispatch(&graph, &blank)).is_empty());

    let missing = QueryRequest::operation(EntityKind::Book, SEARCH_BOOKS_BY_TITLE);
    assert!(book_titles(dispatcher.dispatch(&graph, &missing)).is_empty());
}

#[test]
fn title_whitespace_is_part_of_the_fragment() {
    let graph = catalog(&["La Saga del Mar", "Marea", "El Viaje"], &[]);
    let dispatcher = QueryDispatcher::with_default_handlers(GENRE_SEARCH_LIMIT);

    let spaced =
        QueryRequest::operation(EntityKind::Book, SEARCH_BOOKS_BY_TITLE).with_arg("title", " ");
    assert_eq!(
        book_titles(dispatcher.dispatch(&graph, &spaced)),
        vec!["La Saga del Mar", "El Viaje"]
    );

    let padded =
        QueryRequest::operation(EntityKind::Book, SEARCH_BOOKS_BY_TITLE).with_arg("title", " mar");
    assert_eq!(
        book_titles(dispatcher.dispatch(&graph, &padded)),
        vec!["La Saga del Mar"]
    );
}

#[test]
fn missing_genre_term_returns_empty() {
    let graph = catalog(&[], &["Ciencia Ficción", "Poesía"]);
    let dispatcher = QueryDispatcher::with_default_handlers(GENRE_SEARCH_LIMIT);
    let request = QueryRequest::operation(EntityKind::Genre, SEARCH_GENRES_BY_TERM);

    assert_eq!(
        dispatcher.dispatch(&graph, &request),
        QueryOutput::Genres(vec![])
    );
}

#[test]
fn empty_genre_term_lists_every_genre_capped_and_ordered() {
    let mut names = (0..12).map(|n| format!("Novela {n:02}")).collect::<Vec<_>>();
    names.push("Ciencia Ficción".to_string());
    let refs = names.iter().map(String::as_str).collect::<Vec<_>>();
    let graph = catalog(&[], &refs);
    let dispatcher = QueryDispatcher::with_default_handlers(GENRE_SEARCH_LIMIT);
    let request =
        QueryRequest::operation(EntityKind::Genre, SEARCH_GENRES_BY_TERM).with_arg("term", "");

    let found = genre_names(dispatcher.dispatch(&graph, &request));
    assert_eq!(found.len(), GENRE_SEARCH_LIMIT);
    assert_eq!(found.first().map(String::as_str), Some("Ciencia Ficción"));
    assert_eq!(found.last().map(String::as_str), Some("Novela 08"));
}

#[test]
fn genre_term_keeps_trailing_whitespace() {
    let graph = catalog(&[], &["Ciencia Ficción", "Ficción Histórica", "Poesía"]);
    let dispatcher = QueryDispatcher::with_default_handlers(GENRE_SEARCH_LIMIT);
    let request = QueryRequest::operation(EntityKind::Genre, SEARCH_GENRES_BY_TERM)
        .with_arg("term", "Ficción ");

    assert_eq!(
        genre_names(dispatcher.dispatch(&graph, &request)),
        vec!["Ficción Histórica"]
    );
}

#[test]
fn search_sent_to_wrong_resource_falls_through_to_listing() {
    let graph = catalog(&["La Saga del Mar"], &["Poesía", "Novela Negra"]);
    let dispatcher = QueryDispatcher::with_default_handlers(GENRE_SEARCH_LIMIT);

    let books_on_genre =
        QueryRequest::operation(EntityKind::Genre, SEARCH_BOOKS_BY_TITLE).with_arg("title", "saga");
    match dispatcher.dispatch(&graph, &books_on_genre) {
        QueryOutput::Collection(items) => {
            assert_eq!(items.len(), 2);
            assert!(items.iter().all(|item| item.kind == EntityKind::Genre));
        }
        other => panic!("expected collection, got {other:?}"),
    }

    let genres_on_book =
        QueryRequest::operation(EntityKind::Book, SEARCH_GENRES_BY_TERM).with_arg("term", "poe");
    assert!(SearchGenresByTerm::default()
        .handle(&graph, &genres_on_book)
        .is_none());
    assert!(matches!(
        dispatcher.dispatch(&graph, &genres_on_book),
        QueryOutput::Collection(items) if items.len() == 1 && items[0].kind == EntityKind::Book
    ));
}

#[test]
fn title_search_matches_unicode_case() {
    let graph = catalog(&["ÁNGELES Y DEMONIOS", "El Juego del Ángel"], &[]);
    let titles = graph
        .books_by_title_fragment("ángel")
        .into_iter()
        .map(|book| book.title)
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["ÁNGELES Y DEMONIOS", "El Juego del Ángel"]);
}

#[test]
fn genre_search_orders_by_name() {
    let graph = catalog(&[], &["Poesía", "Ficción Histórica", "Ciencia Ficción"]);
    let dispatcher = QueryDispatcher::with_default_handlers(GENRE_SEARCH_LIMIT);
    let request =
        QueryRequest::operation(EntityKind::Genre, SEARCH_GENRES_BY_TERM).with_arg("term", "fic");

    assert_eq!(
        genre_names(dispatcher.dispatch(&graph, &request)),
        vec!["Ciencia Ficción", "Ficción Histórica"]
    );
}

#[test]
fn genre_search_is_capped() {
    let names = (0..14).map(|n| format!("Ficción {n:02}")).collect::<Vec<_>>();
    let refs = names.iter().map(String::as_str).collect::<Vec<_>>();
    let graph = catalog(&[], &refs);

    let request =
        QueryRequest::operation(EntityKind::Genre, SEARCH_GENRES_BY_TERM).with_arg("term", "FIC");
    let found = genre_names(SearchGenresByTerm::default().handle(&graph, &request).unwrap());
    assert_eq!(found.len(), GENRE_SEARCH_LIMIT);
    assert_eq!(found.first().map(String::as_str), Some("Ficción 00"));
    assert_eq!(found.last().map(String::as_str), Some("Ficción 09"));

    let narrow = SearchGenresByTerm::new(3).handle(&graph, &request).unwrap();
    assert_eq!(narrow.len(), 3);
}

#[test]
fn handlers_ignore_requests_for_other_operations() {
    let graph = catalog(&[], &["Poesía"]);
    let request = QueryRequest::operation(EntityKind::Genre, "somethingElse");
    assert!(SearchGenresByTerm::default().handle(&graph, &request).is_none());
}

#[test]
fn unmatched_requests_fall_through_to_collection_listing() {
    let graph = catalog(&["El Viaje"], &["Poesía", "Novela Negra"]);
    let dispatcher = QueryDispatcher::with_default_handlers(GENRE_SEARCH_LIMIT);

    match dispatcher.dispatch(&graph, &QueryRequest::collection(EntityKind::Genre)) {
        QueryOutput::Collection(items) => {
            let labels = items.iter().map(|item| item.label.as_str()).collect::<Vec<_>>();
            assert_eq!(labels, vec!["Poesía", "Novela Negra"]);
            assert!(items.iter().all(|item| item.kind == EntityKind::Genre));
        }
        other => panic!("expected collection, got {other:?}"),
    }

    // Unknown operations list the addressed resource.
    let unknown = QueryRequest::operation(EntityKind::Book, "topRated");
    assert!(matches!(
        dispatcher.dispatch(&graph, &unknown),
        QueryOutput::Collection(items) if items.len() == 1
    ));
}

#[test]
fn registering_same_operation_twice_is_rejected() {
    let mut dispatcher = QueryDispatcher::with_default_handlers(GENRE_SEARCH_LIMIT);
    let err = dispatcher
        .register(Arc::new(SearchGenresByTerm::new(5)))
        .unwrap_err();
    assert_eq!(
        err,
        DispatchError::DuplicateOperation(SEARCH_GENRES_BY_TERM.to_string())
    );
    assert_eq!(
        dispatcher.operation_names(),
        vec![SEARCH_BOOKS_BY_TITLE, SEARCH_GENRES_BY_TERM]
    );
}

#[test]
fn query_output_serializes_with_type_tag() {
    let graph = catalog(&["La Saga del Mar"], &[]);
    let dispatcher = QueryDispatcher::with_default_handlers(GENRE_SEARCH_LIMIT);
    let request =
        QueryRequest::operation(EntityKind::Book, SEARCH_BOOKS_BY_TITLE).with_arg("title", "mar");

    let json = serde_json::to_value(dispatcher.dispatch(&graph, &request)).unwrap();
    assert_eq!(json["type"], "books");
    assert_eq!(json["items"][0]["authorName"], "Carlos Ruiz Zafón");
}

#[test]
fn catalog_service_queries_through_store() {
    let mut store = MemoryCatalogStore::new();
    let mut uow = UnitOfWork::new();
    uow.add(Genre::new("Fantasía Épica"));
    uow.commit(&mut store).unwrap();

    let service = CatalogService::new(store);
    let output = service
        .query(
            &QueryRequest::operation(EntityKind::Genre, SEARCH_GENRES_BY_TERM)
                .with_arg("term", "épica"),
        )
        .unwrap();
    assert_eq!(genre_names(output), vec!["Fantasía Épica"]);
}
