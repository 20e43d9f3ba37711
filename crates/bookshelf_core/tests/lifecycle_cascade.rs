use bookshelf_core::{
    Author, Book, CatalogError, CatalogStore, Comment, Contract, EntityKind, EntityState, Genre,
    IntegrityViolation, Key, MemoryCatalogStore, Publisher, Review, Series, UnitOfWork, User,
};
use chrono::{TimeZone, Utc};

struct Catalog {
    store: MemoryCatalogStore,
    author: i64,
    series: i64,
    genre: i64,
    book: i64,
}

fn seeded() -> Catalog {
    let mut store = MemoryCatalogStore::new();
    let mut uow = UnitOfWork::new();
    let author = uow.add(Author::new("Dolores", "Redondo", ""));
    let series = uow.add(Series::new("La Trilogía del Baztán", ""));
    let genre = uow.add(Genre::new("Novela Negra"));
    let date = Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap();
    let book = uow.add(Book::new("El Guardián Invisible", "9788423346264", date));

    let graph = uow.graph_mut();
    graph.set_book_author(book, Some(author));
    graph.set_book_series(book, Some(series));
    graph.add_book_genre(book, genre);

    for rating in 1..=3 {
        let review = uow.add(Review::new(rating, "Reseña"));
        uow.graph_mut().set_review_book(review, Some(book));
        for _ in 0..2 {
            let comment = uow.add(Comment::new("Comentario"));
            uow.graph_mut().set_comment_review(comment, Some(review));
        }
    }
    uow.commit(&mut store).unwrap();

    let graph = uow.graph();
    Catalog {
        author: graph.id(author).unwrap(),
        series: graph.id(series).unwrap(),
        genre: graph.id(genre).unwrap(),
        book: graph.id(book).unwrap(),
        store,
    }
}

#[test]
fn removing_book_cascades_to_reviews_and_comments_only() {
    let mut catalog = seeded();
    assert_eq!(catalog.store.row_count(EntityKind::Review), 3);
    assert_eq!(catalog.store.row_count(EntityKind::Comment), 6);

    let mut uow = UnitOfWork::begin(&catalog.store).unwrap();
    let book = uow.require::<Book>(catalog.book).unwrap();
    uow.remove(book);
    let summary = uow.commit(&mut catalog.store).unwrap();

    assert_eq!(summary.removed, 1 + 3 + 6);
    assert_eq!(catalog.store.row_count(EntityKind::Book), 0);
    assert_eq!(catalog.store.row_count(EntityKind::Review), 0);
    assert_eq!(catalog.store.row_count(EntityKind::Comment), 0);
    assert!(catalog.store.row(EntityKind::Author, catalog.author).is_some());
    assert!(catalog.store.row(EntityKind::Series, catalog.series).is_some());
    assert!(catalog.store.row(EntityKind::Genre, catalog.genre).is_some());
    assert!(uow.graph().find::<Book>(catalog.book).is_none());
}

#[test]
fn removing_referenced_genre_is_restricted_and_store_unchanged() {
    let mut catalog = seeded();
    let before = catalog.store.clone();

    let mut uow = UnitOfWork::begin(&catalog.store).unwrap();
    let genre = uow.require::<Genre>(catalog.genre).unwrap();
    uow.remove(genre);
    let err = uow.commit(&mut catalog.store).unwrap_err();

    match err {
        CatalogError::Integrity(IntegrityViolation::RestrictedRemoval {
            entity,
            referenced_by,
            count,
            ..
        }) => {
            assert_eq!(entity, EntityKind::Genre);
            assert_eq!(referenced_by, EntityKind::Book);
            assert_eq!(count, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(catalog.store, before);
    assert_eq!(uow.state(genre), Some(EntityState::StagedRemove));
}

#[test]
fn removing_author_with_books_is_restricted() {
    let mut catalog = seeded();
    let mut uow = UnitOfWork::begin(&catalog.store).unwrap();
    let author = uow.require::<Author>(catalog.author).unwrap();
    uow.remove(author);

    assert!(matches!(
        uow.commit(&mut catalog.store),
        Err(CatalogError::Integrity(IntegrityViolation::RestrictedRemoval {
            entity: EntityKind::Author,
            ..
        }))
    ));
}

#[test]
fn author_contract_cascades_on_persist_and_remove() {
    let mut store = MemoryCatalogStore::new();
    let mut uow = UnitOfWork::new();
    let author = uow.add(Author::new("Carmen", "Laforet", ""));
    let date = Utc.with_ymd_and_hms(2019, 9, 1, 0, 0, 0).unwrap();
    let contract = uow.create(Contract::new(date, 0.12));
    uow.graph_mut().set_contract_author(contract, Some(author));
    assert_eq!(uow.state(contract), Some(EntityState::New));

    uow.commit(&mut store).unwrap();
    assert_eq!(uow.state(contract), Some(EntityState::Managed));
    assert_eq!(store.row_count(EntityKind::Contract), 1);

    uow.remove(author);
    uow.commit(&mut store).unwrap();
    assert_eq!(store.row_count(EntityKind::Author), 0);
    assert_eq!(store.row_count(EntityKind::Contract), 0);
}

#[test]
fn managed_review_detached_from_book_is_orphan_removed() {
    let mut catalog = seeded();
    let mut uow = UnitOfWork::begin(&catalog.store).unwrap();
    let book = uow.require::<Book>(catalog.book).unwrap();
    let review = uow.graph().get(book).unwrap().reviews()[0];

    assert!(uow.graph_mut().remove_book_review(book, review));
    uow.commit(&mut catalog.store).unwrap();

    assert_eq!(catalog.store.row_count(EntityKind::Review), 2);
    assert_eq!(catalog.store.row_count(EntityKind::Comment), 4);
}

#[test]
fn removing_publisher_removes_its_books() {
    let mut catalog = seeded();
    let mut uow = UnitOfWork::begin(&catalog.store).unwrap();
    let publisher = uow.add(Publisher::new("Destino", "Barcelona"));
    let book = uow.require::<Book>(catalog.book).unwrap();
    uow.graph_mut().set_book_publisher(book, Some(publisher));
    uow.commit(&mut catalog.store).unwrap();

    uow.remove(publisher);
    uow.commit(&mut catalog.store).unwrap();
    assert_eq!(catalog.store.row_count(EntityKind::Publisher), 0);
    assert_eq!(catalog.store.row_count(EntityKind::Book), 0);
    assert_eq!(catalog.store.row_count(EntityKind::Review), 0);
}

#[test]
fn unstaged_new_entity_reference_is_rejected() {
    let mut catalog = seeded();
    let mut uow = UnitOfWork::begin(&catalog.store).unwrap();
    let book = uow.require::<Book>(catalog.book).unwrap();
    let genre = uow.create(Genre::new("Terror Gótico"));
    uow.graph_mut().add_book_genre(book, genre);

    assert!(matches!(
        uow.commit(&mut catalog.store),
        Err(CatalogError::Integrity(IntegrityViolation::UnstagedReference {
            to: EntityKind::Genre,
            ..
        }))
    ));
    assert_eq!(catalog.store.row_count(EntityKind::Genre), 1);

    uow.persist(genre);
    uow.commit(&mut catalog.store).unwrap();
    assert_eq!(catalog.store.row_count(EntityKind::Genre), 2);
}

#[test]
fn new_review_without_book_is_a_validation_error() {
    let mut store = MemoryCatalogStore::new();
    let mut uow = UnitOfWork::new();
    uow.add(Review::new(4, "Sin libro"));

    assert!(matches!(
        uow.commit(&mut store),
        Err(CatalogError::Validation(_))
    ));
    assert_eq!(store.row_count(EntityKind::Review), 0);
}

#[test]
fn rating_out_of_range_is_rejected() {
    let mut catalog = seeded();
    let mut uow = UnitOfWork::begin(&catalog.store).unwrap();
    let book = uow.require::<Book>(catalog.book).unwrap();
    let review = uow.add(Review::new(6, "Demasiado"));
    uow.graph_mut().set_review_book(review, Some(book));

    assert!(matches!(
        uow.commit(&mut catalog.store),
        Err(CatalogError::Validation(err)) if err.field == "rating"
    ));
}

#[test]
fn duplicate_isbn_and_email_conflict_at_commit() {
    let mut catalog = seeded();
    let mut uow = UnitOfWork::begin(&catalog.store).unwrap();
    let author = uow.require::<Author>(catalog.author).unwrap();
    let date = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
    let copy = uow.add(Book::new("Legado en los Huesos", "9788423346264", date));
    uow.graph_mut().set_book_author(copy, Some(author));

    assert!(matches!(
        uow.commit(&mut catalog.store),
        Err(CatalogError::Conflict { entity: EntityKind::Book, .. })
    ));

    let mut uow = UnitOfWork::begin(&catalog.store).unwrap();
    uow.add(User::new("ana@editorial.com", "ana", "h"));
    uow.add(User::new("ANA@editorial.com", "ana2", "h"));
    assert!(matches!(
        uow.commit(&mut catalog.store),
        Err(CatalogError::Conflict { entity: EntityKind::User, .. })
    ));
}

#[test]
fn failed_commit_keeps_ids_unassigned_and_retry_succeeds() {
    let mut store = MemoryCatalogStore::new();
    let mut uow = UnitOfWork::new();
    let genre = uow.add(Genre::new(""));

    assert!(uow.commit(&mut store).is_err());
    assert_eq!(uow.graph().id(genre), None);
    assert_eq!(uow.state(genre), Some(EntityState::StagedPersist));

    uow.graph_mut().get_mut(genre).unwrap().set_name("Ensayo Filosófico");
    uow.commit(&mut store).unwrap();
    assert!(uow.graph().id(genre).is_some());
    assert!(!uow.has_pending_changes());
}

#[test]
fn scalar_edit_on_managed_entity_is_written_as_update() {
    let mut catalog = seeded();
    let mut uow = UnitOfWork::begin(&catalog.store).unwrap();
    let genre: Key<Genre> = uow.require(catalog.genre).unwrap();
    uow.graph_mut().get_mut(genre).unwrap().set_name("Thriller");

    let summary = uow.commit(&mut catalog.store).unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.inserted, 0);

    let graph = catalog.store.load().unwrap();
    let reloaded = graph.find::<Genre>(catalog.genre).unwrap();
    assert_eq!(graph.get(reloaded).unwrap().name(), "Thriller");
}
