use bookshelf_core::model::ROLE_ADMIN;
use bookshelf_core::{
    Author, Book, CatalogError, CatalogStore, Comment, Contract, Editor, EntityKind, Genre,
    Publisher, Review, Series, SqliteCatalogStore, StoreError, UnitOfWork, User,
};
use chrono::{TimeZone, Utc};

fn count(store: &SqliteCatalogStore, table: &str) -> i64 {
    store
        .connection()
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .unwrap()
}

#[test]
fn full_graph_round_trips() {
    let mut store = SqliteCatalogStore::open_in_memory().unwrap();
    let published = Utc.with_ymd_and_hms(1951, 6, 1, 10, 30, 0).unwrap();
    let signed = Utc.with_ymd_and_hms(2021, 2, 3, 4, 5, 6).unwrap();

    let mut uow = UnitOfWork::new();
    let author = uow.add(Author::new("Isaac", "Asimov", "Bioquímico y divulgador."));
    let contract = uow.create(Contract::new(signed, 0.15));
    let series = uow.add(Series::new("El Ciclo de la Fundación", "Imperio Galáctico"));
    let publisher = uow.add(Publisher::new("Debolsillo", "Madrid"));
    let genre = uow.add(Genre::new("Ciencia Ficción"));
    let editor = uow.add(Editor::new("Mario Lacruz"));
    let book = uow.add(Book::new("Fundación", "9788497599245", published));
    let review = uow.add(Review::with_created_at(5, "Clásico.", signed));
    let comment = uow.add(Comment::with_created_at("Cierto.", signed));
    let mut admin = User::new("admin@editorial.com", "AdminUser", "sha256$s$d");
    admin.add_role(ROLE_ADMIN);
    let admin = uow.add(admin);
    let reader = uow.add(User::new("lucia@lectores.es", "lucia", "sha256$s$d"));

    let graph = uow.graph_mut();
    graph.set_contract_author(contract, Some(author));
    graph.set_book_author(book, Some(author));
    graph.set_book_series(book, Some(series));
    graph.set_book_publisher(book, Some(publisher));
    graph.add_book_genre(book, genre);
    graph.add_book_editor(book, editor);
    graph.set_review_book(review, Some(book));
    graph.set_comment_review(comment, Some(review));
    graph.follow(reader, admin);
    let summary = uow.commit(&mut store).unwrap();
    assert_eq!(summary.inserted, 11);

    let loaded = store.load().unwrap();
    let book_id = uow.graph().id(book).unwrap();
    let book = loaded.find::<Book>(book_id).unwrap();
    let stored = loaded.get(book).unwrap();
    assert_eq!(stored.title(), "Fundación");
    assert_eq!(stored.publication_date(), published);
    assert_eq!(loaded.get(stored.author().unwrap()).unwrap().full_name(), "Isaac Asimov");
    assert_eq!(loaded.get(stored.series().unwrap()).unwrap().name(), "El Ciclo de la Fundación");
    assert_eq!(loaded.get(stored.publisher().unwrap()).unwrap().city(), "Madrid");
    assert_eq!(loaded.get(stored.genres()[0]).unwrap().name(), "Ciencia Ficción");
    assert_eq!(loaded.get(stored.editors()[0]).unwrap().books(), &[book]);

    let review = stored.reviews()[0];
    assert_eq!(loaded.get(review).unwrap().created_at(), signed);
    let comment = loaded.get(review).unwrap().comments()[0];
    assert_eq!(loaded.get(comment).unwrap().content(), "Cierto.");

    let author = stored.author().unwrap();
    let contract = loaded.get(author).unwrap().contract().unwrap();
    assert_eq!(loaded.get(contract).unwrap().royalty_rate(), 0.15);
    assert_eq!(loaded.get(contract).unwrap().date_signed(), signed);

    let admin = loaded.find::<User>(uow.graph().id(admin).unwrap()).unwrap();
    let reader = loaded.find::<User>(uow.graph().id(reader).unwrap()).unwrap();
    assert!(loaded.get(admin).unwrap().has_role(ROLE_ADMIN));
    assert_eq!(loaded.following(reader), vec![admin]);
    assert_eq!(loaded.followers(admin), vec![reader]);
    assert!(loaded.following(admin).is_empty());
}

#[test]
fn unique_violation_rolls_back_whole_commit() {
    let mut store = SqliteCatalogStore::open_in_memory().unwrap();
    let mut stale = UnitOfWork::begin(&store).unwrap();

    let mut fresh = UnitOfWork::begin(&store).unwrap();
    fresh.add(User::new("dup@editorial.com", "first", "h"));
    fresh.commit(&mut store).unwrap();

    let genre = stale.add(Genre::new("Poesía"));
    let user = stale.add(User::new("dup@editorial.com", "second", "h"));
    let err = stale.commit(&mut store).unwrap_err();

    assert!(matches!(
        err,
        CatalogError::Conflict {
            entity: EntityKind::User,
            ..
        }
    ));
    assert_eq!(count(&store, "genre"), 0);
    assert_eq!(count(&store, "app_user"), 1);
    assert_eq!(stale.graph().id(genre), None);
    assert_eq!(stale.graph().id(user), None);
}

#[test]
fn deleting_row_removed_elsewhere_fails_atomically() {
    let mut store = SqliteCatalogStore::open_in_memory().unwrap();
    let mut setup = UnitOfWork::new();
    let genre = setup.add(Genre::new("Ensayo"));
    setup.commit(&mut store).unwrap();
    let genre_id = setup.graph().id(genre).unwrap();

    let mut stale = UnitOfWork::begin(&store).unwrap();
    let mut other = UnitOfWork::begin(&store).unwrap();
    let key = other.require::<Genre>(genre_id).unwrap();
    other.remove(key);
    other.commit(&mut store).unwrap();

    let key = stale.require::<Genre>(genre_id).unwrap();
    stale.remove(key);
    stale.add(Editor::new("Jorge Herralde"));
    let err = stale.commit(&mut store).unwrap_err();

    assert!(matches!(
        err,
        CatalogError::Store(StoreError::MissingRow {
            entity: EntityKind::Genre,
            ..
        })
    ));
    assert_eq!(count(&store, "editor"), 0);
}

#[test]
fn book_delete_cascades_through_schema() {
    let mut store = SqliteCatalogStore::open_in_memory().unwrap();
    let date = Utc.with_ymd_and_hms(2004, 1, 1, 0, 0, 0).unwrap();
    let mut uow = UnitOfWork::new();
    let author = uow.add(Author::new("Carlos", "Ruiz Zafón", ""));
    let genre = uow.add(Genre::new("Misterio"));
    let book = uow.add(Book::new("La Sombra del Viento", "9788408163435", date));
    let review = uow.add(Review::new(5, "Magnífica."));
    let comment = uow.add(Comment::new("Sí."));
    let graph = uow.graph_mut();
    graph.set_book_author(book, Some(author));
    graph.add_book_genre(book, genre);
    graph.set_review_book(review, Some(book));
    graph.set_comment_review(comment, Some(review));
    uow.commit(&mut store).unwrap();

    uow.remove(book);
    uow.commit(&mut store).unwrap();

    assert_eq!(count(&store, "book"), 0);
    assert_eq!(count(&store, "book_genre"), 0);
    assert_eq!(count(&store, "review"), 0);
    assert_eq!(count(&store, "comment"), 0);
    assert_eq!(count(&store, "genre"), 1);
    assert_eq!(count(&store, "author"), 1);
}

#[test]
fn on_disk_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bookshelf.sqlite3");

    let genre_id = {
        let mut store = SqliteCatalogStore::open(&path).unwrap();
        let mut uow = UnitOfWork::new();
        let genre = uow.add(Genre::new("Terror Gótico"));
        uow.commit(&mut store).unwrap();
        uow.graph().id(genre).unwrap()
    };

    let store = SqliteCatalogStore::open(&path).unwrap();
    let graph = store.load().unwrap();
    let genre = graph.find::<Genre>(genre_id).unwrap();
    assert_eq!(graph.get(genre).unwrap().name(), "Terror Gótico");
}

#[test]
fn schema_rejects_self_follow_rows() {
    let store = SqliteCatalogStore::open_in_memory().unwrap();
    store
        .connection()
        .execute(
            "INSERT INTO app_user (email, username, password, roles) VALUES ('a@b.es', 'a', 'h', '[]')",
            [],
        )
        .unwrap();
    let result = store.connection().execute(
        "INSERT INTO user_follow (follower_id, followed_id) VALUES (1, 1)",
        [],
    );
    assert!(result.is_err());
}
