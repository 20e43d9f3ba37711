use bookshelf_core::fixtures::{ADMIN_EMAIL, EDITOR_EMAIL, SEED_PASSWORD};
use bookshelf_core::model::ROLE_ADMIN;
use bookshelf_core::query::{CatalogReader, GENRE_SEARCH_LIMIT};
use bookshelf_core::{
    authenticate, seed_catalog, Author, Book, CatalogStore, Contract, EntityKind,
    MemoryCatalogStore, Sha256PasswordHasher, SqliteCatalogStore, User,
};

#[test]
fn seed_populates_every_kind_consistently() {
    let mut store = MemoryCatalogStore::new();
    let summary = seed_catalog(&mut store, &Sha256PasswordHasher).unwrap();

    assert!(!summary.already_seeded);
    assert_eq!(summary.authors, 15);
    assert_eq!(summary.contracts, 15);
    assert_eq!(summary.genres, 8);
    assert_eq!(store.row_count(EntityKind::Book), summary.books);
    assert_eq!(store.row_count(EntityKind::Review), summary.reviews);
    assert_eq!(store.row_count(EntityKind::Comment), summary.comments);
    assert_eq!(store.row_count(EntityKind::User), summary.users);

    let graph = store.load().unwrap();
    for (key, book) in graph.iter::<Book>() {
        let author = book.author().unwrap();
        assert!(graph.get(author).unwrap().books().contains(&key));
        assert!(!book.genres().is_empty());
    }
    for (key, author) in graph.iter::<Author>() {
        let contract = author.contract().unwrap();
        assert_eq!(graph.get::<Contract>(contract).unwrap().author(), Some(key));
    }
    for (key, _) in graph.iter::<User>() {
        assert!(!graph.is_following(key, key));
    }
    assert_eq!(graph.follows().edge_count(), summary.follows);
}

#[test]
fn seed_users_have_expected_roles_and_password() {
    let mut store = MemoryCatalogStore::new();
    seed_catalog(&mut store, &Sha256PasswordHasher).unwrap();
    let graph = store.load().unwrap();

    let admin = authenticate(&graph, &Sha256PasswordHasher, ADMIN_EMAIL, SEED_PASSWORD).unwrap();
    assert!(graph.get(admin).unwrap().has_role(ROLE_ADMIN));

    let editor = authenticate(&graph, &Sha256PasswordHasher, EDITOR_EMAIL, SEED_PASSWORD).unwrap();
    assert!(!graph.get(editor).unwrap().has_role(ROLE_ADMIN));
}

#[test]
fn seeding_twice_is_a_no_op() {
    let mut store = MemoryCatalogStore::new();
    seed_catalog(&mut store, &Sha256PasswordHasher).unwrap();
    let before = store.clone();

    let again = seed_catalog(&mut store, &Sha256PasswordHasher).unwrap();
    assert!(again.already_seeded);
    assert_eq!(store, before);
}

#[test]
fn seeded_sqlite_catalog_answers_searches() {
    let mut store = SqliteCatalogStore::open_in_memory().unwrap();
    seed_catalog(&mut store, &Sha256PasswordHasher).unwrap();
    let graph = store.load().unwrap();

    let sagas = graph.books_by_title_fragment("saga");
    assert_eq!(sagas.len(), 1);
    assert_eq!(sagas[0].title, "La Saga del Mar");

    let genres = graph.genres_by_term("ficción", GENRE_SEARCH_LIMIT);
    let names = genres.iter().map(|genre| genre.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Ciencia Ficción", "Ficción Histórica"]);
}
