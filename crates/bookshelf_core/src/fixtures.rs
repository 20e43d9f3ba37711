//! Deterministic seed dataset.
//!
//! Every run over an empty store produces the same rows in the same order.
//! Seeding a store that already holds the admin user is a no-op.

use crate::auth::PasswordHasher;
use crate::error::CatalogResult;
use crate::model::{
    Author, Book, Comment, Contract, Editor, Genre, Key, Publisher, Review, Series, User,
    ROLE_ADMIN, ROLE_USER,
};
use crate::store::CatalogStore;
use crate::uow::UnitOfWork;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::info;

pub const ADMIN_EMAIL: &str = "admin@editorial.com";
pub const EDITOR_EMAIL: &str = "editor@editorial.com";
pub const SEED_PASSWORD: &str = "password";

const PUBLISHERS: [(&str, &str); 10] = [
    ("Editorial Planeta", "Barcelona"),
    ("Alfaguara", "Madrid"),
    ("Tusquets Editores", "Barcelona"),
    ("Anagrama", "Barcelona"),
    ("Seix Barral", "Barcelona"),
    ("RBA", "Barcelona"),
    ("Grijalbo", "Barcelona"),
    ("Debolsillo", "Madrid"),
    ("Siruela", "Madrid"),
    ("Punto de Lectura", "Madrid"),
];

const GENRES: [&str; 8] = [
    "Novela Negra",
    "Ficción Histórica",
    "Ciencia Ficción",
    "Fantasía Épica",
    "Autoayuda y Desarrollo Personal",
    "Poesía",
    "Ensayo Filosófico",
    "Terror Gótico",
];

const EDITORS: [&str; 5] = [
    "Jorge Herralde",
    "Carmen Balcells",
    "Beatriz de Moura",
    "Mario Lacruz",
    "Esther Tusquets",
];

const SERIES: [(&str, &str); 5] = [
    ("La Trilogía del Baztán", "Novela negra en el valle del Baztán."),
    ("El Ciclo de la Fundación", "Historia futura del Imperio Galáctico."),
    ("Los Juegos del Hambre", "Distopía en la nación de Panem."),
    ("Cien Años de Soledad", "Saga de la familia Buendía en Macondo."),
    ("Crónica del Asesino de Reyes", "Memorias de Kvothe."),
];

const AUTHORS: [(&str, &str); 15] = [
    ("Dolores", "Redondo"),
    ("Isaac", "Asimov"),
    ("Suzanne", "Collins"),
    ("Gabriel", "García Márquez"),
    ("Patrick", "Rothfuss"),
    ("Carmen", "Laforet"),
    ("Arturo", "Pérez-Reverte"),
    ("Almudena", "Grandes"),
    ("Javier", "Marías"),
    ("Rosa", "Montero"),
    ("Eduardo", "Mendoza"),
    ("Elvira", "Lindo"),
    ("Carlos", "Ruiz Zafón"),
    ("Ana María", "Matute"),
    ("Miguel", "Delibes"),
];

const TITLES: [&str; 30] = [
    "La Saga del Mar",
    "El Viaje",
    "El Guardián Invisible",
    "Legado en los Huesos",
    "Ofrenda a la Tormenta",
    "Fundación",
    "Fundación e Imperio",
    "Segunda Fundación",
    "En Llamas",
    "Sinsajo",
    "El Otoño del Patriarca",
    "El Nombre del Viento",
    "El Temor de un Hombre Sabio",
    "Nada",
    "El Capitán Alatriste",
    "La Tabla de Flandes",
    "Inés y la Alegría",
    "Corazón Tan Blanco",
    "La Loca de la Casa",
    "La Ciudad de los Prodigios",
    "Sin Noticias de Gurb",
    "Manolito Gafotas",
    "La Sombra del Viento",
    "El Juego del Ángel",
    "Olvidado Rey Gudú",
    "Los Santos Inocentes",
    "El Camino",
    "Cinco Horas con Mario",
    "La Mar de Versos",
    "Crónica de una Ciudad Gótica",
];

const REVIEW_BODIES: [&str; 5] = [
    "Una lectura absorbente de principio a fin.",
    "Buen ritmo aunque el final se precipita.",
    "Los personajes secundarios brillan más que el protagonista.",
    "Prosa cuidada y una ambientación impecable.",
    "No conseguí conectar con la historia.",
];

const COMMENTS: [&str; 4] = [
    "Totalmente de acuerdo.",
    "A mí me pasó lo contrario.",
    "Gracias por la recomendación.",
    "¿Lo recomendarías como primera lectura del autor?",
];

const READERS: [(&str, &str); 8] = [
    ("lucia@lectores.es", "lucia"),
    ("mateo@lectores.es", "mateo"),
    ("sofia@lectores.es", "sofia"),
    ("hugo@lectores.es", "hugo"),
    ("martina@lectores.es", "martina"),
    ("leo@lectores.es", "leo"),
    ("valeria@lectores.es", "valeria"),
    ("daniel@lectores.es", "daniel"),
];

/// Row counts written by `seed_catalog`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub already_seeded: bool,
    pub users: usize,
    pub follows: usize,
    pub publishers: usize,
    pub genres: usize,
    pub editors: usize,
    pub series: usize,
    pub authors: usize,
    pub contracts: usize,
    pub books: usize,
    pub reviews: usize,
    pub comments: usize,
}

/// Writes the seed dataset in one commit.
pub fn seed_catalog<S: CatalogStore>(
    store: &mut S,
    hasher: &dyn PasswordHasher,
) -> CatalogResult<SeedSummary> {
    let mut uow = UnitOfWork::begin(&*store)?;
    if !uow
        .graph()
        .find_by::<User, _>(|user| user.email() == ADMIN_EMAIL)
        .is_empty()
    {
        info!("event=catalog_seed module=fixtures status=skipped reason=already_seeded");
        return Ok(SeedSummary {
            already_seeded: true,
            ..SeedSummary::default()
        });
    }

    let mut summary = SeedSummary::default();
    let users = seed_users(&mut uow, hasher, &mut summary);
    let publishers = PUBLISHERS
        .iter()
        .map(|(name, city)| uow.add(Publisher::new(*name, *city)))
        .collect::<Vec<_>>();
    let genres = GENRES
        .iter()
        .map(|name| uow.add(Genre::new(*name)))
        .collect::<Vec<_>>();
    let editors = EDITORS
        .iter()
        .map(|name| uow.add(Editor::new(*name)))
        .collect::<Vec<_>>();
    let series = SERIES
        .iter()
        .map(|(name, description)| uow.add(Series::new(*name, *description)))
        .collect::<Vec<_>>();
    summary.publishers = publishers.len();
    summary.genres = genres.len();
    summary.editors = editors.len();
    summary.series = series.len();

    let authors = seed_authors(&mut uow, &mut summary);
    let books = seed_books(&mut uow, &authors, &series, &genres, &editors);
    summary.books = books.len();
    seed_reviews(&mut uow, &books, &mut summary);

    uow.commit(store)?;
    info!(
        "event=catalog_seed module=fixtures status=ok users={} books={} reviews={} comments={}",
        users.len(),
        summary.books,
        summary.reviews,
        summary.comments
    );
    Ok(summary)
}

fn seed_users(
    uow: &mut UnitOfWork,
    hasher: &dyn PasswordHasher,
    summary: &mut SeedSummary,
) -> Vec<Key<User>> {
    let mut admin = User::new(ADMIN_EMAIL, "AdminUser", hasher.hash(SEED_PASSWORD));
    admin.set_roles([ROLE_ADMIN, ROLE_USER]);
    let mut editor = User::new(EDITOR_EMAIL, "EditorUser", hasher.hash(SEED_PASSWORD));
    editor.set_roles([ROLE_USER]);

    let mut users = vec![uow.add(admin), uow.add(editor)];
    for (email, username) in READERS {
        users.push(uow.add(User::new(email, username, hasher.hash(SEED_PASSWORD))));
    }

    // Each user follows the next one to three users around the ring.
    for (position, follower) in users.iter().enumerate() {
        for step in 1..=(position % 3 + 1) {
            let followed = users[(position + step) % users.len()];
            if uow.graph_mut().follow(*follower, followed) {
                summary.follows += 1;
            }
        }
    }
    summary.users = users.len();
    users
}

fn seed_authors(uow: &mut UnitOfWork, summary: &mut SeedSummary) -> Vec<Key<Author>> {
    let mut authors = Vec::with_capacity(AUTHORS.len());
    for (position, (first_name, last_name)) in AUTHORS.iter().enumerate() {
        let bio = format!("{first_name} {last_name} forma parte del catálogo desde su debut.");
        let author = uow.add(Author::new(*first_name, *last_name, bio));
        let signed = date(2020, 1, 15) + Duration::days(position as i64 * 73);
        let rate = 0.05 + (position % 4) as f64 * 0.05;
        let contract = uow.create(Contract::new(signed, rate));
        uow.graph_mut().set_contract_author(contract, Some(author));
        summary.contracts += 1;
        authors.push(author);
    }
    summary.authors = authors.len();
    authors
}

fn seed_books(
    uow: &mut UnitOfWork,
    authors: &[Key<Author>],
    series: &[Key<Series>],
    genres: &[Key<Genre>],
    editors: &[Key<Editor>],
) -> Vec<Key<Book>> {
    let mut books = Vec::with_capacity(TITLES.len());
    for (position, title) in TITLES.iter().enumerate() {
        let published = date(1995, 3, 1) + Duration::days(position as i64 * 331);
        let book = uow.add(Book::new(*title, isbn13(position), published));
        let graph = uow.graph_mut();
        graph.set_book_author(book, Some(authors[position % authors.len()]));
        if position % 2 == 0 {
            graph.set_book_series(book, Some(series[(position / 2) % series.len()]));
        }
        for offset in 0..(position % 3 + 1) {
            graph.add_book_genre(book, genres[(position + offset * 3) % genres.len()]);
        }
        for offset in 0..(position % 2 + 1) {
            graph.add_book_editor(book, editors[(position + offset) % editors.len()]);
        }
        books.push(book);
    }
    books
}

fn seed_reviews(uow: &mut UnitOfWork, books: &[Key<Book>], summary: &mut SeedSummary) {
    let mut written = date(2024, 1, 10);
    for (position, book) in books.iter().enumerate() {
        for slot in 0..2 {
            let index = position * 2 + slot;
            let rating = (index % 5 + 1) as u8;
            let review = uow.add(Review::with_created_at(
                rating,
                REVIEW_BODIES[index % REVIEW_BODIES.len()],
                written,
            ));
            uow.graph_mut().set_review_book(review, Some(*book));
            summary.reviews += 1;

            for reply in 0..(index % 2 + 1) {
                let content = COMMENTS[(index + reply) % COMMENTS.len()];
                let comment = uow.add(Comment::with_created_at(
                    content,
                    written + Duration::hours(reply as i64 + 1),
                ));
                uow.graph_mut().set_comment_review(comment, Some(review));
                summary.comments += 1;
            }
            written += Duration::days(3);
        }
    }
}

/// A valid ISBN-13 in the 978-84 range, unique per position.
fn isbn13(position: usize) -> String {
    let body = format!("97884{:07}", 1_000 + position * 7);
    let check = body
        .chars()
        .filter_map(|digit| digit.to_digit(10))
        .enumerate()
        .map(|(index, digit)| if index % 2 == 0 { digit } else { digit * 3 })
        .sum::<u32>();
    format!("{body}{}", (10 - check % 10) % 10)
}

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::isbn13;

    #[test]
    fn isbn_check_digit_is_valid() {
        assert_eq!(isbn13(0).len(), 13);
        let digits = isbn13(3)
            .chars()
            .map(|digit| digit.to_digit(10).unwrap())
            .collect::<Vec<_>>();
        let weighted = digits
            .iter()
            .enumerate()
            .map(|(index, digit)| if index % 2 == 0 { *digit } else { digit * 3 })
            .sum::<u32>();
        assert_eq!(weighted % 10, 0);
        assert_ne!(isbn13(1), isbn13(2));
    }
}
