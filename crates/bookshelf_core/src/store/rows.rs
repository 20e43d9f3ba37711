//! Persisted row shapes and graph conversion.
//!
//! # Responsibility
//! - Snapshot one entity of a graph into its row form for writing.
//! - Rebuild a graph from persisted rows through the synchronizer.
//!
//! # Invariants
//! - Rows loaded from a store only carry `RowRef::Id` references.
//! - A rebuilt graph has every id assigned and an empty change journal.

use super::{AssignedIds, StoreError, StoreResult};
use crate::graph::EntityGraph;
use crate::model::{
    AnyKey, Author, Book, Comment, Contract, Editor, Entity, EntityId, EntityKind, Genre, Key,
    Publisher, Review, Series, User,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Reference from one row to another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RowRef {
    /// Already persisted row.
    Id(EntityId),
    /// Entity inserted earlier in the same change set.
    Pending(AnyKey),
}

impl RowRef {
    pub(crate) fn resolve(self, assigned: &AssignedIds) -> StoreResult<EntityId> {
        match self {
            Self::Id(id) => Ok(id),
            Self::Pending(key) => assigned
                .get(key)
                .ok_or(StoreError::UnresolvedReference(key)),
        }
    }

    fn persisted(self) -> StoreResult<EntityId> {
        match self {
            Self::Id(id) => Ok(id),
            Self::Pending(key) => Err(StoreError::UnresolvedReference(key)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Author {
        first_name: String,
        last_name: String,
        bio: String,
    },
    Series {
        name: String,
        description: String,
    },
    Publisher {
        name: String,
        city: String,
    },
    Genre {
        name: String,
    },
    Editor {
        name: String,
    },
    User {
        email: String,
        username: String,
        password: String,
        roles: Vec<String>,
        following: Vec<RowRef>,
    },
    Contract {
        author: RowRef,
        date_signed: DateTime<Utc>,
        royalty_rate: f64,
    },
    Book {
        author: RowRef,
        series: Option<RowRef>,
        publisher: Option<RowRef>,
        title: String,
        isbn: String,
        publication_date: DateTime<Utc>,
        genres: Vec<RowRef>,
        editors: Vec<RowRef>,
    },
    Review {
        book: RowRef,
        rating: u8,
        body: String,
        created_at: DateTime<Utc>,
    },
    Comment {
        review: RowRef,
        content: String,
        created_at: DateTime<Utc>,
    },
}

impl Row {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Author { .. } => EntityKind::Author,
            Self::Series { .. } => EntityKind::Series,
            Self::Publisher { .. } => EntityKind::Publisher,
            Self::Genre { .. } => EntityKind::Genre,
            Self::Editor { .. } => EntityKind::Editor,
            Self::User { .. } => EntityKind::User,
            Self::Contract { .. } => EntityKind::Contract,
            Self::Book { .. } => EntityKind::Book,
            Self::Review { .. } => EntityKind::Review,
            Self::Comment { .. } => EntityKind::Comment,
        }
    }

    /// Copy of this row with every pending reference replaced by its id.
    pub(crate) fn resolved(&self, assigned: &AssignedIds) -> StoreResult<Row> {
        let resolve = |reference: RowRef| reference.resolve(assigned).map(RowRef::Id);
        let resolve_all = |references: &[RowRef]| {
            references
                .iter()
                .map(|reference| resolve(*reference))
                .collect::<StoreResult<Vec<_>>>()
        };

        let mut row = self.clone();
        match &mut row {
            Self::User { following, .. } => *following = resolve_all(following)?,
            Self::Contract { author, .. } => *author = resolve(*author)?,
            Self::Book {
                author,
                series,
                publisher,
                genres,
                editors,
                ..
            } => {
                *author = resolve(*author)?;
                *series = series.map(resolve).transpose()?;
                *publisher = publisher.map(resolve).transpose()?;
                *genres = resolve_all(genres)?;
                *editors = resolve_all(editors)?;
            }
            Self::Review { book, .. } => *book = resolve(*book)?,
            Self::Comment { review, .. } => *review = resolve(*review)?,
            Self::Author { .. }
            | Self::Series { .. }
            | Self::Publisher { .. }
            | Self::Genre { .. }
            | Self::Editor { .. } => {}
        }
        Ok(row)
    }

    /// Outgoing references as `(field, target kind, target)`.
    pub(crate) fn references(&self) -> Vec<(&'static str, EntityKind, RowRef)> {
        let mut references = Vec::new();
        match self {
            Self::User { following, .. } => references.extend(
                following
                    .iter()
                    .map(|target| ("following", EntityKind::User, *target)),
            ),
            Self::Contract { author, .. } => {
                references.push(("author", EntityKind::Author, *author));
            }
            Self::Book {
                author,
                series,
                publisher,
                genres,
                editors,
                ..
            } => {
                references.push(("author", EntityKind::Author, *author));
                references.extend(series.map(|target| ("series", EntityKind::Series, target)));
                references.extend(
                    publisher.map(|target| ("publisher", EntityKind::Publisher, target)),
                );
                references.extend(
                    genres
                        .iter()
                        .map(|target| ("genres", EntityKind::Genre, *target)),
                );
                references.extend(
                    editors
                        .iter()
                        .map(|target| ("editors", EntityKind::Editor, *target)),
                );
            }
            Self::Review { book, .. } => references.push(("book", EntityKind::Book, *book)),
            Self::Comment { review, .. } => {
                references.push(("review", EntityKind::Review, *review));
            }
            Self::Author { .. }
            | Self::Series { .. }
            | Self::Publisher { .. }
            | Self::Genre { .. }
            | Self::Editor { .. } => {}
        }
        references
    }
}

fn row_ref<T: Entity>(graph: &EntityGraph, key: Key<T>) -> RowRef {
    match graph.id(key) {
        Some(id) => RowRef::Id(id),
        None => RowRef::Pending(key.erase()),
    }
}

fn refs_excluding<T: Entity>(
    graph: &EntityGraph,
    keys: &[Key<T>],
    skip: &BTreeSet<AnyKey>,
) -> Vec<RowRef> {
    keys.iter()
        .filter(|key| !skip.contains(&key.erase()))
        .map(|key| row_ref(graph, *key))
        .collect()
}

/// Row form of one entity. Links to entities in `skip` are left out.
///
/// Returns `None` when the key is absent or a required reference is empty.
pub(crate) fn snapshot_row(
    graph: &EntityGraph,
    key: AnyKey,
    skip: &BTreeSet<AnyKey>,
) -> Option<Row> {
    match key.kind {
        EntityKind::Author => {
            let author = graph.get(key.typed::<Author>()?)?;
            Some(Row::Author {
                first_name: author.first_name().to_string(),
                last_name: author.last_name().to_string(),
                bio: author.bio().to_string(),
            })
        }
        EntityKind::Series => {
            let series = graph.get(key.typed::<Series>()?)?;
            Some(Row::Series {
                name: series.name().to_string(),
                description: series.description().to_string(),
            })
        }
        EntityKind::Publisher => {
            let publisher = graph.get(key.typed::<Publisher>()?)?;
            Some(Row::Publisher {
                name: publisher.name().to_string(),
                city: publisher.city().to_string(),
            })
        }
        EntityKind::Genre => {
            let genre = graph.get(key.typed::<Genre>()?)?;
            Some(Row::Genre {
                name: genre.name().to_string(),
            })
        }
        EntityKind::Editor => {
            let editor = graph.get(key.typed::<Editor>()?)?;
            Some(Row::Editor {
                name: editor.name().to_string(),
            })
        }
        EntityKind::User => {
            let user_key = key.typed::<User>()?;
            let user = graph.get(user_key)?;
            Some(Row::User {
                email: user.email().to_string(),
                username: user.username().to_string(),
                password: user.password_hash().to_string(),
                roles: user.stored_roles().to_vec(),
                following: refs_excluding(graph, &graph.following(user_key), skip),
            })
        }
        EntityKind::Contract => {
            let contract = graph.get(key.typed::<Contract>()?)?;
            Some(Row::Contract {
                author: row_ref(graph, contract.author()?),
                date_signed: contract.date_signed(),
                royalty_rate: contract.royalty_rate(),
            })
        }
        EntityKind::Book => {
            let book = graph.get(key.typed::<Book>()?)?;
            Some(Row::Book {
                author: row_ref(graph, book.author()?),
                series: book.series().map(|series| row_ref(graph, series)),
                publisher: book.publisher().map(|publisher| row_ref(graph, publisher)),
                title: book.title().to_string(),
                isbn: book.isbn().to_string(),
                publication_date: book.publication_date(),
                genres: refs_excluding(graph, book.genres(), skip),
                editors: refs_excluding(graph, book.editors(), skip),
            })
        }
        EntityKind::Review => {
            let review = graph.get(key.typed::<Review>()?)?;
            Some(Row::Review {
                book: row_ref(graph, review.book()?),
                rating: review.rating(),
                body: review.body().to_string(),
                created_at: review.created_at(),
            })
        }
        EntityKind::Comment => {
            let comment = graph.get(key.typed::<Comment>()?)?;
            Some(Row::Comment {
                review: row_ref(graph, comment.review()?),
                content: comment.content().to_string(),
                created_at: comment.created_at(),
            })
        }
    }
}

/// Rebuilds a graph from persisted rows.
pub(crate) fn build_graph(rows: &[(EntityId, Row)]) -> StoreResult<EntityGraph> {
    let mut graph = EntityGraph::new();

    for (id, row) in rows {
        let key = match row {
            Row::Author {
                first_name,
                last_name,
                bio,
            } => graph
                .insert(Author::new(first_name.as_str(), last_name.as_str(), bio.as_str()))
                .erase(),
            Row::Series { name, description } => graph
                .insert(Series::new(name.as_str(), description.as_str()))
                .erase(),
            Row::Publisher { name, city } => graph
                .insert(Publisher::new(name.as_str(), city.as_str()))
                .erase(),
            Row::Genre { name } => graph.insert(Genre::new(name.as_str())).erase(),
            Row::Editor { name } => graph.insert(Editor::new(name.as_str())).erase(),
            Row::User {
                email,
                username,
                password,
                roles,
                ..
            } => {
                let mut user = User::new(email.as_str(), username.as_str(), password.as_str());
                user.set_roles(roles.iter().cloned());
                graph.insert(user).erase()
            }
            Row::Contract {
                date_signed,
                royalty_rate,
                ..
            } => graph
                .insert(Contract::new(*date_signed, *royalty_rate))
                .erase(),
            Row::Book {
                title,
                isbn,
                publication_date,
                ..
            } => graph
                .insert(Book::new(title.as_str(), isbn.as_str(), *publication_date))
                .erase(),
            Row::Review {
                rating,
                body,
                created_at,
                ..
            } => graph
                .insert(Review::with_created_at(*rating, body.as_str(), *created_at))
                .erase(),
            Row::Comment {
                content,
                created_at,
                ..
            } => graph
                .insert(Comment::with_created_at(content.as_str(), *created_at))
                .erase(),
        };
        if !graph.assign_id_any(key, *id) {
            return Err(StoreError::InvalidData(format!(
                "duplicate {} id {id}",
                row.kind()
            )));
        }
    }

    for (id, row) in rows {
        match row {
            Row::User { following, .. } => {
                let user = lookup::<User>(&graph, *id)?;
                for target in following {
                    let followed = lookup::<User>(&graph, target.persisted()?)?;
                    graph.follow(user, followed);
                }
            }
            Row::Contract { author, .. } => {
                let contract = lookup::<Contract>(&graph, *id)?;
                let author = lookup::<Author>(&graph, author.persisted()?)?;
                graph.set_contract_author(contract, Some(author));
            }
            Row::Book {
                author,
                series,
                publisher,
                genres,
                editors,
                ..
            } => {
                let book = lookup::<Book>(&graph, *id)?;
                let author = lookup::<Author>(&graph, author.persisted()?)?;
                graph.set_book_author(book, Some(author));
                if let Some(series) = series {
                    let series = lookup::<Series>(&graph, series.persisted()?)?;
                    graph.set_book_series(book, Some(series));
                }
                if let Some(publisher) = publisher {
                    let publisher = lookup::<Publisher>(&graph, publisher.persisted()?)?;
                    graph.set_book_publisher(book, Some(publisher));
                }
                for genre in genres {
                    let genre = lookup::<Genre>(&graph, genre.persisted()?)?;
                    graph.add_book_genre(book, genre);
                }
                for editor in editors {
                    let editor = lookup::<Editor>(&graph, editor.persisted()?)?;
                    graph.add_book_editor(book, editor);
                }
            }
            Row::Review { book, .. } => {
                let review = lookup::<Review>(&graph, *id)?;
                let book = lookup::<Book>(&graph, book.persisted()?)?;
                graph.set_review_book(review, Some(book));
            }
            Row::Comment { review, .. } => {
                let comment = lookup::<Comment>(&graph, *id)?;
                let review = lookup::<Review>(&graph, review.persisted()?)?;
                graph.set_comment_review(comment, Some(review));
            }
            Row::Author { .. }
            | Row::Series { .. }
            | Row::Publisher { .. }
            | Row::Genre { .. }
            | Row::Editor { .. } => {}
        }
    }

    graph.clear_journal();
    Ok(graph)
}

fn lookup<T: Entity>(graph: &EntityGraph, id: EntityId) -> StoreResult<Key<T>> {
    graph.find::<T>(id).ok_or_else(|| {
        StoreError::InvalidData(format!("dangling reference to {} {id}", T::KIND))
    })
}
