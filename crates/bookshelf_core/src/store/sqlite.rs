//! SQLite-backed catalog store.
//!
//! # Responsibility
//! - Load the catalog graph from the migrated schema.
//! - Apply change sets inside one `IMMEDIATE` transaction.
//!
//! # Invariants
//! - The wrapped connection is at the latest schema version.
//! - A failed `apply` rolls back every statement of the change set.

use super::rows::build_graph;
use super::{
    table_name, AssignedIds, CatalogStore, ChangeSet, Row, RowRef, StoreError, StoreResult,
};
use crate::db::migrations::{current_version, latest_version};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::graph::EntityGraph;
use crate::model::EntityId;
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::types::{Type, Value};
use rusqlite::{
    params, params_from_iter, Connection, Row as SqlRow, Transaction, TransactionBehavior,
};
use std::collections::BTreeMap;
use std::path::Path;

struct LinkTable {
    table: &'static str,
    owner_column: &'static str,
    target_column: &'static str,
}

const BOOK_GENRE: LinkTable = LinkTable {
    table: "book_genre",
    owner_column: "book_id",
    target_column: "genre_id",
};

const BOOK_EDITOR: LinkTable = LinkTable {
    table: "book_editor",
    owner_column: "book_id",
    target_column: "editor_id",
};

const USER_FOLLOW: LinkTable = LinkTable {
    table: "user_follow",
    owner_column: "follower_id",
    target_column: "followed_id",
};

pub struct SqliteCatalogStore {
    conn: Connection,
}

impl SqliteCatalogStore {
    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::try_new(open_db(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Wraps a connection after checking its schema version.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        let db_version = current_version(&conn)?;
        let latest = latest_version();
        if db_version > latest {
            return Err(DbError::UnsupportedSchemaVersion {
                db_version,
                latest_supported: latest,
            }
            .into());
        }
        if db_version < latest {
            return Err(DbError::SchemaNotReady {
                db_version,
                required: latest,
            }
            .into());
        }
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn load(&self) -> StoreResult<EntityGraph> {
        let rows = load_rows(&self.conn)?;
        debug!(
            "event=store_load module=store status=ok backend=sqlite rows={}",
            rows.len()
        );
        build_graph(&rows)
    }

    fn apply(&mut self, changes: &ChangeSet) -> StoreResult<AssignedIds> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        for (kind, id) in &changes.deletes {
            let affected = tx.execute(
                &format!("DELETE FROM {} WHERE id = ?1", table_name(*kind)),
                params![id],
            )?;
            if affected == 0 {
                return Err(StoreError::MissingRow {
                    entity: *kind,
                    id: *id,
                });
            }
        }

        let mut assigned = AssignedIds::default();
        let mut linked = Vec::new();
        for write in &changes.writes {
            let kind = write.row.kind();
            let values = row_values(&write.row, &assigned)?;
            let id = match write.target {
                RowRef::Pending(key) => {
                    insert_row(&tx, table_name(kind), values)?;
                    let id = tx.last_insert_rowid();
                    assigned.insert(key, id);
                    id
                }
                RowRef::Id(id) => {
                    if update_row(&tx, table_name(kind), id, values)? == 0 {
                        return Err(StoreError::MissingRow { entity: kind, id });
                    }
                    id
                }
            };
            if matches!(write.row, Row::Book { .. } | Row::User { .. }) {
                linked.push((id, &write.row));
            }
        }

        for (id, row) in linked {
            match row {
                Row::Book {
                    genres, editors, ..
                } => {
                    replace_links(&tx, &BOOK_GENRE, id, genres, &assigned)?;
                    replace_links(&tx, &BOOK_EDITOR, id, editors, &assigned)?;
                }
                Row::User { following, .. } => {
                    replace_links(&tx, &USER_FOLLOW, id, following, &assigned)?;
                }
                _ => {}
            }
        }

        tx.commit()?;
        debug!(
            "event=store_apply module=store status=ok backend=sqlite deletes={} writes={}",
            changes.deletes.len(),
            changes.writes.len()
        );
        Ok(assigned)
    }
}

fn insert_row(
    tx: &Transaction<'_>,
    table: &str,
    values: Vec<(&'static str, Value)>,
) -> StoreResult<()> {
    let columns = values
        .iter()
        .map(|(column, _)| *column)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=values.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    tx.execute(
        &format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})"),
        params_from_iter(values.into_iter().map(|(_, value)| value)),
    )?;
    Ok(())
}

fn update_row(
    tx: &Transaction<'_>,
    table: &str,
    id: EntityId,
    values: Vec<(&'static str, Value)>,
) -> StoreResult<usize> {
    let assignments = values
        .iter()
        .enumerate()
        .map(|(index, (column, _))| format!("{column} = ?{}", index + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let id_placeholder = values.len() + 1;
    let mut bound = values.into_iter().map(|(_, value)| value).collect::<Vec<_>>();
    bound.push(Value::Integer(id));
    let affected = tx.execute(
        &format!("UPDATE {table} SET {assignments} WHERE id = ?{id_placeholder}"),
        params_from_iter(bound),
    )?;
    Ok(affected)
}

fn replace_links(
    tx: &Transaction<'_>,
    link: &LinkTable,
    owner: EntityId,
    targets: &[RowRef],
    assigned: &AssignedIds,
) -> StoreResult<()> {
    tx.execute(
        &format!("DELETE FROM {} WHERE {} = ?1", link.table, link.owner_column),
        params![owner],
    )?;
    let mut stmt = tx.prepare(&format!(
        "INSERT INTO {table} ({owner}, {target}) VALUES (?1, ?2)
         ON CONFLICT ({owner}, {target}) DO NOTHING",
        table = link.table,
        owner = link.owner_column,
        target = link.target_column,
    ))?;
    for target in targets {
        stmt.execute(params![owner, target.resolve(assigned)?])?;
    }
    Ok(())
}

/// Column values of one row, pending references resolved.
fn row_values(row: &Row, assigned: &AssignedIds) -> StoreResult<Vec<(&'static str, Value)>> {
    let reference = |target: RowRef| target.resolve(assigned).map(Value::Integer);
    let optional = |target: Option<RowRef>| match target {
        Some(target) => reference(target),
        None => Ok(Value::Null),
    };

    let values = match row {
        Row::Author {
            first_name,
            last_name,
            bio,
        } => vec![
            ("first_name", Value::Text(first_name.clone())),
            ("last_name", Value::Text(last_name.clone())),
            ("bio", Value::Text(bio.clone())),
        ],
        Row::Series { name, description } => vec![
            ("name", Value::Text(name.clone())),
            ("description", Value::Text(description.clone())),
        ],
        Row::Publisher { name, city } => vec![
            ("name", Value::Text(name.clone())),
            ("city", Value::Text(city.clone())),
        ],
        Row::Genre { name } | Row::Editor { name } => vec![("name", Value::Text(name.clone()))],
        Row::User {
            email,
            username,
            password,
            roles,
            ..
        } => vec![
            ("email", Value::Text(email.clone())),
            ("username", Value::Text(username.clone())),
            ("password", Value::Text(password.clone())),
            ("roles", Value::Text(encode_roles(roles)?)),
        ],
        Row::Contract {
            author,
            date_signed,
            royalty_rate,
        } => vec![
            ("author_id", reference(*author)?),
            ("date_signed", Value::Integer(date_signed.timestamp_millis())),
            ("royalty_rate", Value::Real(*royalty_rate)),
        ],
        Row::Book {
            author,
            series,
            publisher,
            title,
            isbn,
            publication_date,
            ..
        } => vec![
            ("author_id", reference(*author)?),
            ("series_id", optional(*series)?),
            ("publisher_id", optional(*publisher)?),
            ("title", Value::Text(title.clone())),
            ("isbn", Value::Text(isbn.clone())),
            (
                "publication_date",
                Value::Integer(publication_date.timestamp_millis()),
            ),
        ],
        Row::Review {
            book,
            rating,
            body,
            created_at,
        } => vec![
            ("book_id", reference(*book)?),
            ("rating", Value::Integer(i64::from(*rating))),
            ("body", Value::Text(body.clone())),
            ("created_at", Value::Integer(created_at.timestamp_millis())),
        ],
        Row::Comment {
            review,
            content,
            created_at,
        } => vec![
            ("review_id", reference(*review)?),
            ("content", Value::Text(content.clone())),
            ("created_at", Value::Integer(created_at.timestamp_millis())),
        ],
    };
    Ok(values)
}

fn encode_roles(roles: &[String]) -> StoreResult<String> {
    serde_json::to_string(roles).map_err(|err| StoreError::InvalidData(err.to_string()))
}

fn load_rows(conn: &Connection) -> StoreResult<Vec<(EntityId, Row)>> {
    let mut rows = Vec::new();

    collect(
        conn,
        "SELECT id, first_name, last_name, bio FROM author ORDER BY id",
        &mut rows,
        |row| {
            Ok(Row::Author {
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                bio: row.get(3)?,
            })
        },
    )?;
    collect(
        conn,
        "SELECT id, name, description FROM series ORDER BY id",
        &mut rows,
        |row| {
            Ok(Row::Series {
                name: row.get(1)?,
                description: row.get(2)?,
            })
        },
    )?;
    collect(
        conn,
        "SELECT id, name, city FROM publisher ORDER BY id",
        &mut rows,
        |row| {
            Ok(Row::Publisher {
                name: row.get(1)?,
                city: row.get(2)?,
            })
        },
    )?;
    collect(conn, "SELECT id, name FROM genre ORDER BY id", &mut rows, |row| {
        Ok(Row::Genre { name: row.get(1)? })
    })?;
    collect(conn, "SELECT id, name FROM editor ORDER BY id", &mut rows, |row| {
        Ok(Row::Editor { name: row.get(1)? })
    })?;

    let following = load_links(conn, &USER_FOLLOW)?;
    collect(
        conn,
        "SELECT id, email, username, password, roles FROM app_user ORDER BY id",
        &mut rows,
        |row| {
            let id: EntityId = row.get(0)?;
            let roles: String = row.get(4)?;
            Ok(Row::User {
                email: row.get(1)?,
                username: row.get(2)?,
                password: row.get(3)?,
                roles: serde_json::from_str(&roles).map_err(|err| {
                    rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(err))
                })?,
                following: following.get(&id).cloned().unwrap_or_default(),
            })
        },
    )?;

    collect(
        conn,
        "SELECT id, author_id, date_signed, royalty_rate FROM contract ORDER BY id",
        &mut rows,
        |row| {
            Ok(Row::Contract {
                author: RowRef::Id(row.get(1)?),
                date_signed: timestamp(row, 2)?,
                royalty_rate: row.get(3)?,
            })
        },
    )?;

    let genres = load_links(conn, &BOOK_GENRE)?;
    let editors = load_links(conn, &BOOK_EDITOR)?;
    collect(
        conn,
        "SELECT id, author_id, series_id, publisher_id, title, isbn, publication_date
         FROM book ORDER BY id",
        &mut rows,
        |row| {
            let id: EntityId = row.get(0)?;
            Ok(Row::Book {
                author: RowRef::Id(row.get(1)?),
                series: row.get::<_, Option<EntityId>>(2)?.map(RowRef::Id),
                publisher: row.get::<_, Option<EntityId>>(3)?.map(RowRef::Id),
                title: row.get(4)?,
                isbn: row.get(5)?,
                publication_date: timestamp(row, 6)?,
                genres: genres.get(&id).cloned().unwrap_or_default(),
                editors: editors.get(&id).cloned().unwrap_or_default(),
            })
        },
    )?;

    collect(
        conn,
        "SELECT id, book_id, rating, body, created_at FROM review ORDER BY id",
        &mut rows,
        |row| {
            Ok(Row::Review {
                book: RowRef::Id(row.get(1)?),
                rating: row.get(2)?,
                body: row.get(3)?,
                created_at: timestamp(row, 4)?,
            })
        },
    )?;
    collect(
        conn,
        "SELECT id, review_id, content, created_at FROM comment ORDER BY id",
        &mut rows,
        |row| {
            Ok(Row::Comment {
                review: RowRef::Id(row.get(1)?),
                content: row.get(2)?,
                created_at: timestamp(row, 3)?,
            })
        },
    )?;

    Ok(rows)
}

fn collect<F>(
    conn: &Connection,
    sql: &str,
    rows: &mut Vec<(EntityId, Row)>,
    mut map: F,
) -> StoreResult<()>
where
    F: FnMut(&SqlRow<'_>) -> rusqlite::Result<Row>,
{
    let mut stmt = conn.prepare(sql)?;
    let mapped = stmt.query_map([], |row| Ok((row.get::<_, EntityId>(0)?, map(row)?)))?;
    for row in mapped {
        rows.push(row?);
    }
    Ok(())
}

/// Link rows grouped by owner, in insertion order.
fn load_links(
    conn: &Connection,
    link: &LinkTable,
) -> StoreResult<BTreeMap<EntityId, Vec<RowRef>>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {}, {} FROM {} ORDER BY rowid",
        link.owner_column, link.target_column, link.table
    ))?;
    let pairs = stmt.query_map([], |row| {
        Ok((row.get::<_, EntityId>(0)?, row.get::<_, EntityId>(1)?))
    })?;

    let mut links: BTreeMap<EntityId, Vec<RowRef>> = BTreeMap::new();
    for pair in pairs {
        let (owner, target) = pair?;
        links.entry(owner).or_default().push(RowRef::Id(target));
    }
    Ok(links)
}

fn timestamp(row: &SqlRow<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(index)?;
    DateTime::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(index, millis))
}
