//! Persistence boundary for the catalog.
//!
//! # Responsibility
//! - Define the `CatalogStore` contract used by the unit of work.
//! - Describe one commit as an ordered `ChangeSet` of row writes and deletes.
//!
//! # Invariants
//! - `apply` is all-or-nothing: on error the store is unchanged.
//! - Writes are ordered so every referenced row exists before it is needed;
//!   link rows (book genres/editors, follow edges) are written after all
//!   entity rows.
//! - Deletes are ordered children first.
//!
//! # See also
//! - `crate::uow` for how change sets are planned.

mod memory;
mod rows;
mod sqlite;

pub use memory::MemoryCatalogStore;
pub use rows::{Row, RowRef};
pub use sqlite::SqliteCatalogStore;

pub(crate) use rows::snapshot_row;

use crate::db::DbError;
use crate::graph::EntityGraph;
use crate::model::{AnyKey, EntityId, EntityKind};
use rusqlite::ErrorCode;
use std::collections::BTreeMap;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("unique constraint failed on {entity}.{field}")]
    UniqueViolation {
        entity: EntityKind,
        field: String,
        value: String,
    },
    #[error("foreign key constraint failed: {0}")]
    ForeignKeyViolation(String),
    #[error("check constraint failed: {0}")]
    CheckViolation(String),
    #[error("{entity} row {id} does not exist")]
    MissingRow { entity: EntityKind, id: EntityId },
    #[error("pending {0:?} was referenced before it was written")]
    UnresolvedReference(AnyKey),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        let rusqlite::Error::SqliteFailure(failure, message) = &value else {
            return Self::Db(DbError::Sqlite(value));
        };
        if failure.code != ErrorCode::ConstraintViolation {
            return Self::Db(DbError::Sqlite(value));
        }
        let detail = message.clone().unwrap_or_default();
        let extended_code = failure.extended_code;
        match extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                match parse_unique_target(&detail) {
                    Some((entity, field)) => Self::UniqueViolation {
                        entity,
                        field,
                        value: String::new(),
                    },
                    None => Self::Db(DbError::Sqlite(value)),
                }
            }
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Self::ForeignKeyViolation(detail),
            rusqlite::ffi::SQLITE_CONSTRAINT_CHECK => Self::CheckViolation(detail),
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// Parses `UNIQUE constraint failed: book.isbn` into `(Book, "isbn")`.
fn parse_unique_target(message: &str) -> Option<(EntityKind, String)> {
    let target = message.rsplit(": ").next()?;
    let first = target.split(", ").next()?;
    let (table, column) = first.split_once('.')?;
    let entity = EntityKind::ALL
        .into_iter()
        .find(|kind| table_name(*kind) == table)?;
    Some((entity, column.to_string()))
}

/// SQL table backing each entity kind.
pub(crate) fn table_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => "app_user",
        other => other.as_str(),
    }
}

/// Insert or update of one entity row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowWrite {
    /// `Pending` inserts a new row, `Id` updates an existing one.
    pub target: RowRef,
    pub row: Row,
}

/// Everything one commit writes, in application order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub deletes: Vec<(EntityKind, EntityId)>,
    pub writes: Vec<RowWrite>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.writes.is_empty()
    }

    pub fn insert_count(&self) -> usize {
        self.writes
            .iter()
            .filter(|write| matches!(write.target, RowRef::Pending(_)))
            .count()
    }

    pub fn update_count(&self) -> usize {
        self.writes.len() - self.insert_count()
    }
}

/// Ids handed out by the store for newly inserted rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignedIds {
    ids: BTreeMap<AnyKey, EntityId>,
}

impl AssignedIds {
    pub fn insert(&mut self, key: AnyKey, id: EntityId) {
        self.ids.insert(key, id);
    }

    pub fn get(&self, key: AnyKey) -> Option<EntityId> {
        self.ids.get(&key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnyKey, EntityId)> + '_ {
        self.ids.iter().map(|(key, id)| (*key, *id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Storage backend for the catalog graph.
pub trait CatalogStore {
    /// Reads the whole persisted graph with ids assigned and no pending changes.
    fn load(&self) -> StoreResult<EntityGraph>;

    /// Applies one change set atomically.
    fn apply(&mut self, changes: &ChangeSet) -> StoreResult<AssignedIds>;
}
