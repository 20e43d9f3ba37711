//! Catalog error taxonomy.
//!
//! # Responsibility
//! - Give every failure surfaced by the domain layer one typed variant.
//! - Translate persistence failures into domain terms.
//!
//! # Invariants
//! - Store uniqueness violations surface as `Conflict`.
//! - Store foreign-key violations surface as `Integrity`.

use crate::model::{EntityId, EntityKind, ValidationError};
use crate::store::StoreError;
use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Relationship or lifecycle rule broken by a pending commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    #[error(
        "cannot remove {entity} {id:?}: still referenced by {count} {referenced_by} through `{field}`"
    )]
    RestrictedRemoval {
        entity: EntityKind,
        id: Option<EntityId>,
        referenced_by: EntityKind,
        field: &'static str,
        count: usize,
    },
    #[error("{from} references a new {to} through `{field}` that was never persisted")]
    UnstagedReference {
        from: EntityKind,
        to: EntityKind,
        field: &'static str,
    },
    #[error("user {user:?} cannot follow themselves")]
    SelfFollow { user: Option<EntityId> },
    #[error("foreign key violation: {0}")]
    ForeignKey(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{entity}.{field} `{value}` already exists")]
    Conflict {
        entity: EntityKind,
        field: String,
        value: String,
    },
    #[error("integrity violation: {0}")]
    Integrity(#[from] IntegrityViolation),
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: EntityId },
    #[error("invalid credentials")]
    Unauthorized,
    #[error(transparent)]
    Store(StoreError),
}

impl CatalogError {
    pub fn not_found(entity: EntityKind, id: EntityId) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn conflict(entity: EntityKind, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            field: field.into(),
            value: value.into(),
        }
    }

    /// Stable machine-readable code, used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Conflict { .. } => "conflict",
            Self::Integrity(_) => "integrity",
            Self::NotFound { .. } => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Store(_) => "store",
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueViolation {
                entity,
                field,
                value,
            } => Self::Conflict {
                entity,
                field,
                value,
            },
            StoreError::ForeignKeyViolation(detail) => {
                Self::Integrity(IntegrityViolation::ForeignKey(detail))
            }
            other => Self::Store(other),
        }
    }
}

impl From<crate::db::DbError> for CatalogError {
    fn from(value: crate::db::DbError) -> Self {
        Self::from(StoreError::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogError, IntegrityViolation};
    use crate::model::EntityKind;
    use crate::store::StoreError;

    #[test]
    fn unique_store_failures_become_conflicts() {
        let err = CatalogError::from(StoreError::UniqueViolation {
            entity: EntityKind::Book,
            field: "isbn".to_string(),
            value: "9788408000013".to_string(),
        });
        assert!(matches!(
            err,
            CatalogError::Conflict { entity: EntityKind::Book, ref field, .. } if field == "isbn"
        ));
        assert_eq!(err.code(), "conflict");
    }

    #[test]
    fn foreign_key_store_failures_become_integrity_errors() {
        let err = CatalogError::from(StoreError::ForeignKeyViolation("book.author_id".into()));
        assert!(matches!(
            err,
            CatalogError::Integrity(IntegrityViolation::ForeignKey(_))
        ));
    }
}
