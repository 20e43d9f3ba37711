//! Field-level validation shared by all entities.

use super::EntityKind;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex must compile")
});

/// A malformed or missing field on one entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {entity}.{field}: {message}")]
pub struct ValidationError {
    pub entity: EntityKind,
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(entity: EntityKind, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            entity,
            field,
            message: message.into(),
        }
    }
}

pub(crate) fn require_text(
    entity: EntityKind,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(entity, field, "must not be blank"));
    }
    Ok(())
}

pub(crate) fn require_email(
    entity: EntityKind,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    require_text(entity, field, value)?;
    if !EMAIL_PATTERN.is_match(value) {
        return Err(ValidationError::new(
            entity,
            field,
            "must be a valid email address",
        ));
    }
    Ok(())
}
