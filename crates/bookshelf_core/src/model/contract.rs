//! Contract entity, owning side of the one-to-one link with `Author`.

use super::{Author, Entity, EntityKind, Key, ValidationError};
use crate::graph::{Arena, EntityGraph};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Contract {
    date_signed: DateTime<Utc>,
    /// Fraction of sales, within `0.0..=1.0`.
    royalty_rate: f64,
    pub(crate) author: Option<Key<Author>>,
}

impl Contract {
    pub fn new(date_signed: DateTime<Utc>, royalty_rate: f64) -> Self {
        Self {
            date_signed,
            royalty_rate,
            author: None,
        }
    }

    pub fn date_signed(&self) -> DateTime<Utc> {
        self.date_signed
    }

    pub fn royalty_rate(&self) -> f64 {
        self.royalty_rate
    }

    pub fn author(&self) -> Option<Key<Author>> {
        self.author
    }

    pub fn set_date_signed(&mut self, value: DateTime<Utc>) {
        self.date_signed = value;
    }

    pub fn set_royalty_rate(&mut self, value: f64) {
        self.royalty_rate = value;
    }
}

impl Entity for Contract {
    const KIND: EntityKind = EntityKind::Contract;

    fn validate(&self) -> Result<(), ValidationError> {
        if !self.royalty_rate.is_finite() || !(0.0..=1.0).contains(&self.royalty_rate) {
            return Err(ValidationError::new(
                Self::KIND,
                "royalty_rate",
                "must be a fraction between 0 and 1",
            ));
        }
        Ok(())
    }

    fn label(&self) -> String {
        format!(
            "{:.2}% since {}",
            self.royalty_rate * 100.0,
            self.date_signed.date_naive()
        )
    }

    fn arena(graph: &EntityGraph) -> &Arena<Self> {
        &graph.contracts
    }

    fn arena_mut(graph: &mut EntityGraph) -> &mut Arena<Self> {
        &mut graph.contracts
    }
}
