//! Catalog domain model.
//!
//! # Responsibility
//! - Define the catalog entities and their scalar fields.
//! - Declare relationship metadata consumed by the unit of work.
//!
//! # Invariants
//! - Relationship fields are only written by the association synchronizer
//!   in `crate::graph`; entities expose read accessors for them.
//! - Surrogate ids live in the arena slot, not on the entity.
//!
//! # See also
//! - `crate::graph` for storage and relationship mutators.

pub mod author;
pub mod book;
pub mod comment;
pub mod contract;
pub mod editor;
pub mod genre;
pub mod key;
pub mod kind;
pub mod publisher;
pub mod relation;
pub mod review;
pub mod series;
pub mod user;
pub mod validation;

pub use author::Author;
pub use book::Book;
pub use comment::Comment;
pub use contract::Contract;
pub use editor::Editor;
pub use genre::Genre;
pub use key::{AnyKey, Key};
pub use kind::EntityKind;
pub use publisher::Publisher;
pub use relation::{Multiplicity, RelationId, RelationSpec, RemovePolicy, RELATIONS};
pub use review::Review;
pub use series::Series;
pub use user::{User, ROLE_ADMIN, ROLE_USER};
pub use validation::ValidationError;

use crate::graph::{Arena, EntityGraph};
use std::fmt::Debug;

/// Surrogate identifier assigned by the store on first commit.
pub type EntityId = i64;

/// Common behavior of every catalog entity.
pub trait Entity: Clone + Debug + Send + Sized + 'static {
    const KIND: EntityKind;

    /// Checks scalar fields. Relationship requirements are checked at commit.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Short human-readable label used by generic listings.
    fn label(&self) -> String;

    #[doc(hidden)]
    fn arena(graph: &EntityGraph) -> &Arena<Self>;

    #[doc(hidden)]
    fn arena_mut(graph: &mut EntityGraph) -> &mut Arena<Self>;
}
