//! Catalog use-case services.
//!
//! # Responsibility
//! - Run one unit of work per use case against a `CatalogStore`.
//! - Translate id-based requests into graph mutations and projections.
//!
//! # Invariants
//! - Every call either commits all of its changes or none.

mod catalog;
mod follow;
mod registration;

pub use catalog::{CatalogService, NewBook};
pub use follow::FollowService;
pub use registration::RegistrationService;
