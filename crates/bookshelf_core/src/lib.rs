//! Core domain logic for the Bookshelf catalog.
//! This crate is the single source of truth for catalog invariants.

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod fixtures;
pub mod graph;
pub mod logging;
pub mod model;
pub mod query;
pub mod service;
pub mod settings;
pub mod store;
pub mod uow;

pub use api::{
    BookDetail, BookSummary, GenreSummary, RegistrationReceipt, ResourceSummary, UserProfile,
};
pub use auth::{authenticate, Credentialed, Identifiable, PasswordHasher, Sha256PasswordHasher};
pub use error::{CatalogError, CatalogResult, IntegrityViolation};
pub use fixtures::{seed_catalog, SeedSummary};
pub use graph::{EntityGraph, FollowIndex};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::{
    Author, Book, Comment, Contract, Editor, Entity, EntityId, EntityKind, Genre, Key, Publisher,
    Review, Series, User, ValidationError,
};
pub use query::{
    CatalogReader, DispatchError, QueryDispatcher, QueryHandler, QueryOutput, QueryRequest,
};
pub use service::{CatalogService, FollowService, NewBook, RegistrationService};
pub use settings::{Settings, SettingsError};
pub use store::{
    CatalogStore, ChangeSet, MemoryCatalogStore, SqliteCatalogStore, StoreError, StoreResult,
};
pub use uow::{CommitSummary, EntityState, UnitOfWork};

/// Health-check used by the CLI.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
