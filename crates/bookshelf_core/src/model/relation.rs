//! Declared relationship metadata.
//!
//! # Responsibility
//! - Describe every bidirectional relationship once: sides, multiplicity,
//!   nullability and lifecycle flags.
//! - Drive cascade, orphan-removal and restrict resolution at commit.
//!
//! # Invariants
//! - Every `RelationId` has exactly one entry in `RELATIONS`, at the
//!   position of its discriminant.
//! - `on_remove` describes what happens to owning-side entities when the
//!   inverse-side entity is removed. Removing an owning-side entity always
//!   detaches it from the inverse collection.

use super::EntityKind;

/// Cardinality seen from the owning side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    OneToOne,
    ManyToOne,
    ManyToMany,
}

/// Effect on owners when the inverse-side entity is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovePolicy {
    /// Removal fails while a surviving owner still references the entity.
    Restrict,
    /// Owners are removed together with the entity.
    Cascade,
    /// Owners survive and the link is dropped.
    Detach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationId {
    ContractAuthor,
    BookAuthor,
    BookSeries,
    BookPublisher,
    BookGenre,
    BookEditor,
    ReviewBook,
    CommentReview,
    UserFollow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationSpec {
    pub id: RelationId,
    pub owning: EntityKind,
    pub inverse: EntityKind,
    pub owning_field: &'static str,
    pub inverse_field: &'static str,
    pub multiplicity: Multiplicity,
    /// Whether the owning reference may be empty.
    pub nullable: bool,
    /// Persisting the inverse entity also persists its new owners.
    pub cascade_persist: bool,
    pub cascade_remove: bool,
    /// Owners detached from the inverse collection are removed at commit.
    pub orphan_removal: bool,
    pub on_remove: RemovePolicy,
}

pub static RELATIONS: &[RelationSpec] = &[
    RelationSpec {
        id: RelationId::ContractAuthor,
        owning: EntityKind::Contract,
        inverse: EntityKind::Author,
        owning_field: "author",
        inverse_field: "contract",
        multiplicity: Multiplicity::OneToOne,
        nullable: false,
        cascade_persist: true,
        cascade_remove: true,
        orphan_removal: false,
        on_remove: RemovePolicy::Cascade,
    },
    RelationSpec {
        id: RelationId::BookAuthor,
        owning: EntityKind::Book,
        inverse: EntityKind::Author,
        owning_field: "author",
        inverse_field: "books",
        multiplicity: Multiplicity::ManyToOne,
        nullable: false,
        cascade_persist: false,
        cascade_remove: false,
        orphan_removal: false,
        on_remove: RemovePolicy::Restrict,
    },
    RelationSpec {
        id: RelationId::BookSeries,
        owning: EntityKind::Book,
        inverse: EntityKind::Series,
        owning_field: "series",
        inverse_field: "books",
        multiplicity: Multiplicity::ManyToOne,
        nullable: true,
        cascade_persist: false,
        cascade_remove: false,
        orphan_removal: false,
        on_remove: RemovePolicy::Restrict,
    },
    RelationSpec {
        id: RelationId::BookPublisher,
        owning: EntityKind::Book,
        inverse: EntityKind::Publisher,
        owning_field: "publisher",
        inverse_field: "books",
        multiplicity: Multiplicity::ManyToOne,
        nullable: true,
        cascade_persist: false,
        cascade_remove: true,
        orphan_removal: true,
        on_remove: RemovePolicy::Cascade,
    },
    RelationSpec {
        id: RelationId::BookGenre,
        owning: EntityKind::Book,
        inverse: EntityKind::Genre,
        owning_field: "genres",
        inverse_field: "books",
        multiplicity: Multiplicity::ManyToMany,
        nullable: true,
        cascade_persist: false,
        cascade_remove: false,
        orphan_removal: false,
        on_remove: RemovePolicy::Restrict,
    },
    RelationSpec {
        id: RelationId::BookEditor,
        owning: EntityKind::Book,
        inverse: EntityKind::Editor,
        owning_field: "editors",
        inverse_field: "books",
        multiplicity: Multiplicity::ManyToMany,
        nullable: true,
        cascade_persist: false,
        cascade_remove: false,
        orphan_removal: false,
        on_remove: RemovePolicy::Restrict,
    },
    RelationSpec {
        id: RelationId::ReviewBook,
        owning: EntityKind::Review,
        inverse: EntityKind::Book,
        owning_field: "book",
        inverse_field: "reviews",
        multiplicity: Multiplicity::ManyToOne,
        nullable: false,
        cascade_persist: false,
        cascade_remove: true,
        orphan_removal: true,
        on_remove: RemovePolicy::Cascade,
    },
    RelationSpec {
        id: RelationId::CommentReview,
        owning: EntityKind::Comment,
        inverse: EntityKind::Review,
        owning_field: "review",
        inverse_field: "comments",
        multiplicity: Multiplicity::ManyToOne,
        nullable: false,
        cascade_persist: false,
        cascade_remove: true,
        orphan_removal: true,
        on_remove: RemovePolicy::Cascade,
    },
    RelationSpec {
        id: RelationId::UserFollow,
        owning: EntityKind::User,
        inverse: EntityKind::User,
        owning_field: "following",
        inverse_field: "followers",
        multiplicity: Multiplicity::ManyToMany,
        nullable: true,
        cascade_persist: false,
        cascade_remove: false,
        orphan_removal: false,
        on_remove: RemovePolicy::Detach,
    },
];

/// Looks up the declaration of one relationship.
pub fn relation(id: RelationId) -> &'static RelationSpec {
    &RELATIONS[id as usize]
}

/// Relationships whose owning side is `kind`.
pub fn owned_by(kind: EntityKind) -> impl Iterator<Item = &'static RelationSpec> {
    RELATIONS.iter().filter(move |spec| spec.owning == kind)
}

/// Relationships whose inverse side is `kind`.
pub fn inverse_of(kind: EntityKind) -> impl Iterator<Item = &'static RelationSpec> {
    RELATIONS.iter().filter(move |spec| spec.inverse == kind)
}
