//! Unit of work over one isolated working set.
//!
//! # Responsibility
//! - Load the working set from a store and stage persist/remove operations.
//! - Resolve cascades and integrity rules at commit, then apply the result
//!   atomically through the store.
//!
//! # Invariants
//! - A failed commit changes neither the store nor the working set: staged
//!   operations stay staged and no ids are assigned.
//! - After a successful commit every staged entity has an id, removed
//!   entities are gone from the graph and nothing is staged.
//!
//! # See also
//! - `crate::model::relation` for the cascade and restrict declarations.

mod plan;

use crate::error::{CatalogError, CatalogResult};
use crate::graph::EntityGraph;
use crate::model::{AnyKey, Entity, EntityId, Key};
use crate::store::CatalogStore;
use log::{error, info, warn};
use std::collections::BTreeSet;
use std::time::Instant;

/// Lifecycle state of one entity inside a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Constructed but never staged; not written on commit.
    New,
    /// New and staged for insertion.
    StagedPersist,
    /// Loaded from or written to the store.
    Managed,
    /// Staged for removal.
    StagedRemove,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
}

#[derive(Debug, Default)]
pub struct UnitOfWork {
    graph: EntityGraph,
    staged_persist: BTreeSet<AnyKey>,
    staged_remove: BTreeSet<AnyKey>,
}

impl UnitOfWork {
    /// Starts with an empty working set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with the store's persisted graph as working set.
    pub fn begin<S: CatalogStore + ?Sized>(store: &S) -> CatalogResult<Self> {
        let graph = store.load()?;
        Ok(Self {
            graph,
            ..Self::default()
        })
    }

    pub fn graph(&self) -> &EntityGraph {
        &self.graph
    }

    /// Mutable graph access for relationship mutators and scalar edits.
    pub fn graph_mut(&mut self) -> &mut EntityGraph {
        &mut self.graph
    }

    /// Adds an entity to the working set without staging it.
    pub fn create<T: Entity>(&mut self, value: T) -> Key<T> {
        self.graph.insert(value)
    }

    /// Adds an entity and stages it for insertion.
    pub fn add<T: Entity>(&mut self, value: T) -> Key<T> {
        let key = self.create(value);
        self.persist(key);
        key
    }

    /// Stages an entity for insertion, or cancels a staged removal.
    ///
    /// Returns `false` when the key is absent or nothing changed.
    pub fn persist<T: Entity>(&mut self, key: Key<T>) -> bool {
        if !self.graph.contains(key) {
            return false;
        }
        let erased = key.erase();
        let unremoved = self.staged_remove.remove(&erased);
        let staged = self.graph.id(key).is_none() && self.staged_persist.insert(erased);
        unremoved || staged
    }

    /// Stages an entity for removal at commit.
    pub fn remove<T: Entity>(&mut self, key: Key<T>) -> bool {
        if !self.graph.contains(key) {
            return false;
        }
        let erased = key.erase();
        self.staged_persist.remove(&erased);
        self.staged_remove.insert(erased)
    }

    /// Resolves a persisted id or fails with `NotFound`.
    pub fn require<T: Entity>(&self, id: EntityId) -> CatalogResult<Key<T>> {
        self.graph
            .find::<T>(id)
            .filter(|key| !self.staged_remove.contains(&key.erase()))
            .ok_or_else(|| CatalogError::not_found(T::KIND, id))
    }

    pub fn state<T: Entity>(&self, key: Key<T>) -> Option<EntityState> {
        if !self.graph.contains(key) {
            return None;
        }
        let erased = key.erase();
        let state = if self.staged_remove.contains(&erased) {
            EntityState::StagedRemove
        } else if self.graph.id(key).is_some() {
            EntityState::Managed
        } else if self.staged_persist.contains(&erased) {
            EntityState::StagedPersist
        } else {
            EntityState::New
        };
        Some(state)
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.staged_persist.is_empty()
            || !self.staged_remove.is_empty()
            || self.graph.has_changes()
    }

    /// Drops staged operations. Scalar and relationship edits already made
    /// in the graph are kept.
    pub fn clear_staged(&mut self) {
        self.staged_persist.clear();
        self.staged_remove.clear();
    }

    /// Resolves all pending work and applies it atomically through `store`.
    pub fn commit<S: CatalogStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> CatalogResult<CommitSummary> {
        let started_at = Instant::now();

        let plan = match plan::plan_commit(&self.graph, &self.staged_persist, &self.staged_remove)
        {
            Ok(plan) => plan,
            Err(err) => {
                warn!(
                    "event=uow_commit module=uow status=rejected duration_ms={} error_code={}",
                    started_at.elapsed().as_millis(),
                    err.code()
                );
                return Err(err);
            }
        };

        let summary = CommitSummary {
            inserted: plan.changes.insert_count(),
            updated: plan.changes.update_count(),
            removed: plan.changes.deletes.len(),
        };

        if !plan.changes.is_empty() {
            let assigned = match store.apply(&plan.changes) {
                Ok(assigned) => assigned,
                Err(err) => {
                    let err = CatalogError::from(err);
                    error!(
                        "event=uow_commit module=uow status=error duration_ms={} error_code={} error={}",
                        started_at.elapsed().as_millis(),
                        err.code(),
                        err
                    );
                    return Err(err);
                }
            };
            for (key, id) in assigned.iter() {
                self.graph.assign_id_any(key, id);
            }
        }

        for key in &plan.removals {
            self.graph.purge(*key);
        }
        self.clear_staged();
        self.graph.clear_journal();

        info!(
            "event=uow_commit module=uow status=ok duration_ms={} inserted={} updated={} removed={}",
            started_at.elapsed().as_millis(),
            summary.inserted,
            summary.updated,
            summary.removed
        );
        Ok(summary)
    }

    pub fn into_graph(self) -> EntityGraph {
        self.graph
    }
}
