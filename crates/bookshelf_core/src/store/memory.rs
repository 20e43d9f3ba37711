//! In-memory catalog store.
//!
//! Mirrors the SQLite schema rules: unique columns, foreign keys,
//! `ON DELETE CASCADE` on owned children and follow edges, and the
//! self-follow check.

use super::rows::build_graph;
use super::{AssignedIds, CatalogStore, ChangeSet, Row, RowRef, StoreError, StoreResult};
use crate::graph::EntityGraph;
use crate::model::{EntityId, EntityKind};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryCatalogStore {
    tables: Tables,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Tables {
    rows: BTreeMap<(EntityKind, EntityId), Row>,
    sequences: BTreeMap<EntityKind, EntityId>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted rows of one kind.
    pub fn row_count(&self, kind: EntityKind) -> usize {
        self.tables
            .rows
            .range((kind, EntityId::MIN)..=(kind, EntityId::MAX))
            .count()
    }

    pub fn row(&self, kind: EntityKind, id: EntityId) -> Option<&Row> {
        self.tables.rows.get(&(kind, id))
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn load(&self) -> StoreResult<EntityGraph> {
        let rows = self
            .tables
            .rows
            .iter()
            .map(|((_, id), row)| (*id, row.clone()))
            .collect::<Vec<_>>();
        build_graph(&rows)
    }

    fn apply(&mut self, changes: &ChangeSet) -> StoreResult<AssignedIds> {
        let mut next = self.tables.clone();

        for (kind, id) in &changes.deletes {
            if next.rows.remove(&(*kind, *id)).is_none() {
                return Err(StoreError::MissingRow {
                    entity: *kind,
                    id: *id,
                });
            }
            next.cascade_delete(*kind, *id);
        }

        let mut assigned = AssignedIds::default();
        let mut written = Vec::with_capacity(changes.writes.len());
        for write in &changes.writes {
            let kind = write.row.kind();
            let id = match write.target {
                RowRef::Id(id) => {
                    if !next.rows.contains_key(&(kind, id)) {
                        return Err(StoreError::MissingRow { entity: kind, id });
                    }
                    id
                }
                RowRef::Pending(key) => {
                    let id = next.allocate(kind);
                    assigned.insert(key, id);
                    id
                }
            };
            next.rows.insert((kind, id), write.row.clone());
            written.push((kind, id));
        }

        for slot in written {
            if let Some(row) = next.rows.get(&slot) {
                let resolved = row.resolved(&assigned)?;
                next.rows.insert(slot, resolved);
            }
        }

        next.check_constraints()?;
        self.tables = next;
        Ok(assigned)
    }
}

impl Tables {
    fn allocate(&mut self, kind: EntityKind) -> EntityId {
        let sequence = self.sequences.entry(kind).or_insert(0);
        *sequence += 1;
        *sequence
    }

    /// Removes rows owned by the deleted one, recursively.
    fn cascade_delete(&mut self, kind: EntityKind, id: EntityId) {
        let mut pending = vec![(kind, id)];
        while let Some((kind, id)) = pending.pop() {
            let dependents = self
                .rows
                .iter()
                .filter(|(_, row)| owned_by(row, kind, id))
                .map(|(slot, _)| *slot)
                .collect::<Vec<_>>();
            for slot in dependents {
                self.rows.remove(&slot);
                pending.push(slot);
            }
            if kind == EntityKind::User {
                for row in self.rows.values_mut() {
                    if let Row::User { following, .. } = row {
                        following.retain(|target| *target != RowRef::Id(id));
                    }
                }
            }
        }
    }

    fn check_constraints(&self) -> StoreResult<()> {
        let mut isbns = BTreeSet::new();
        let mut emails = BTreeSet::new();
        let mut contracted = BTreeSet::new();

        for ((kind, id), row) in &self.rows {
            for (field, target_kind, target) in row.references() {
                let RowRef::Id(target_id) = target else {
                    return Err(StoreError::ForeignKeyViolation(format!(
                        "{kind}.{field} is unresolved"
                    )));
                };
                if !self.rows.contains_key(&(target_kind, target_id)) {
                    return Err(StoreError::ForeignKeyViolation(format!(
                        "{kind} {id} {field} -> {target_kind} {target_id}"
                    )));
                }
            }

            match row {
                Row::Book { isbn, .. } if !isbns.insert(isbn.as_str()) => {
                    return Err(StoreError::UniqueViolation {
                        entity: EntityKind::Book,
                        field: "isbn".to_string(),
                        value: isbn.clone(),
                    });
                }
                Row::User { email, .. } if !emails.insert(email.as_str()) => {
                    return Err(StoreError::UniqueViolation {
                        entity: EntityKind::User,
                        field: "email".to_string(),
                        value: email.clone(),
                    });
                }
                Row::User { following, .. } if following.contains(&RowRef::Id(*id)) => {
                    return Err(StoreError::CheckViolation(format!(
                        "user {id} follows itself"
                    )));
                }
                Row::Contract { author, .. } if !contracted.insert(*author) => {
                    return Err(StoreError::UniqueViolation {
                        entity: EntityKind::Contract,
                        field: "author_id".to_string(),
                        value: format!("{author:?}"),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Whether `row` is removed by `ON DELETE CASCADE` when `(kind, id)` goes.
fn owned_by(row: &Row, kind: EntityKind, id: EntityId) -> bool {
    let parent = RowRef::Id(id);
    match (row, kind) {
        (Row::Contract { author, .. }, EntityKind::Author) => *author == parent,
        (Row::Book { publisher, .. }, EntityKind::Publisher) => *publisher == Some(parent),
        (Row::Review { book, .. }, EntityKind::Book) => *book == parent,
        (Row::Comment { review, .. }, EntityKind::Review) => *review == parent,
        _ => false,
    }
}
