//! Commit planning.
//!
//! # Responsibility
//! - Resolve persist cascades, remove cascades and orphan removal.
//! - Enforce restrict, required-reference, reachability and uniqueness rules.
//! - Produce the ordered `ChangeSet` for the store.
//!
//! # Invariants
//! - Planning never mutates the graph; a rejected plan leaves the unit of
//!   work exactly as it was.

use crate::error::{CatalogError, CatalogResult, IntegrityViolation};
use crate::graph::EntityGraph;
use crate::model::relation::{inverse_of, owned_by};
use crate::model::{AnyKey, Book, EntityKind, RemovePolicy, User, ValidationError, RELATIONS};
use crate::store::{snapshot_row, ChangeSet, RowRef, RowWrite};
use std::collections::{BTreeMap, BTreeSet};

pub(crate) struct CommitPlan {
    pub changes: ChangeSet,
    /// Entities dropped from the graph once the store accepted the changes.
    pub removals: BTreeSet<AnyKey>,
}

pub(crate) fn plan_commit(
    graph: &EntityGraph,
    staged_persist: &BTreeSet<AnyKey>,
    staged_remove: &BTreeSet<AnyKey>,
) -> CatalogResult<CommitPlan> {
    let is_new = |key: &AnyKey| graph.id_any(*key).is_none();
    let is_managed = |key: &AnyKey| graph.id_any(*key).is_some();

    let mut persist = cascade_persist(graph, staged_persist);
    let removals = cascade_remove(graph, staged_remove, &persist);
    persist.retain(|key| !removals.contains(key));

    let alive = |key: &AnyKey| {
        graph.contains_any(*key)
            && !removals.contains(key)
            && (is_managed(key) || persist.contains(key))
    };

    check_restrict(graph, &removals, &alive)?;

    let checked = persist
        .iter()
        .copied()
        .chain(
            graph
                .touched
                .iter()
                .copied()
                .filter(|key| graph.contains_any(*key) && is_managed(key)),
        )
        .filter(|key| !removals.contains(key))
        .collect::<BTreeSet<_>>();

    for key in &checked {
        graph.validate_any(*key)?;
        check_required(graph, *key)?;
        check_reachable(graph, *key, &persist, &removals, &is_new)?;
        check_self_follow(graph, *key)?;
    }
    check_unique(graph, &alive)?;

    let mut changes = ChangeSet::default();
    let mut deletes = removals
        .iter()
        .filter_map(|key| graph.id_any(*key).map(|id| (key.kind, id)))
        .collect::<Vec<_>>();
    deletes.sort_by(|left, right| right.0.cmp(&left.0).then(left.1.cmp(&right.1)));
    changes.deletes = deletes;

    // `checked` iterates kind first, and kinds are declared in insert order.
    for key in &checked {
        let Some(row) = snapshot_row(graph, *key, &removals) else {
            continue;
        };
        let target = match graph.id_any(*key) {
            Some(id) => RowRef::Id(id),
            None => RowRef::Pending(*key),
        };
        changes.writes.push(RowWrite { target, row });
    }

    Ok(CommitPlan { changes, removals })
}

/// Staged new entities plus new owners reachable through persist cascades.
fn cascade_persist(graph: &EntityGraph, staged: &BTreeSet<AnyKey>) -> BTreeSet<AnyKey> {
    let mut persist = staged
        .iter()
        .copied()
        .filter(|key| graph.contains_any(*key) && graph.id_any(*key).is_none())
        .collect::<BTreeSet<_>>();

    let mut queue = persist
        .iter()
        .copied()
        .chain(
            graph
                .touched
                .iter()
                .copied()
                .filter(|key| graph.id_any(*key).is_some()),
        )
        .collect::<Vec<_>>();
    while let Some(key) = queue.pop() {
        for spec in inverse_of(key.kind).filter(|spec| spec.cascade_persist) {
            for owner in graph.owners(spec.id, key) {
                if graph.id_any(owner).is_none() && persist.insert(owner) {
                    queue.push(owner);
                }
            }
        }
    }
    persist
}

/// Staged removals, orphans and everything reached by remove cascades.
fn cascade_remove(
    graph: &EntityGraph,
    staged: &BTreeSet<AnyKey>,
    persist: &BTreeSet<AnyKey>,
) -> BTreeSet<AnyKey> {
    let mut removals = staged
        .iter()
        .copied()
        .filter(|key| graph.contains_any(*key))
        .collect::<BTreeSet<_>>();

    for spec in RELATIONS.iter().filter(|spec| spec.orphan_removal) {
        let journaled = graph
            .orphaned
            .iter()
            .copied()
            .filter(|key| key.kind == spec.owning);
        let parentless = graph
            .keys_any(spec.owning)
            .into_iter()
            .filter(|key| !spec.nullable && graph.id_any(*key).is_some());
        for key in journaled.chain(parentless) {
            let tracked = graph.id_any(key).is_some() || persist.contains(&key);
            if tracked && graph.contains_any(key) && graph.targets(spec.id, key).is_empty() {
                removals.insert(key);
            }
        }
    }

    let mut queue = removals.iter().copied().collect::<Vec<_>>();
    while let Some(key) = queue.pop() {
        for spec in inverse_of(key.kind).filter(|spec| spec.on_remove == RemovePolicy::Cascade) {
            for owner in graph.owners(spec.id, key) {
                if removals.insert(owner) {
                    queue.push(owner);
                }
            }
        }
    }
    removals
}

fn check_restrict(
    graph: &EntityGraph,
    removals: &BTreeSet<AnyKey>,
    alive: &impl Fn(&AnyKey) -> bool,
) -> CatalogResult<()> {
    for key in removals {
        for spec in inverse_of(key.kind).filter(|spec| spec.on_remove == RemovePolicy::Restrict) {
            let count = graph
                .owners(spec.id, *key)
                .iter()
                .filter(|owner| alive(owner))
                .count();
            if count > 0 {
                return Err(IntegrityViolation::RestrictedRemoval {
                    entity: key.kind,
                    id: graph.id_any(*key),
                    referenced_by: spec.owning,
                    field: spec.owning_field,
                    count,
                }
                .into());
            }
        }
    }
    Ok(())
}

fn check_required(graph: &EntityGraph, key: AnyKey) -> CatalogResult<()> {
    for spec in owned_by(key.kind).filter(|spec| !spec.nullable) {
        if graph.targets(spec.id, key).is_empty() {
            return Err(ValidationError::new(key.kind, spec.owning_field, "is required").into());
        }
    }
    Ok(())
}

fn check_reachable(
    graph: &EntityGraph,
    key: AnyKey,
    persist: &BTreeSet<AnyKey>,
    removals: &BTreeSet<AnyKey>,
    is_new: &impl Fn(&AnyKey) -> bool,
) -> CatalogResult<()> {
    let outgoing = owned_by(key.kind).flat_map(|spec| {
        graph
            .targets(spec.id, key)
            .into_iter()
            .map(move |target| (spec.owning_field, target))
    });
    let incoming = inverse_of(key.kind).flat_map(|spec| {
        graph
            .owners(spec.id, key)
            .into_iter()
            .map(move |owner| (spec.inverse_field, owner))
    });

    for (field, neighbor) in outgoing.chain(incoming) {
        if is_new(&neighbor) && !persist.contains(&neighbor) && !removals.contains(&neighbor) {
            return Err(IntegrityViolation::UnstagedReference {
                from: key.kind,
                to: neighbor.kind,
                field,
            }
            .into());
        }
    }
    Ok(())
}

fn check_self_follow(graph: &EntityGraph, key: AnyKey) -> CatalogResult<()> {
    match key.typed::<User>() {
        Some(user) if graph.is_following(user, user) => Err(IntegrityViolation::SelfFollow {
            user: graph.id(user),
        }
        .into()),
        _ => Ok(()),
    }
}

fn check_unique(graph: &EntityGraph, alive: &impl Fn(&AnyKey) -> bool) -> CatalogResult<()> {
    let mut isbns = BTreeMap::new();
    for (key, book) in graph.iter::<Book>() {
        if alive(&key.erase()) && isbns.insert(book.isbn().trim(), key).is_some() {
            return Err(CatalogError::conflict(
                EntityKind::Book,
                "isbn",
                book.isbn(),
            ));
        }
    }

    let mut emails = BTreeMap::new();
    for (key, user) in graph.iter::<User>() {
        let email = user.email().trim().to_lowercase();
        if alive(&key.erase()) && emails.insert(email, key).is_some() {
            return Err(CatalogError::conflict(
                EntityKind::User,
                "email",
                user.email(),
            ));
        }
    }
    Ok(())
}
