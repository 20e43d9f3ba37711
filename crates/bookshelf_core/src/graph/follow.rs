//! Directional follow edges between users.
//!
//! # Invariants
//! - `forward[a]` contains `b` exactly when `reverse[b]` contains `a`.
//! - A user never follows themselves.

use crate::model::{Key, User};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct FollowIndex {
    forward: BTreeMap<Key<User>, BTreeSet<Key<User>>>,
    reverse: BTreeMap<Key<User>, BTreeSet<Key<User>>>,
}

impl FollowIndex {
    pub(crate) fn insert(&mut self, follower: Key<User>, followed: Key<User>) -> bool {
        if follower == followed {
            return false;
        }
        let added = self.forward.entry(follower).or_default().insert(followed);
        if added {
            self.reverse.entry(followed).or_default().insert(follower);
        }
        added
    }

    pub(crate) fn remove(&mut self, follower: Key<User>, followed: Key<User>) -> bool {
        let removed = detach(&mut self.forward, follower, followed);
        if removed {
            detach(&mut self.reverse, followed, follower);
        }
        removed
    }

    /// Drops every edge touching `user` and returns the other endpoints.
    pub(crate) fn purge(&mut self, user: Key<User>) -> BTreeSet<Key<User>> {
        let mut affected = BTreeSet::new();
        for followed in self.forward.remove(&user).unwrap_or_default() {
            detach(&mut self.reverse, followed, user);
            affected.insert(followed);
        }
        for follower in self.reverse.remove(&user).unwrap_or_default() {
            detach(&mut self.forward, follower, user);
            affected.insert(follower);
        }
        affected
    }

    pub fn contains(&self, follower: Key<User>, followed: Key<User>) -> bool {
        self.forward
            .get(&follower)
            .is_some_and(|edges| edges.contains(&followed))
    }

    /// Users that `user` follows.
    pub fn following(&self, user: Key<User>) -> Vec<Key<User>> {
        collect(&self.forward, user)
    }

    /// Users following `user`.
    pub fn followers(&self, user: Key<User>) -> Vec<Key<User>> {
        collect(&self.reverse, user)
    }

    pub fn edge_count(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }
}

fn detach(
    edges: &mut BTreeMap<Key<User>, BTreeSet<Key<User>>>,
    from: Key<User>,
    to: Key<User>,
) -> bool {
    let Some(targets) = edges.get_mut(&from) else {
        return false;
    };
    let removed = targets.remove(&to);
    if targets.is_empty() {
        edges.remove(&from);
    }
    removed
}

fn collect(edges: &BTreeMap<Key<User>, BTreeSet<Key<User>>>, user: Key<User>) -> Vec<Key<User>> {
    edges
        .get(&user)
        .map(|targets| targets.iter().copied().collect())
        .unwrap_or_default()
}
