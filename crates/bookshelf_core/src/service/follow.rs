//! Follow and unfollow between users.

use crate::api::UserProfile;
use crate::error::{CatalogError, CatalogResult, IntegrityViolation};
use crate::model::{EntityId, EntityKind, User};
use crate::store::CatalogStore;
use crate::uow::UnitOfWork;
use log::{info, warn};

pub struct FollowService<S: CatalogStore> {
    store: S,
}

impl<S: CatalogStore> FollowService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Makes `follower` follow `followed`. Returns `false` when the edge
    /// already existed.
    ///
    /// # Errors
    /// - `NotFound` when either user is missing.
    /// - `Integrity(SelfFollow)` when both ids are the same user.
    pub fn follow(&mut self, follower: EntityId, followed: EntityId) -> CatalogResult<bool> {
        let mut uow = UnitOfWork::begin(&self.store)?;
        let follower_key = uow.require::<User>(follower)?;
        let followed_key = uow.require::<User>(followed)?;
        if follower_key == followed_key {
            warn!(
                "event=user_follow module=service status=rejected error_code=integrity user_id={follower}"
            );
            return Err(IntegrityViolation::SelfFollow {
                user: Some(follower),
            }
            .into());
        }

        let changed = uow.graph_mut().follow(follower_key, followed_key);
        if changed {
            uow.commit(&mut self.store)?;
        }
        info!(
            "event=user_follow module=service status=ok follower_id={follower} followed_id={followed} changed={changed}"
        );
        Ok(changed)
    }

    /// Removes the edge. Returns `false` when it did not exist.
    pub fn unfollow(&mut self, follower: EntityId, followed: EntityId) -> CatalogResult<bool> {
        let mut uow = UnitOfWork::begin(&self.store)?;
        let follower_key = uow.require::<User>(follower)?;
        let followed_key = uow.require::<User>(followed)?;

        let changed = uow.graph_mut().unfollow(follower_key, followed_key);
        if changed {
            uow.commit(&mut self.store)?;
        }
        info!(
            "event=user_unfollow module=service status=ok follower_id={follower} followed_id={followed} changed={changed}"
        );
        Ok(changed)
    }

    pub fn profile(&self, user: EntityId) -> CatalogResult<UserProfile> {
        let graph = self.store.load()?;
        graph
            .find::<User>(user)
            .and_then(|key| UserProfile::from_graph(&graph, key))
            .ok_or_else(|| CatalogError::not_found(EntityKind::User, user))
    }
}
