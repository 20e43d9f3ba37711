//! User entity.
//!
//! Follow edges are not stored on the user; see `crate::graph::FollowIndex`.

use super::validation::{require_email, require_text};
use super::{Entity, EntityKind, ValidationError};
use crate::graph::{Arena, EntityGraph};
use std::collections::BTreeSet;

/// Role every user holds, whether stored or not.
pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

#[derive(Debug, Clone)]
pub struct User {
    email: String,
    username: String,
    password_hash: String,
    roles: Vec<String>,
}

impl User {
    /// Creates a user with an empty stored role set.
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password_hash: password_hash.into(),
            roles: Vec::new(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Effective roles: stored roles plus `ROLE_USER`, deduplicated.
    pub fn roles(&self) -> Vec<String> {
        let mut roles = self.roles.clone();
        roles.push(ROLE_USER.to_string());
        let mut seen = BTreeSet::new();
        roles.retain(|role| seen.insert(role.clone()));
        roles
    }

    /// Roles exactly as persisted.
    pub fn stored_roles(&self) -> &[String] {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        role == ROLE_USER || self.roles.iter().any(|stored| stored == role)
    }

    pub fn set_email(&mut self, value: impl Into<String>) {
        self.email = value.into();
    }

    pub fn set_username(&mut self, value: impl Into<String>) {
        self.username = value.into();
    }

    pub fn set_password_hash(&mut self, value: impl Into<String>) {
        self.password_hash = value.into();
    }

    pub fn set_roles<I, S>(&mut self, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.clear();
        for role in roles {
            self.add_role(role);
        }
    }

    /// Adds a stored role. Returns `false` when already present.
    pub fn add_role(&mut self, role: impl Into<String>) -> bool {
        let role = role.into();
        if self.roles.contains(&role) {
            return false;
        }
        self.roles.push(role);
        true
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn validate(&self) -> Result<(), ValidationError> {
        require_email(Self::KIND, "email", &self.email)?;
        require_text(Self::KIND, "username", &self.username)?;
        require_text(Self::KIND, "password", &self.password_hash)?;
        if let Some(role) = self.roles.iter().find(|role| role.trim().is_empty()) {
            return Err(ValidationError::new(
                Self::KIND,
                "roles",
                format!("role `{role}` must not be blank"),
            ));
        }
        Ok(())
    }

    fn label(&self) -> String {
        self.email.clone()
    }

    fn arena(graph: &EntityGraph) -> &Arena<Self> {
        &graph.users
    }

    fn arena_mut(graph: &mut EntityGraph) -> &mut Arena<Self> {
        &mut graph.users
    }
}
