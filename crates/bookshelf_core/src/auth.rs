//! Identity and credential capabilities.
//!
//! # Responsibility
//! - Describe what an authentication layer may ask of a principal.
//! - Hash and verify passwords behind a replaceable trait.
//!
//! # Invariants
//! - Plain passwords are never stored or logged.
//! - Failed authentication does not reveal whether the email exists.

use crate::error::{CatalogError, CatalogResult};
use crate::graph::EntityGraph;
use crate::model::{Key, User};
use log::info;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const SCHEME: &str = "sha256";

/// A principal with a stable login identifier.
pub trait Identifiable {
    fn identifier(&self) -> &str;
    fn roles(&self) -> Vec<String>;
}

/// A principal holding a stored password hash.
pub trait Credentialed {
    fn password_hash(&self) -> &str;
}

impl Identifiable for User {
    fn identifier(&self) -> &str {
        self.email()
    }

    fn roles(&self) -> Vec<String> {
        User::roles(self)
    }
}

impl Credentialed for User {
    fn password_hash(&self) -> &str {
        User::password_hash(self)
    }
}

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> String;
    fn verify(&self, plain: &str, hash: &str) -> bool;
}

/// Salted SHA-256 in the form `sha256$<salt>$<hex digest>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256PasswordHasher;

impl Sha256PasswordHasher {
    fn digest(salt: &str, plain: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(b"$");
        hasher.update(plain.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}

impl PasswordHasher for Sha256PasswordHasher {
    fn hash(&self, plain: &str) -> String {
        let salt = Uuid::new_v4().simple().to_string();
        let digest = Self::digest(&salt, plain);
        format!("{SCHEME}${salt}${digest}")
    }

    fn verify(&self, plain: &str, hash: &str) -> bool {
        let mut parts = hash.splitn(3, '$');
        let (Some(scheme), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        if scheme != SCHEME {
            return false;
        }
        constant_time_eq(Self::digest(salt, plain).as_bytes(), expected.as_bytes())
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (l, r)| acc | (l ^ r))
        == 0
}

/// Resolves the user for `email` and checks `password` against its hash.
///
/// # Errors
/// - `Unauthorized` for an unknown email or a wrong password.
pub fn authenticate(
    graph: &EntityGraph,
    hasher: &dyn PasswordHasher,
    email: &str,
    password: &str,
) -> CatalogResult<Key<User>> {
    let email = email.trim().to_lowercase();
    let verified = graph
        .find_by::<User, _>(|user| user.identifier().to_lowercase() == email)
        .into_iter()
        .find(|key| {
            graph
                .get(*key)
                .is_some_and(|user| hasher.verify(password, Credentialed::password_hash(user)))
        });

    match verified {
        Some(key) => {
            info!(
                "event=auth_verify module=auth status=ok user_id={}",
                graph.id(key).map_or_else(|| "-".to_string(), |id| id.to_string())
            );
            Ok(key)
        }
        None => {
            info!("event=auth_verify module=auth status=rejected");
            Err(CatalogError::Unauthorized)
        }
    }
}
