//! User registration.

use crate::api::RegistrationReceipt;
use crate::auth::PasswordHasher;
use crate::error::{CatalogError, CatalogResult};
use crate::model::{Entity, EntityKind, User, ValidationError};
use crate::store::{CatalogStore, StoreError};
use crate::uow::UnitOfWork;
use log::{info, warn};

pub struct RegistrationService<S: CatalogStore, H: PasswordHasher> {
    store: S,
    hasher: H,
}

impl<S: CatalogStore, H: PasswordHasher> RegistrationService<S, H> {
    pub fn new(store: S, hasher: H) -> Self {
        Self { store, hasher }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Registers a user with an empty stored role set.
    ///
    /// The email is trimmed and lowercased. A blank username defaults to the
    /// email's local part.
    ///
    /// # Errors
    /// - `Validation` for a malformed email or blank password.
    /// - `Conflict` when the email is already registered.
    pub fn register(
        &mut self,
        email: &str,
        username: &str,
        password: &str,
    ) -> CatalogResult<RegistrationReceipt> {
        let email = email.trim().to_lowercase();
        if password.trim().is_empty() {
            return Err(
                ValidationError::new(EntityKind::User, "password", "must not be blank").into(),
            );
        }

        let username = match username.trim() {
            "" => email.split('@').next().unwrap_or_default().to_string(),
            given => given.to_string(),
        };
        let candidate = User::new(email.clone(), username, "pending");
        candidate.validate()?;

        let mut uow = UnitOfWork::begin(&self.store)?;
        let taken = !uow
            .graph()
            .find_by::<User, _>(|user| user.email().to_lowercase() == email)
            .is_empty();
        if taken {
            warn!("event=user_register module=service status=rejected error_code=conflict");
            return Err(CatalogError::conflict(EntityKind::User, "email", email));
        }

        let mut user = candidate;
        user.set_password_hash(self.hasher.hash(password));
        let key = uow.add(user);
        uow.commit(&mut self.store)?;

        let id = uow.graph().id(key).ok_or_else(|| {
            CatalogError::Store(StoreError::InvalidData(
                "registered user has no id after commit".to_string(),
            ))
        })?;
        info!("event=user_register module=service status=ok user_id={id}");
        Ok(RegistrationReceipt { id, email })
    }
}

#[cfg(test)]
mod tests {
    use super::RegistrationService;
    use crate::auth::Sha256PasswordHasher;
    use crate::error::CatalogError;
    use crate::model::{EntityKind, User};
    use crate::store::{CatalogStore, MemoryCatalogStore};

    fn service() -> RegistrationService<MemoryCatalogStore, Sha256PasswordHasher> {
        RegistrationService::new(MemoryCatalogStore::new(), Sha256PasswordHasher)
    }

    #[test]
    fn username_defaults_to_local_part() {
        let mut service = service();
        let receipt = service.register(" Lucia@Editorial.com ", "", "pw").unwrap();
        assert_eq!(receipt.email, "lucia@editorial.com");

        let graph = service.store().load().unwrap();
        let key = graph.find::<User>(receipt.id).unwrap();
        assert_eq!(graph.get(key).unwrap().username(), "lucia");
    }

    #[test]
    fn blank_password_and_bad_email_are_validation_errors() {
        let mut service = service();
        assert!(matches!(
            service.register("a@b.com", "a", "  "),
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            service.register("not-an-email", "a", "pw"),
            Err(CatalogError::Validation(_))
        ));
        assert_eq!(service.store().row_count(EntityKind::User), 0);
    }
}
