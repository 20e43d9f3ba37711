use bookshelf_core::fixtures::SEED_PASSWORD;
use bookshelf_core::model::{ROLE_ADMIN, ROLE_USER};
use bookshelf_core::{
    authenticate, CatalogError, CatalogStore, EntityKind, MemoryCatalogStore, PasswordHasher,
    RegistrationService, Sha256PasswordHasher, User,
};

fn service() -> RegistrationService<MemoryCatalogStore, Sha256PasswordHasher> {
    RegistrationService::new(MemoryCatalogStore::new(), Sha256PasswordHasher)
}

#[test]
fn register_returns_receipt_and_default_role() {
    let mut service = service();
    let receipt = service
        .register("lector@editorial.com", "lector", "secreto")
        .unwrap();
    assert_eq!(receipt.email, "lector@editorial.com");

    let json = serde_json::to_value(&receipt).unwrap();
    assert_eq!(json.as_object().unwrap().len(), 2);
    assert_eq!(json["id"], receipt.id);

    let graph = service.store().load().unwrap();
    let user = graph.get(graph.find::<User>(receipt.id).unwrap()).unwrap();
    assert!(user.stored_roles().is_empty());
    assert_eq!(user.roles(), vec![ROLE_USER.to_string()]);
    assert_ne!(user.password_hash(), "secreto");
}

#[test]
fn duplicate_email_conflicts_without_creating_row() {
    let mut service = service();
    service.register("dup@editorial.com", "uno", "pw").unwrap();

    let err = service
        .register("  DUP@editorial.com", "dos", "pw")
        .unwrap_err();
    match err {
        CatalogError::Conflict {
            entity,
            field,
            value,
        } => {
            assert_eq!(entity, EntityKind::User);
            assert_eq!(field, "email");
            assert_eq!(value, "dup@editorial.com");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.store().row_count(EntityKind::User), 1);
}

#[test]
fn authenticate_verifies_registered_password() {
    let hasher = Sha256PasswordHasher;
    let mut service = service();
    let receipt = service.register("ana@editorial.com", "", "pw").unwrap();
    let graph = service.store().load().unwrap();

    let key = authenticate(&graph, &hasher, "ana@editorial.com", "pw").unwrap();
    assert_eq!(graph.id(key), Some(receipt.id));
    assert!(matches!(
        authenticate(&graph, &hasher, "ana@editorial.com", "wrong"),
        Err(CatalogError::Unauthorized)
    ));
}

#[test]
fn admin_roles_include_default_role_once() {
    let mut user = User::new("admin@editorial.com", "AdminUser", "h");
    user.set_roles([ROLE_ADMIN, ROLE_USER]);
    assert_eq!(
        user.roles(),
        vec![ROLE_ADMIN.to_string(), ROLE_USER.to_string()]
    );
    assert!(user.has_role(ROLE_ADMIN));
    assert!(Sha256PasswordHasher.verify(SEED_PASSWORD, &Sha256PasswordHasher.hash(SEED_PASSWORD)));
}
