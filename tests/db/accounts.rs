//! Account CRUD and role management tests

#[path = "../common/mod.rs"]
mod common;

use common::*;

// ============ Creation ============

#[test]
fn test_create_account() {
    let conn = setup_test_db();
    let account = create_test_account(&conn, "alice");

    assert!(!account.id.is_empty(), "account should have a generated ID");
    assert_eq!(account.username, "alice", "username should match input");
    assert_eq!(account.role, Role::User, "new accounts start as plain users");
    assert!(account.hwid.is_none(), "new accounts have no device binding");
    assert!(
        account.subscription_tier.is_none(),
        "new accounts have no subscription"
    );
}

#[test]
fn test_create_account_stores_email() {
    let conn = setup_test_db();
    let input = CreateAccount {
        username: "bob".to_string(),
        password: "password123".to_string(),
        email: Some("bob@example.com".to_string()),
    };
    let hash = hash_password("password123").unwrap();
    let account = queries::create_account(&conn, &input, &hash).unwrap();

    assert_eq!(account.email.as_deref(), Some("bob@example.com"));
}

#[test]
fn test_create_account_duplicate_username_conflicts() {
    let conn = setup_test_db();
    create_test_account(&conn, "alice");

    let input = CreateAccount {
        username: "alice".to_string(),
        password: "different456".to_string(),
        email: None,
    };
    let hash = hash_password("different456").unwrap();
    let err = queries::create_account(&conn, &input, &hash).unwrap_err();

    assert!(
        matches!(err, AppError::Conflict(_)),
        "duplicate username should conflict, got {:?}",
        err
    );
}

#[test]
fn test_password_is_stored_hashed() {
    let conn = setup_test_db();
    let account = create_test_account(&conn, "alice");

    assert_ne!(
        account.password_hash, "password123",
        "plaintext password must never be stored"
    );
    assert!(
        verify_password("password123", &account.password_hash).unwrap(),
        "stored hash should verify against the password"
    );
}

// ============ Lookup ============

#[test]
fn test_get_account_by_username() {
    let conn = setup_test_db();
    let created = create_test_account(&conn, "alice");

    let fetched = queries::get_account_by_username(&conn, "alice")
        .expect("Query failed")
        .expect("Account not found");

    assert_eq!(fetched.id, created.id, "fetched account should match created");
}

#[test]
fn test_get_account_by_username_is_case_sensitive() {
    let conn = setup_test_db();
    create_test_account(&conn, "Alice");

    let fetched = queries::get_account_by_username(&conn, "alice").expect("Query failed");

    assert!(fetched.is_none(), "username lookup is exact, not folded");
}

#[test]
fn test_list_accounts() {
    let conn = setup_test_db();
    create_test_account(&conn, "alice");
    create_test_account(&conn, "bob");
    create_test_account(&conn, "carol");

    let accounts = queries::list_accounts(&conn).expect("Query failed");

    assert_eq!(accounts.len(), 3, "should return all 3 created accounts");
}

// ============ Roles ============

#[test]
fn test_set_account_role() {
    let conn = setup_test_db();
    let account = create_test_account(&conn, "alice");

    let updated = queries::set_account_role(&conn, &account.id, Role::Media).unwrap();
    assert!(updated, "role update should report success");

    let fetched = queries::get_account_by_id(&conn, &account.id)
        .unwrap()
        .unwrap();
    assert_eq!(fetched.role, Role::Media);
}

#[test]
fn test_set_role_unknown_account_returns_false() {
    let conn = setup_test_db();

    let updated = queries::set_account_role(&conn, "no-such-id", Role::Admin).unwrap();

    assert!(!updated, "unknown account should not report an update");
}

#[test]
fn test_list_accounts_by_role() {
    let conn = setup_test_db();
    create_test_account(&conn, "alice");
    create_test_media(&conn, "mediabob");
    create_test_media(&conn, "mediacarol");
    create_test_admin(&conn, "root");

    let media = queries::list_accounts_by_role(&conn, Role::Media).unwrap();

    assert_eq!(media.len(), 2, "should return only media accounts");
    assert!(media.iter().all(|a| a.role == Role::Media));
}

#[test]
fn test_count_admins() {
    let conn = setup_test_db();
    assert_eq!(queries::count_admins(&conn).unwrap(), 0);

    create_test_account(&conn, "alice");
    create_test_admin(&conn, "root");

    assert_eq!(queries::count_admins(&conn).unwrap(), 1);
}

// ============ Password update ============

#[test]
fn test_update_account_password() {
    let conn = setup_test_db();
    let account = create_test_account(&conn, "alice");

    let new_hash = hash_password("newpassword456").unwrap();
    let updated = queries::update_account_password(&conn, &account.id, &new_hash).unwrap();
    assert!(updated);

    let fetched = queries::get_account_by_id(&conn, &account.id)
        .unwrap()
        .unwrap();
    assert!(verify_password("newpassword456", &fetched.password_hash).unwrap());
    assert!(!verify_password("password123", &fetched.password_hash).unwrap());
}

// ============ Deletion ============

#[test]
fn test_delete_account_removes_owned_rows() {
    let mut conn = setup_test_db();
    let account = create_test_account(&conn, "alice");
    let token = open_test_session(&conn, &account.id);

    queries::create_config(
        &conn,
        &account,
        &CreateConfig {
            name: "my settings".to_string(),
            description: None,
            content: "sens=2.4".to_string(),
            private: false,
        },
    )
    .unwrap();

    let key = create_test_key(&conn, "premium", 30);
    keys::redeem(&mut conn, &key.code, &account.id).unwrap();

    let deleted = queries::delete_account(&mut conn, &account.id).unwrap();
    assert!(deleted);

    assert!(
        queries::get_account_by_id(&conn, &account.id)
            .unwrap()
            .is_none(),
        "account row should be gone"
    );
    assert!(
        queries::get_account_by_session_token(&conn, &token)
            .unwrap()
            .is_none(),
        "sessions should be gone"
    );
    assert!(
        queries::list_configs_by_author(&conn, &account.id)
            .unwrap()
            .is_empty(),
        "configs should be gone"
    );

    // The redeemed key survives as an unattributed record
    let keys_after = keys::list_all(&conn).unwrap();
    assert_eq!(keys_after.len(), 1);
    assert!(keys_after[0].used, "key stays marked used");
    assert!(
        keys_after[0].used_by.is_none(),
        "key attribution should be cleared"
    );
}

#[test]
fn test_delete_unknown_account_returns_false() {
    let mut conn = setup_test_db();

    let deleted = queries::delete_account(&mut conn, "no-such-id").unwrap();

    assert!(!deleted);
}
