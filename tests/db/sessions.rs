//! Session token lifecycle tests

#[path = "../common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_create_session_returns_plaintext_token() {
    let conn = setup_test_db();
    let account = create_test_account(&conn, "alice");

    let (session, token) = queries::create_session(&conn, &account.id).unwrap();

    assert!(token.starts_with("ts_"), "tokens carry the ts_ prefix");
    assert_ne!(
        session.token_hash, token,
        "only a hash of the token is stored"
    );
    assert_eq!(session.token_hash, hash_secret(&token));
    assert!(
        session.expires_at > now(),
        "new sessions expire in the future"
    );
}

#[test]
fn test_session_token_resolves_to_account() {
    let conn = setup_test_db();
    let account = create_test_account(&conn, "alice");
    let token = open_test_session(&conn, &account.id);

    let resolved = queries::get_account_by_session_token(&conn, &token)
        .expect("Query failed")
        .expect("Session should resolve");

    assert_eq!(resolved.id, account.id);
}

#[test]
fn test_unknown_token_resolves_to_none() {
    let conn = setup_test_db();
    create_test_account(&conn, "alice");

    let resolved = queries::get_account_by_session_token(&conn, "ts_bogus").unwrap();

    assert!(resolved.is_none());
}

#[test]
fn test_expired_session_is_rejected() {
    let conn = setup_test_db();
    let account = create_test_account(&conn, "alice");
    let token = open_test_session(&conn, &account.id);

    conn.execute(
        "UPDATE sessions SET expires_at = ?1",
        rusqlite::params![past_timestamp(1)],
    )
    .unwrap();

    let resolved = queries::get_account_by_session_token(&conn, &token).unwrap();

    assert!(resolved.is_none(), "expired sessions must not authenticate");
}

#[test]
fn test_delete_session_by_token() {
    let conn = setup_test_db();
    let account = create_test_account(&conn, "alice");
    let token = open_test_session(&conn, &account.id);

    let deleted = queries::delete_session_by_token(&conn, &token).unwrap();
    assert!(deleted);

    assert!(
        queries::get_account_by_session_token(&conn, &token)
            .unwrap()
            .is_none(),
        "deleted session should no longer resolve"
    );

    let deleted_again = queries::delete_session_by_token(&conn, &token).unwrap();
    assert!(!deleted_again, "second delete finds nothing");
}

#[test]
fn test_delete_expired_sessions_keeps_live_ones() {
    let conn = setup_test_db();
    let account = create_test_account(&conn, "alice");
    let stale = open_test_session(&conn, &account.id);
    conn.execute(
        "UPDATE sessions SET expires_at = ?1 WHERE token_hash = ?2",
        rusqlite::params![past_timestamp(1), hash_secret(&stale)],
    )
    .unwrap();
    let live = open_test_session(&conn, &account.id);

    let reaped = queries::delete_expired_sessions(&conn).unwrap();

    assert_eq!(reaped, 1, "exactly the stale session is reaped");
    assert!(queries::get_account_by_session_token(&conn, &live)
        .unwrap()
        .is_some());
}
