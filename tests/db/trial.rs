//! Free trial tests: the one-per-account/origin/device rules.

#[path = "../common/mod.rs"]
mod common;

use common::*;
use turnstile::error::TrialDenyReason;

fn refetch(conn: &rusqlite::Connection, id: &str) -> Account {
    queries::get_account_by_id(conn, id).unwrap().unwrap()
}

#[test]
fn test_trial_grant_sets_subscription() {
    let mut conn = setup_test_db();
    let account = create_test_account(&conn, "alice");

    let expires_at = trial::check_and_reserve(&mut conn, &account, "1.1.1.1", 1).unwrap();

    let expected = future_timestamp(1);
    assert!(
        (expires_at - expected).abs() <= 5,
        "trial should run one day, got {} vs {}",
        expires_at,
        expected
    );

    let fetched = refetch(&conn, &account.id);
    assert_eq!(fetched.subscription_tier.as_deref(), Some(TIER_TRIAL));
    assert!(Entitlement::from_account(&fetched).is_active(now()));
}

#[test]
fn test_trial_records_origin_and_device() {
    let mut conn = setup_test_db();
    let account = create_test_account(&conn, "alice");
    device::authorize(&conn, &account, "machine-1").unwrap();
    let account = refetch(&conn, &account.id);

    trial::check_and_reserve(&mut conn, &account, "1.1.1.1", 1).unwrap();

    let (origin, hwid): (String, Option<String>) = conn
        .query_row(
            "SELECT origin, hwid FROM trial_grants WHERE account_id = ?1",
            rusqlite::params![account.id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(origin, "1.1.1.1");
    assert_eq!(hwid.as_deref(), Some("machine-1"));
}

#[test]
fn test_trial_without_binding_records_no_device() {
    let mut conn = setup_test_db();
    let account = create_test_account(&conn, "alice");

    trial::check_and_reserve(&mut conn, &account, "1.1.1.1", 1).unwrap();

    let hwid: Option<String> = conn
        .query_row(
            "SELECT hwid FROM trial_grants WHERE account_id = ?1",
            rusqlite::params![account.id],
            |row| row.get(0),
        )
        .unwrap();
    assert!(hwid.is_none());
}

// ============ Denial rules ============

#[test]
fn test_second_trial_for_account_is_denied() {
    let mut conn = setup_test_db();
    let account = create_test_account(&conn, "alice");
    trial::check_and_reserve(&mut conn, &account, "1.1.1.1", 1).unwrap();

    let err = trial::check_and_reserve(&mut conn, &account, "2.2.2.2", 1).unwrap_err();

    assert!(matches!(
        err,
        AppError::TrialDenied(TrialDenyReason::AccountAlreadyGranted)
    ));
}

#[test]
fn test_trial_from_used_origin_is_denied() {
    let mut conn = setup_test_db();
    let alice = create_test_account(&conn, "alice");
    let bob = create_test_account(&conn, "bob");
    trial::check_and_reserve(&mut conn, &alice, "1.1.1.1", 1).unwrap();

    let err = trial::check_and_reserve(&mut conn, &bob, "1.1.1.1", 1).unwrap_err();

    assert!(matches!(
        err,
        AppError::TrialDenied(TrialDenyReason::OriginAlreadyGranted)
    ));

    let fetched = refetch(&conn, &bob.id);
    assert!(
        fetched.subscription_tier.is_none(),
        "denied trial must not grant anything"
    );
}

#[test]
fn test_origin_check_runs_before_account_check() {
    let mut conn = setup_test_db();
    let account = create_test_account(&conn, "alice");
    trial::check_and_reserve(&mut conn, &account, "1.1.1.1", 1).unwrap();

    // Both rules match here; the origin one must win
    let err = trial::check_and_reserve(&mut conn, &account, "1.1.1.1", 1).unwrap_err();

    assert!(matches!(
        err,
        AppError::TrialDenied(TrialDenyReason::OriginAlreadyGranted)
    ));
}

#[test]
fn test_trial_on_used_device_is_denied() {
    let mut conn = setup_test_db();
    let alice = create_test_account(&conn, "alice");
    device::authorize(&conn, &alice, "machine-1").unwrap();
    let alice = refetch(&conn, &alice.id);
    trial::check_and_reserve(&mut conn, &alice, "1.1.1.1", 1).unwrap();

    // Bob uses the same physical machine but a fresh account and address
    let bob = create_test_account(&conn, "bob");
    device::authorize(&conn, &bob, "machine-1").unwrap();
    let bob = refetch(&conn, &bob.id);

    let err = trial::check_and_reserve(&mut conn, &bob, "2.2.2.2", 1).unwrap_err();

    assert!(matches!(
        err,
        AppError::TrialDenied(TrialDenyReason::DeviceAlreadyGranted)
    ));
}

#[test]
fn test_unbound_account_skips_device_check() {
    let mut conn = setup_test_db();
    let alice = create_test_account(&conn, "alice");
    device::authorize(&conn, &alice, "machine-1").unwrap();
    let alice = refetch(&conn, &alice.id);
    trial::check_and_reserve(&mut conn, &alice, "1.1.1.1", 1).unwrap();

    // Bob has no binding, so only account and origin rules apply
    let bob = create_test_account(&conn, "bob");

    trial::check_and_reserve(&mut conn, &bob, "2.2.2.2", 1)
        .expect("unbound account from a fresh origin should get a trial");
}

// ============ Foreign device ban ============

#[test]
fn test_assert_device_unclaimed_blocks_foreign_trial_machine() {
    let mut conn = setup_test_db();
    let alice = create_test_account(&conn, "alice");
    device::authorize(&conn, &alice, "machine-1").unwrap();
    let alice = refetch(&conn, &alice.id);
    trial::check_and_reserve(&mut conn, &alice, "1.1.1.1", 1).unwrap();

    let bob = create_test_account(&conn, "bob");
    let err = trial::assert_device_unclaimed(&conn, &bob.id, "machine-1").unwrap_err();

    assert!(matches!(
        err,
        AppError::TrialDenied(TrialDenyReason::ForeignDevice)
    ));
}

#[test]
fn test_assert_device_unclaimed_allows_own_trial_machine() {
    let mut conn = setup_test_db();
    let alice = create_test_account(&conn, "alice");
    device::authorize(&conn, &alice, "machine-1").unwrap();
    let alice = refetch(&conn, &alice.id);
    trial::check_and_reserve(&mut conn, &alice, "1.1.1.1", 1).unwrap();

    trial::assert_device_unclaimed(&conn, &alice.id, "machine-1")
        .expect("the trial taker keeps using their own machine");
}

#[test]
fn test_assert_device_unclaimed_allows_fresh_machine() {
    let conn = setup_test_db();
    let bob = create_test_account(&conn, "bob");

    trial::assert_device_unclaimed(&conn, &bob.id, "machine-9")
        .expect("a machine with no trial history is fine");
}
