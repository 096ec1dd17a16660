//! Redemption key issuing and claiming tests.
//! The claim must be atomic: a key is consumed exactly once, and only
//! together with its effect.

#[path = "../common/mod.rs"]
mod common;

use common::*;

// ============ Issuing ============

#[test]
fn test_generate_key_code_format() {
    let code = keys::generate_key_code();

    assert!(code.starts_with("TS-"), "codes carry the TS- prefix");
    assert_eq!(code.len(), 20, "TS- plus two 8-char groups");

    let parts: Vec<&str> = code.split('-').collect();
    assert_eq!(parts.len(), 3);
    for part in &parts[1..] {
        assert_eq!(part.len(), 8);
        for c in part.chars() {
            assert!(
                "ABCDEFGHJKLMNPQRSTUVWXYZ23456789".contains(c),
                "unexpected character {:?} in code {}",
                c,
                code
            );
        }
    }

    assert_ne!(code, keys::generate_key_code(), "codes should not repeat");
}

#[test]
fn test_issue_timed_key() {
    let conn = setup_test_db();

    let key = create_test_key(&conn, "premium", 30);

    assert_eq!(key.tier, "premium");
    assert_eq!(key.duration_days, 30);
    assert!(!key.used);
    assert!(key.used_by.is_none());
}

#[test]
fn test_issue_reserved_tier_ignores_duration() {
    let conn = setup_test_db();

    let key = create_test_key(&conn, TIER_LIFETIME, 99);

    assert_eq!(key.duration_days, 0, "reserved tiers have no duration");
}

#[test]
fn test_issue_rejects_invalid_tier() {
    let conn = setup_test_db();

    let err = keys::issue(
        &conn,
        &CreateKey {
            tier: "Not A Tier!".to_string(),
            duration_days: 30,
        },
    )
    .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
}

#[test]
fn test_issue_rejects_timed_tier_without_duration() {
    let conn = setup_test_db();

    let err = keys::issue(
        &conn,
        &CreateKey {
            tier: "premium".to_string(),
            duration_days: 0,
        },
    )
    .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
}

#[test]
fn test_list_all_keys() {
    let conn = setup_test_db();
    create_test_key(&conn, "premium", 30);
    create_test_key(&conn, TIER_LIFETIME, 0);

    let all = keys::list_all(&conn).unwrap();

    assert_eq!(all.len(), 2);
}

// ============ Claiming ============

#[test]
fn test_redeem_timed_key_sets_subscription() {
    let mut conn = setup_test_db();
    let account = create_test_account(&conn, "alice");
    let key = create_test_key(&conn, "premium", 30);

    let outcome = keys::redeem(&mut conn, &key.code, &account.id).unwrap();

    match outcome {
        RedeemOutcome::Extended { tier, expires_at } => {
            assert_eq!(tier, "premium");
            let expected = future_timestamp(30);
            assert!(
                (expires_at - expected).abs() <= 5,
                "expiry should be 30 days out, got {} vs {}",
                expires_at,
                expected
            );
        }
        other => panic!("expected Extended outcome, got {:?}", other),
    }

    let fetched = queries::get_account_by_id(&conn, &account.id)
        .unwrap()
        .unwrap();
    assert_eq!(fetched.subscription_tier.as_deref(), Some("premium"));
    assert!(Entitlement::from_account(&fetched).is_active(now()));
}

#[test]
fn test_redeem_stacks_on_remaining_time() {
    let mut conn = setup_test_db();
    let account = create_test_account(&conn, "alice");
    grant_subscription(&conn, &account.id, "premium", future_timestamp(10));
    let key = create_test_key(&conn, "premium", 30);

    let outcome = keys::redeem(&mut conn, &key.code, &account.id).unwrap();

    match outcome {
        RedeemOutcome::Extended { expires_at, .. } => {
            let expected = future_timestamp(40);
            assert!(
                (expires_at - expected).abs() <= 5,
                "10 remaining days plus 30 new ones, got {} vs {}",
                expires_at,
                expected
            );
        }
        other => panic!("expected Extended outcome, got {:?}", other),
    }
}

#[test]
fn test_redeem_after_lapse_counts_from_now() {
    let mut conn = setup_test_db();
    let account = create_test_account(&conn, "alice");
    grant_subscription(&conn, &account.id, "premium", past_timestamp(100));
    let key = create_test_key(&conn, "premium", 30);

    let outcome = keys::redeem(&mut conn, &key.code, &account.id).unwrap();

    match outcome {
        RedeemOutcome::Extended { expires_at, .. } => {
            let expected = future_timestamp(30);
            assert!(
                (expires_at - expected).abs() <= 5,
                "lapsed time must not eat into the new grant, got {} vs {}",
                expires_at,
                expected
            );
        }
        other => panic!("expected Extended outcome, got {:?}", other),
    }
}

#[test]
fn test_redeem_same_key_twice_fails() {
    let mut conn = setup_test_db();
    let alice = create_test_account(&conn, "alice");
    let bob = create_test_account(&conn, "bob");
    let key = create_test_key(&conn, "premium", 30);

    keys::redeem(&mut conn, &key.code, &alice.id).unwrap();
    let err = keys::redeem(&mut conn, &key.code, &bob.id).unwrap_err();

    assert!(matches!(err, AppError::KeyAlreadyUsed));

    let bob_after = queries::get_account_by_id(&conn, &bob.id).unwrap().unwrap();
    assert!(
        bob_after.subscription_tier.is_none(),
        "losing account must gain nothing"
    );
}

#[test]
fn test_redeem_unknown_code_fails() {
    let mut conn = setup_test_db();
    let account = create_test_account(&conn, "alice");

    let err = keys::redeem(&mut conn, "TS-NOPENOPE-NOPENOPE", &account.id).unwrap_err();

    assert!(matches!(err, AppError::KeyNotFound));
}

#[test]
fn test_redeem_for_missing_account_rolls_back_claim() {
    let mut conn = setup_test_db();
    let key = create_test_key(&conn, "premium", 30);

    let err = keys::redeem(&mut conn, &key.code, "no-such-account").unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound));

    // The failed attempt must not consume the key
    let all = keys::list_all(&conn).unwrap();
    assert!(!all[0].used, "key should still be unclaimed");

    let account = create_test_account(&conn, "alice");
    keys::redeem(&mut conn, &key.code, &account.id)
        .expect("key should still be redeemable after the failed attempt");
}

#[test]
fn test_redeem_records_claimer() {
    let mut conn = setup_test_db();
    let account = create_test_account(&conn, "alice");
    let key = create_test_key(&conn, "premium", 30);

    keys::redeem(&mut conn, &key.code, &account.id).unwrap();

    let all = keys::list_all(&conn).unwrap();
    assert!(all[0].used);
    assert_eq!(all[0].used_by.as_deref(), Some(account.id.as_str()));
    assert!(all[0].used_at.is_some());
}

// ============ Special tiers ============

#[test]
fn test_redeem_lifetime_key() {
    let mut conn = setup_test_db();
    let account = create_test_account(&conn, "alice");
    let key = create_test_key(&conn, TIER_LIFETIME, 0);

    let outcome = keys::redeem(&mut conn, &key.code, &account.id).unwrap();

    assert!(matches!(outcome, RedeemOutcome::Lifetime { .. }));

    let fetched = queries::get_account_by_id(&conn, &account.id)
        .unwrap()
        .unwrap();
    assert_eq!(fetched.subscription_tier.as_deref(), Some(TIER_LIFETIME));
    assert!(
        Entitlement::from_account(&fetched).is_active(future_timestamp(365 * 100)),
        "lifetime must outlive any realistic horizon"
    );
}

#[test]
fn test_redeem_hwid_reset_key_clears_binding_only() {
    let mut conn = setup_test_db();
    let account = create_test_account(&conn, "alice");
    device::authorize(&conn, &account, "machine-1").unwrap();
    grant_subscription(&conn, &account.id, "premium", future_timestamp(10));
    let key = create_test_key(&conn, TIER_HWID_RESET, 0);

    let outcome = keys::redeem(&mut conn, &key.code, &account.id).unwrap();

    assert!(matches!(outcome, RedeemOutcome::HwidReset));

    let fetched = queries::get_account_by_id(&conn, &account.id)
        .unwrap()
        .unwrap();
    assert!(fetched.hwid.is_none(), "binding should be cleared");
    assert_eq!(
        fetched.subscription_tier.as_deref(),
        Some("premium"),
        "subscription tier untouched"
    );
    let expected = future_timestamp(10);
    let expires_at = fetched.subscription_expires_at.unwrap();
    assert!(
        (expires_at - expected).abs() <= 5,
        "subscription expiry untouched"
    );
}
