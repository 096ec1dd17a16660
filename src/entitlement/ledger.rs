//! Subscription ledger: the single place that reads and writes the
//! `subscription_tier`/`subscription_expires_at` pair on accounts.

use rusqlite::{params, Connection, OptionalExtension};

use super::{Entitlement, SubscriptionStatus, TIER_TRIAL};
use crate::error::{AppError, Result};
use crate::models::Account;
use crate::util::SECONDS_PER_DAY;

/// Derive the wire-level subscription status of an account.
pub fn status_of(account: &Account, now: i64) -> SubscriptionStatus {
    let entitlement = Entitlement::from_account(account);
    SubscriptionStatus {
        tier: account.subscription_tier.clone(),
        expires_at: account.subscription_expires_at,
        active: entitlement.is_active(now),
    }
}

/// Read the raw entitlement fields of an account.
///
/// Errors with `AccountNotFound` when the account row is missing, which
/// callers inside a redemption transaction rely on to roll back.
pub fn read_entitlement(
    conn: &Connection,
    account_id: &str,
) -> Result<(Option<String>, Option<i64>)> {
    conn.query_row(
        "SELECT subscription_tier, subscription_expires_at FROM accounts WHERE id = ?1",
        params![account_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?
    .ok_or(AppError::AccountNotFound)
}

/// Write a new tier and expiry onto an account.
pub fn write_entitlement(
    conn: &Connection,
    account_id: &str,
    tier: &str,
    expires_at: i64,
) -> Result<()> {
    let affected = conn.execute(
        "UPDATE accounts SET subscription_tier = ?1, subscription_expires_at = ?2 WHERE id = ?3",
        params![tier, expires_at, account_id],
    )?;
    if affected == 0 {
        return Err(AppError::AccountNotFound);
    }
    Ok(())
}

/// Apply the free trial tier to an account, replacing whatever was there.
/// Returns the new expiry.
pub fn grant_trial(conn: &Connection, account_id: &str, trial_days: i64, now: i64) -> Result<i64> {
    let expires_at = now + trial_days * SECONDS_PER_DAY;
    write_entitlement(conn, account_id, TIER_TRIAL, expires_at)?;
    Ok(expires_at)
}
