//! Free-trial abuse filter.
//!
//! A trial is deduplicated three ways: by network origin, by account and
//! by hardware id. The checks and the grant run in one IMMEDIATE
//! transaction, with the UNIQUE(account_id) constraint as the backstop,
//! so concurrent requests cannot double-grant.

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::ledger;
use crate::error::{AppError, Result, TrialDenyReason};
use crate::models::Account;
use crate::util::{gen_id, now};

/// Check every dedup rule and grant the trial if all pass.
///
/// Check order matches the deny messages users see: origin first, then
/// account, then device. The device check uses the account's bound
/// hardware id; a trial claimed before any bind passes with a NULL
/// device and is backfilled by the device guard later.
///
/// Returns the trial expiry timestamp.
pub fn check_and_reserve(
    conn: &mut Connection,
    account: &Account,
    origin: &str,
    trial_days: i64,
) -> Result<i64> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let by_origin: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM trial_grants WHERE origin = ?1",
            params![origin],
            |row| row.get(0),
        )
        .optional()?;
    if by_origin.is_some() {
        return Err(AppError::TrialDenied(TrialDenyReason::OriginAlreadyGranted));
    }

    let by_account: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM trial_grants WHERE account_id = ?1",
            params![account.id],
            |row| row.get(0),
        )
        .optional()?;
    if by_account.is_some() {
        return Err(AppError::TrialDenied(TrialDenyReason::AccountAlreadyGranted));
    }

    if let Some(ref hwid) = account.hwid {
        let by_device: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM trial_grants WHERE hwid = ?1",
                params![hwid],
                |row| row.get(0),
            )
            .optional()?;
        if by_device.is_some() {
            return Err(AppError::TrialDenied(TrialDenyReason::DeviceAlreadyGranted));
        }
    }

    let ts = now();
    let expires_at = ledger::grant_trial(&tx, &account.id, trial_days, ts)?;
    tx.execute(
        "INSERT INTO trial_grants (id, account_id, origin, hwid, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![gen_id(), account.id, origin, account.hwid, ts],
    )?;

    tx.commit()?;
    Ok(expires_at)
}

/// Reject a device that consumed a trial under a different account.
///
/// The launcher runs this before device binding, so an account can never
/// be bound to hardware that already burned someone else's trial.
pub fn assert_device_unclaimed(conn: &Connection, account_id: &str, hwid: &str) -> Result<()> {
    let claimed: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM trial_grants WHERE hwid = ?1 AND account_id != ?2",
            params![hwid, account_id],
            |row| row.get(0),
        )
        .optional()?;
    if claimed.is_some() {
        return Err(AppError::TrialDenied(TrialDenyReason::ForeignDevice));
    }
    Ok(())
}
