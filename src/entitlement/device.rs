//! Device binding guard: first-write-wins hardware id binding.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{AppError, Result};
use crate::models::Account;

/// How a device authorization succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAuthorization {
    /// The account had no binding; this device claimed it
    Bound,
    /// The presented hardware id matches the existing binding
    Recognized,
}

/// Authorize a device against an account's binding.
///
/// An unbound account is bound with a conditional
/// `SET hwid = ? WHERE hwid IS NULL` update; the affected-row count
/// decides the race, so two launchers with different hardware ids can
/// never both bind. A mismatch never mutates anything.
pub fn authorize(
    conn: &Connection,
    account: &Account,
    presented: &str,
) -> Result<DeviceAuthorization> {
    if let Some(ref bound) = account.hwid {
        if bound == presented {
            return Ok(DeviceAuthorization::Recognized);
        }
        return Err(AppError::DeviceMismatch);
    }

    let claimed = conn.execute(
        "UPDATE accounts SET hwid = ?1 WHERE id = ?2 AND hwid IS NULL",
        params![presented, account.id],
    )?;
    if claimed > 0 {
        backfill_trial_device(conn, &account.id, presented)?;
        return Ok(DeviceAuthorization::Bound);
    }

    // Lost the bind race; compare against whatever won
    let bound: Option<Option<String>> = conn
        .query_row(
            "SELECT hwid FROM accounts WHERE id = ?1",
            params![account.id],
            |row| row.get(0),
        )
        .optional()?;

    match bound.ok_or(AppError::AccountNotFound)? {
        Some(winner) if winner == presented => Ok(DeviceAuthorization::Recognized),
        Some(_) => Err(AppError::DeviceMismatch),
        // Binding vanished between the update and the read (concurrent
        // hwid reset); have the launcher retry
        None => Err(AppError::Conflict("Device binding changed, retry".into())),
    }
}

/// Clear an account's device binding. Subscription fields are untouched.
pub fn clear_binding(conn: &Connection, account_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE accounts SET hwid = NULL WHERE id = ?1",
        params![account_id],
    )?;
    Ok(affected > 0)
}

/// Fill the hardware id into the account's trial grant record if the
/// trial was claimed before any device bind. Keeps the abuse filter's
/// device history complete.
fn backfill_trial_device(conn: &Connection, account_id: &str, hwid: &str) -> Result<()> {
    conn.execute(
        "UPDATE trial_grants SET hwid = ?1 WHERE account_id = ?2 AND hwid IS NULL",
        params![hwid, account_id],
    )?;
    Ok(())
}
