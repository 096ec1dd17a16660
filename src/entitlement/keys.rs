//! Key registry: issuing redemption keys and the atomic claim.

use rusqlite::{params, Connection, TransactionBehavior};
use serde::Serialize;

use super::{device, ledger, lifetime_expiry, stacked_expiry, KeyKind, TIER_LIFETIME};
use crate::db::from_row::{query_all, query_one, REDEMPTION_KEY_COLS};
use crate::error::{AppError, Result};
use crate::models::{CreateKey, RedemptionKey};
use crate::util::{gen_id, now};

/// Brand prefix on every key code.
pub const KEY_PREFIX: &str = "TS";

/// Generate a key code: TS-XXXXXXXX-XXXXXXXX (80 bits entropy).
///
/// Keys live until redeemed, so entropy is sized for offline guessing,
/// unlike short-lived one-time codes. The charset drops 0/O and 1/I.
pub fn generate_key_code() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let chars: Vec<char> = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789".chars().collect();

    let mut part = || -> String {
        (0..8)
            .map(|_| chars[rng.gen_range(0..chars.len())])
            .collect()
    };

    format!("{}-{}-{}", KEY_PREFIX, part(), part())
}

/// Issue a new redemption key.
///
/// Reserved tiers (`lifetime`, `hwid_reset`) are stored with a zero
/// duration regardless of the request.
pub fn issue(conn: &Connection, input: &CreateKey) -> Result<RedemptionKey> {
    input.validate()?;

    let duration_days = match KeyKind::classify(&input.tier, input.duration_days) {
        KeyKind::Timed(days) => days,
        _ => 0,
    };

    let key = RedemptionKey {
        id: gen_id(),
        code: generate_key_code(),
        tier: input.tier.clone(),
        duration_days,
        used: false,
        used_by: None,
        used_at: None,
        created_at: now(),
    };

    conn.execute(
        "INSERT INTO redemption_keys (id, code, tier, duration_days, used, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![key.id, key.code, key.tier, key.duration_days, key.created_at],
    )?;

    Ok(key)
}

/// All issued keys, newest first.
pub fn list_all(conn: &Connection) -> Result<Vec<RedemptionKey>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM redemption_keys ORDER BY created_at DESC",
            REDEMPTION_KEY_COLS
        ),
        &[],
    )
}

/// Result of a successful redemption.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RedeemOutcome {
    /// Device binding cleared; subscription untouched
    HwidReset,
    /// Timed tier applied, stacking on any remaining time
    Extended { tier: String, expires_at: i64 },
    /// Permanent subscription applied
    Lifetime { expires_at: i64 },
}

/// Redeem a key for an account.
///
/// The whole operation is one IMMEDIATE transaction: the conditional
/// `used = 0 -> 1` update claims the key, and any later failure rolls
/// the claim back, so a key is consumed if and only if its effect was
/// applied. Concurrent redemptions of the same code see exactly one
/// winner; the rest get `KeyAlreadyUsed`.
pub fn redeem(conn: &mut Connection, code: &str, account_id: &str) -> Result<RedeemOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let key: RedemptionKey = query_one(
        &tx,
        &format!(
            "SELECT {} FROM redemption_keys WHERE code = ?1",
            REDEMPTION_KEY_COLS
        ),
        &[&code],
    )?
    .ok_or(AppError::KeyNotFound)?;

    let ts = now();
    let claimed = tx.execute(
        "UPDATE redemption_keys SET used = 1, used_by = ?2, used_at = ?3
         WHERE id = ?1 AND used = 0",
        params![key.id, account_id, ts],
    )?;
    if claimed == 0 {
        return Err(AppError::KeyAlreadyUsed);
    }

    // Errors from here roll back the claim together with the effect
    let (_, current_expiry) = ledger::read_entitlement(&tx, account_id)?;

    let outcome = match KeyKind::classify(&key.tier, key.duration_days) {
        KeyKind::HwidReset => {
            device::clear_binding(&tx, account_id)?;
            RedeemOutcome::HwidReset
        }
        KeyKind::Lifetime => {
            let expires_at = lifetime_expiry(ts);
            ledger::write_entitlement(&tx, account_id, TIER_LIFETIME, expires_at)?;
            RedeemOutcome::Lifetime { expires_at }
        }
        KeyKind::Timed(days) => {
            let expires_at = stacked_expiry(current_expiry, days, ts);
            ledger::write_entitlement(&tx, account_id, &key.tier, expires_at)?;
            RedeemOutcome::Extended {
                tier: key.tier.clone(),
                expires_at,
            }
        }
    };

    tx.commit()?;
    Ok(outcome)
}
