//! Entitlement core: key redemption, the subscription ledger, device
//! binding and the free-trial abuse filter.
//!
//! All state lives in SQLite; every multi-step decision runs inside an
//! IMMEDIATE transaction or a single conditional UPDATE so that multiple
//! server processes can share one database without in-memory locks.

pub mod device;
pub mod keys;
pub mod ledger;
pub mod trial;

pub use keys::RedeemOutcome;

use serde::Serialize;

use crate::models::Account;
use crate::util::SECONDS_PER_DAY;

/// Reserved tier written by lifetime keys.
pub const TIER_LIFETIME: &str = "lifetime";
/// Reserved tier marking a key as a device-unbind voucher.
pub const TIER_HWID_RESET: &str = "hwid_reset";
/// Tier written by the free trial.
pub const TIER_TRIAL: &str = "1day";

/// Sentinel horizon written into `subscription_expires_at` for lifetime
/// grants. Lifetime status never depends on it; the tier is what counts.
const LIFETIME_YEARS: i64 = 1337;

/// What applying a key does to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Permanent subscription
    Lifetime,
    /// Clears the device binding, leaves the subscription untouched
    HwidReset,
    /// Adds the given number of days on top of any active time
    Timed(i64),
}

impl KeyKind {
    pub fn classify(tier: &str, duration_days: i64) -> Self {
        match tier {
            TIER_LIFETIME => KeyKind::Lifetime,
            TIER_HWID_RESET => KeyKind::HwidReset,
            _ => KeyKind::Timed(duration_days),
        }
    }
}

/// Current entitlement of an account, derived from the stored fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entitlement {
    /// No subscription was ever applied, or it was never timed
    None,
    /// Subscription that runs out at the given timestamp
    Until(i64),
    /// Permanent subscription
    Lifetime,
}

impl Entitlement {
    pub fn from_fields(tier: Option<&str>, expires_at: Option<i64>) -> Self {
        if tier == Some(TIER_LIFETIME) {
            return Entitlement::Lifetime;
        }
        match expires_at {
            Some(ts) => Entitlement::Until(ts),
            None => Entitlement::None,
        }
    }

    pub fn from_account(account: &Account) -> Self {
        Self::from_fields(
            account.subscription_tier.as_deref(),
            account.subscription_expires_at,
        )
    }

    pub fn is_active(&self, now: i64) -> bool {
        match self {
            Entitlement::None => false,
            Entitlement::Until(ts) => *ts > now,
            Entitlement::Lifetime => true,
        }
    }
}

/// Wire representation of an account's subscription.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatus {
    pub tier: Option<String>,
    pub expires_at: Option<i64>,
    pub active: bool,
}

/// Expiry written for lifetime grants (now + 1337 years).
pub fn lifetime_expiry(now: i64) -> i64 {
    now + LIFETIME_YEARS * 365 * SECONDS_PER_DAY
}

/// New expiry after adding `duration_days` of subscription time.
///
/// Remaining active time is preserved: the days stack on top of the
/// current expiry when it is still in the future, otherwise they count
/// from now.
pub fn stacked_expiry(current_expires_at: Option<i64>, duration_days: i64, now: i64) -> i64 {
    let base = match current_expires_at {
        Some(ts) if ts > now => ts,
        _ => now,
    };
    base + duration_days * SECONDS_PER_DAY
}
