use serde::{Deserialize, Serialize};

use crate::entitlement::{TIER_HWID_RESET, TIER_LIFETIME};
use crate::error::{AppError, Result};

/// A single-use redemption key.
///
/// `used` is a one-way flag: it is only ever flipped 0 -> 1 by the
/// conditional claim update, never cleared.
#[derive(Debug, Clone, Serialize)]
pub struct RedemptionKey {
    pub id: String,
    pub code: String,
    pub tier: String,
    pub duration_days: i64,
    pub used: bool,
    pub used_by: Option<String>,
    pub used_at: Option<i64>,
    pub created_at: i64,
}

/// Admin payload for issuing a new key.
#[derive(Debug, Deserialize)]
pub struct CreateKey {
    pub tier: String,
    #[serde(default)]
    pub duration_days: i64,
}

impl CreateKey {
    pub fn validate(&self) -> Result<()> {
        if self.tier.is_empty() || self.tier.len() > 32 {
            return Err(AppError::BadRequest("Tier must be 1-32 characters".into()));
        }
        let valid = self
            .tier
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(AppError::BadRequest(
                "Tier may only contain lowercase letters, digits and '_'".into(),
            ));
        }
        // Reserved tiers carry no duration; everything else needs one
        if self.tier != TIER_LIFETIME && self.tier != TIER_HWID_RESET {
            if self.duration_days < 1 || self.duration_days > 3650 {
                return Err(AppError::BadRequest(
                    "Duration must be 1-3650 days for timed tiers".into(),
                ));
            }
        }
        Ok(())
    }
}
