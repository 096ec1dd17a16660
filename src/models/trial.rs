use serde::Serialize;

/// Record of a consumed free trial, kept for abuse dedup.
///
/// `hwid` is NULL when the trial was claimed before any device bind and
/// is backfilled by the device guard on the first bind.
#[derive(Debug, Clone, Serialize)]
pub struct TrialGrant {
    pub id: String,
    pub account_id: String,
    pub origin: String,
    pub hwid: Option<String>,
    pub created_at: i64,
}
