use serde::Serialize;

/// A login session. The bearer token itself is never stored, only its hash.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub account_id: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub created_at: i64,
    pub expires_at: i64,
}
