use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Maximum accepted config content size in bytes.
pub const MAX_CONFIG_BYTES: usize = 64 * 1024;

/// A user-uploaded game config, content included.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigFile {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    pub private: bool,
    pub downloads: i64,
    pub created_at: i64,
}

/// Config metadata for listings; content is fetched only on download.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub author_id: String,
    pub author_name: String,
    pub private: bool,
    pub downloads: i64,
    pub created_at: i64,
}

/// Upload payload.
#[derive(Debug, Deserialize)]
pub struct CreateConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub content: String,
    #[serde(default)]
    pub private: bool,
}

impl CreateConfig {
    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim();
        if name.is_empty() || name.len() > 100 {
            return Err(AppError::BadRequest(
                "Config name must be 1-100 characters".into(),
            ));
        }
        if self.content.is_empty() {
            return Err(AppError::BadRequest("Config content is empty".into()));
        }
        if self.content.len() > MAX_CONFIG_BYTES {
            return Err(AppError::BadRequest(format!(
                "Config content exceeds {} KiB",
                MAX_CONFIG_BYTES / 1024
            )));
        }
        if let Some(ref description) = self.description {
            if description.len() > 500 {
                return Err(AppError::BadRequest(
                    "Description must be at most 500 characters".into(),
                ));
            }
        }
        Ok(())
    }
}
