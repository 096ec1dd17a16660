use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A showcase entry published by a media account. Metadata only; the
/// actual content is sold through the linked external store.
#[derive(Debug, Clone, Serialize)]
pub struct MediaConfig {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub author_id: String,
    pub author_name: String,
    /// Price in whole currency units; 0 until an admin sets it
    pub price: i64,
    pub store_url: Option<String>,
    pub promo_code: Option<String>,
    pub downloads: i64,
    pub created_at: i64,
}

/// Payload for a media account publishing a showcase entry.
#[derive(Debug, Deserialize)]
pub struct CreateMediaConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub promo_code: Option<String>,
}

impl CreateMediaConfig {
    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim();
        if name.is_empty() || name.len() > 100 {
            return Err(AppError::BadRequest(
                "Name must be 1-100 characters".into(),
            ));
        }
        if let Some(ref description) = self.description {
            if description.len() > 500 {
                return Err(AppError::BadRequest(
                    "Description must be at most 500 characters".into(),
                ));
            }
        }
        if let Some(ref promo) = self.promo_code {
            if promo.len() > 50 {
                return Err(AppError::BadRequest(
                    "Promo code must be at most 50 characters".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Admin payload for pricing and linking a showcase entry.
/// Fields left out of the request are not touched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMediaConfig {
    pub price: Option<i64>,
    pub store_url: Option<String>,
    pub promo_code: Option<String>,
}

impl UpdateMediaConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(price) = self.price {
            if price < 0 {
                return Err(AppError::BadRequest("Price cannot be negative".into()));
            }
        }
        if let Some(ref url) = self.store_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::BadRequest(
                    "Store URL must start with http:// or https://".into(),
                ));
            }
        }
        Ok(())
    }
}
