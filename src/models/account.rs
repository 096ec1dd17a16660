use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Access level of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular player account
    User,
    /// Content creator allowed to publish showcase entries
    Media,
    /// Operations staff
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Media => "media",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "media" => Ok(Role::Media),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// A registered account.
///
/// `hwid` is NULL until the launcher performs the first device bind.
/// `subscription_tier`/`subscription_expires_at` are NULL until a key or
/// trial is applied; active status is always derived from them, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub hwid: Option<String>,
    pub role: Role,
    pub subscription_tier: Option<String>,
    pub subscription_expires_at: Option<i64>,
    pub created_at: i64,
}

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct CreateAccount {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl CreateAccount {
    pub fn validate(&self) -> Result<()> {
        validate_username(&self.username)?;
        validate_password(&self.password)?;
        if let Some(ref email) = self.email {
            if !validate_email_format(email) {
                return Err(AppError::BadRequest("Invalid email format".into()));
            }
        }
        Ok(())
    }
}

/// Login payload, also used by the launcher subscription check.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(AppError::BadRequest(
                "Username and password are required".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<()> {
        validate_password(&self.new_password)
    }
}

pub fn validate_username(username: &str) -> Result<()> {
    if username.len() < 3 || username.len() > 32 {
        return Err(AppError::BadRequest(
            "Username must be 3-32 characters".into(),
        ));
    }
    let valid = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !valid {
        return Err(AppError::BadRequest(
            "Username may only contain letters, digits, '.', '_' and '-'".into(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 6 || password.len() > 128 {
        return Err(AppError::BadRequest(
            "Password must be 6-128 characters".into(),
        ));
    }
    if !password.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
        return Err(AppError::BadRequest(
            "Password contains unsupported characters".into(),
        ));
    }
    Ok(())
}

/// Basic email format validation.
///
/// Checks for reasonable email structure without being overly strict.
fn validate_email_format(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }

    let (local, domain) = (parts[0], parts[1]);

    // Local part checks
    if local.is_empty() || local.contains(' ') {
        return false;
    }

    // Domain checks: must contain a dot, no leading/trailing dots
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }

    true
}
