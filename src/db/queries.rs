use rusqlite::{params, types::Value, Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use crate::crypto::hash_secret;
use crate::error::{AppError, Result};
use crate::models::*;
use crate::util::{gen_id, now, SECONDS_PER_DAY};

use super::from_row::{
    query_all, query_one, ACCOUNT_COLS, CONFIG_COLS, CONFIG_SUMMARY_COLS, MEDIA_CONFIG_COLS,
};

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query for efficiency.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
        }
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    fn execute(self, conn: &Connection) -> Result<bool> {
        if self.fields.is_empty() {
            return Ok(false);
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

// ============ Accounts ============

/// Create an account. The password must already be hashed.
pub fn create_account(
    conn: &Connection,
    input: &CreateAccount,
    password_hash: &str,
) -> Result<Account> {
    let account = Account {
        id: gen_id(),
        username: input.username.trim().to_string(),
        password_hash: password_hash.to_string(),
        email: input.email.as_ref().map(|e| e.trim().to_lowercase()),
        hwid: None,
        role: Role::User,
        subscription_tier: None,
        subscription_expires_at: None,
        created_at: now(),
    };

    let inserted = conn.execute(
        "INSERT INTO accounts (id, username, password_hash, email, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            account.id,
            account.username,
            account.password_hash,
            account.email,
            account.role.as_str(),
            account.created_at
        ],
    );

    match inserted {
        Ok(_) => Ok(account),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(AppError::Conflict("Username is already taken".into()))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn get_account_by_id(conn: &Connection, id: &str) -> Result<Option<Account>> {
    query_one(
        conn,
        &format!("SELECT {} FROM accounts WHERE id = ?1", ACCOUNT_COLS),
        &[&id],
    )
}

pub fn get_account_by_username(conn: &Connection, username: &str) -> Result<Option<Account>> {
    query_one(
        conn,
        &format!("SELECT {} FROM accounts WHERE username = ?1", ACCOUNT_COLS),
        &[&username],
    )
}

pub fn list_accounts(conn: &Connection) -> Result<Vec<Account>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM accounts ORDER BY created_at DESC",
            ACCOUNT_COLS
        ),
        &[],
    )
}

pub fn list_accounts_by_role(conn: &Connection, role: Role) -> Result<Vec<Account>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM accounts WHERE role = ?1 ORDER BY created_at DESC",
            ACCOUNT_COLS
        ),
        &[&role.as_str()],
    )
}

pub fn count_admins(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM accounts WHERE role = 'admin'",
        [],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

pub fn set_account_role(conn: &Connection, account_id: &str, role: Role) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE accounts SET role = ?1 WHERE id = ?2",
        params![role.as_str(), account_id],
    )?;
    Ok(affected > 0)
}

pub fn update_account_password(
    conn: &Connection,
    account_id: &str,
    password_hash: &str,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE accounts SET password_hash = ?1 WHERE id = ?2",
        params![password_hash, account_id],
    )?;
    Ok(affected > 0)
}

/// Hard-delete an account and everything hanging off it.
///
/// Dependent rows are removed explicitly inside one transaction instead
/// of relying on FK cascades, so behavior is identical whether or not
/// the connection has foreign keys enabled. Keys the account redeemed
/// stay consumed, only the back-reference is cleared.
pub fn delete_account(conn: &mut Connection, account_id: &str) -> Result<bool> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let exists: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM accounts WHERE id = ?1",
            params![account_id],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Ok(false);
    }

    tx.execute(
        "DELETE FROM trial_grants WHERE account_id = ?1",
        params![account_id],
    )?;
    tx.execute(
        "DELETE FROM sessions WHERE account_id = ?1",
        params![account_id],
    )?;
    tx.execute(
        "DELETE FROM configs WHERE author_id = ?1",
        params![account_id],
    )?;
    tx.execute(
        "DELETE FROM media_configs WHERE author_id = ?1",
        params![account_id],
    )?;
    tx.execute(
        "UPDATE redemption_keys SET used_by = NULL WHERE used_by = ?1",
        params![account_id],
    )?;
    tx.execute("DELETE FROM accounts WHERE id = ?1", params![account_id])?;

    tx.commit()?;
    Ok(true)
}

// ============ Sessions ============

/// Session lifetime: 30 days.
pub const SESSION_TTL_SECS: i64 = 30 * SECONDS_PER_DAY;

/// Generate an opaque session token: ts_{uuid_simple} (122 bits entropy).
fn generate_session_token() -> String {
    format!("ts_{}", Uuid::new_v4().as_simple())
}

/// Open a session for an account.
/// Returns the session row and the plaintext token; only the hash is stored.
pub fn create_session(conn: &Connection, account_id: &str) -> Result<(Session, String)> {
    let token = generate_session_token();
    let ts = now();
    let session = Session {
        id: gen_id(),
        account_id: account_id.to_string(),
        token_hash: hash_secret(&token),
        created_at: ts,
        expires_at: ts + SESSION_TTL_SECS,
    };

    conn.execute(
        "INSERT INTO sessions (id, account_id, token_hash, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            session.id,
            session.account_id,
            session.token_hash,
            session.created_at,
            session.expires_at
        ],
    )?;

    Ok((session, token))
}

/// Resolve a bearer token to its account. Expired sessions resolve to None.
pub fn get_account_by_session_token(conn: &Connection, token: &str) -> Result<Option<Account>> {
    let token_hash = hash_secret(token);
    query_one(
        conn,
        &format!(
            "SELECT {} FROM accounts WHERE id = (
                SELECT account_id FROM sessions WHERE token_hash = ?1 AND expires_at > ?2
             )",
            ACCOUNT_COLS
        ),
        &[&token_hash, &now()],
    )
}

pub fn delete_session_by_token(conn: &Connection, token: &str) -> Result<bool> {
    let token_hash = hash_secret(token);
    let affected = conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        params![token_hash],
    )?;
    Ok(affected > 0)
}

/// Remove expired sessions. Called periodically by the reaper task.
pub fn delete_expired_sessions(conn: &Connection) -> Result<usize> {
    let affected = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![now()],
    )?;
    Ok(affected)
}

// ============ Configs ============

pub fn create_config(
    conn: &Connection,
    author: &Account,
    input: &CreateConfig,
) -> Result<ConfigSummary> {
    let config = ConfigSummary {
        id: gen_id(),
        name: input.name.trim().to_string(),
        description: input.description.clone(),
        author_id: author.id.clone(),
        author_name: author.username.clone(),
        private: input.private,
        downloads: 0,
        created_at: now(),
    };

    conn.execute(
        "INSERT INTO configs (id, name, description, content, author_id, author_name, private, downloads, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
        params![
            config.id,
            config.name,
            config.description,
            input.content,
            config.author_id,
            config.author_name,
            config.private as i32,
            config.created_at
        ],
    )?;

    Ok(config)
}

pub fn get_config_by_id(conn: &Connection, id: &str) -> Result<Option<ConfigFile>> {
    query_one(
        conn,
        &format!("SELECT {} FROM configs WHERE id = ?1", CONFIG_COLS),
        &[&id],
    )
}

/// All configs by one author, private ones included, newest first.
pub fn list_configs_by_author(conn: &Connection, author_id: &str) -> Result<Vec<ConfigSummary>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM configs WHERE author_id = ?1 ORDER BY created_at DESC",
            CONFIG_SUMMARY_COLS
        ),
        &[&author_id],
    )
}

/// Public marketplace search.
///
/// With a query: case-insensitive substring match on name or author,
/// most-downloaded first. Without: newest uploads first. Capped at 50.
pub fn search_public_configs(conn: &Connection, q: Option<&str>) -> Result<Vec<ConfigSummary>> {
    match q {
        Some(q) if !q.trim().is_empty() => {
            let pattern = format!("%{}%", q.trim());
            query_all(
                conn,
                &format!(
                    "SELECT {} FROM configs
                     WHERE private = 0 AND (name LIKE ?1 OR author_name LIKE ?1)
                     ORDER BY downloads DESC LIMIT 50",
                    CONFIG_SUMMARY_COLS
                ),
                &[&pattern],
            )
        }
        _ => query_all(
            conn,
            &format!(
                "SELECT {} FROM configs WHERE private = 0
                 ORDER BY created_at DESC LIMIT 50",
                CONFIG_SUMMARY_COLS
            ),
            &[],
        ),
    }
}

pub fn increment_config_downloads(conn: &Connection, id: &str) -> Result<()> {
    conn.execute(
        "UPDATE configs SET downloads = downloads + 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

pub fn delete_config(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute("DELETE FROM configs WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

// ============ Media configs ============

pub fn create_media_config(
    conn: &Connection,
    author: &Account,
    input: &CreateMediaConfig,
) -> Result<MediaConfig> {
    let media = MediaConfig {
        id: gen_id(),
        name: input.name.trim().to_string(),
        description: input.description.clone(),
        author_id: author.id.clone(),
        author_name: author.username.clone(),
        price: 0,
        store_url: None,
        promo_code: input.promo_code.clone(),
        downloads: 0,
        created_at: now(),
    };

    conn.execute(
        "INSERT INTO media_configs (id, name, description, author_id, author_name, price, store_url, promo_code, downloads, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, NULL, ?6, 0, ?7)",
        params![
            media.id,
            media.name,
            media.description,
            media.author_id,
            media.author_name,
            media.promo_code,
            media.created_at
        ],
    )?;

    Ok(media)
}

/// Showcase listing, newest first.
pub fn list_media_configs(conn: &Connection) -> Result<Vec<MediaConfig>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM media_configs ORDER BY created_at DESC",
            MEDIA_CONFIG_COLS
        ),
        &[],
    )
}

pub fn get_media_config_by_id(conn: &Connection, id: &str) -> Result<Option<MediaConfig>> {
    query_one(
        conn,
        &format!("SELECT {} FROM media_configs WHERE id = ?1", MEDIA_CONFIG_COLS),
        &[&id],
    )
}

/// Apply admin pricing changes. Absent fields stay as they are.
pub fn update_media_config(
    conn: &Connection,
    id: &str,
    changes: &UpdateMediaConfig,
) -> Result<bool> {
    UpdateBuilder::new("media_configs", id)
        .set_opt("price", changes.price)
        .set_opt("store_url", changes.store_url.clone())
        .set_opt("promo_code", changes.promo_code.clone())
        .execute(conn)
}

pub fn delete_media_config(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute("DELETE FROM media_configs WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

// ============ Maintenance ============

/// Wipe every table. Only reachable through the passphrase-gated admin
/// reset.
pub fn reset_all_data(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN IMMEDIATE;
         DELETE FROM trial_grants;
         DELETE FROM sessions;
         DELETE FROM configs;
         DELETE FROM media_configs;
         DELETE FROM redemption_keys;
         DELETE FROM accounts;
         COMMIT;",
    )?;
    Ok(())
}
