//! Row mapping trait and helpers for reducing boilerplate in queries.
//!
//! This module provides a `FromRow` trait that models can implement to
//! define how they are constructed from database rows, plus helper functions
//! for common query patterns.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to rusqlite errors.
///
/// This provides graceful error handling instead of panicking when database
/// contains invalid enum values (from corruption, migration errors, etc.).
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
///
/// Implementing this trait allows using the `query_one` and `query_all`
/// helper functions, reducing repetitive row mapping closures.
pub trait FromRow: Sized {
    /// Construct an instance from a database row.
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const ACCOUNT_COLS: &str = "id, username, password_hash, email, hwid, role, subscription_tier, subscription_expires_at, created_at";

pub const SESSION_COLS: &str = "id, account_id, token_hash, created_at, expires_at";

pub const REDEMPTION_KEY_COLS: &str =
    "id, code, tier, duration_days, used, used_by, used_at, created_at";

pub const TRIAL_GRANT_COLS: &str = "id, account_id, origin, hwid, created_at";

pub const CONFIG_COLS: &str =
    "id, name, description, content, author_id, author_name, private, downloads, created_at";

/// Columns for config listings (content omitted, it can be large)
pub const CONFIG_SUMMARY_COLS: &str =
    "id, name, description, author_id, author_name, private, downloads, created_at";

pub const MEDIA_CONFIG_COLS: &str = "id, name, description, author_id, author_name, price, store_url, promo_code, downloads, created_at";

// ============ FromRow Implementations ============

impl FromRow for Account {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Account {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            email: row.get(3)?,
            hwid: row.get(4)?,
            role: parse_enum(row, 5, "role")?,
            subscription_tier: row.get(6)?,
            subscription_expires_at: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

impl FromRow for Session {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Session {
            id: row.get(0)?,
            account_id: row.get(1)?,
            token_hash: row.get(2)?,
            created_at: row.get(3)?,
            expires_at: row.get(4)?,
        })
    }
}

impl FromRow for RedemptionKey {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(RedemptionKey {
            id: row.get(0)?,
            code: row.get(1)?,
            tier: row.get(2)?,
            duration_days: row.get(3)?,
            used: row.get::<_, i32>(4)? != 0,
            used_by: row.get(5)?,
            used_at: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

impl FromRow for TrialGrant {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(TrialGrant {
            id: row.get(0)?,
            account_id: row.get(1)?,
            origin: row.get(2)?,
            hwid: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for ConfigFile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ConfigFile {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            content: row.get(3)?,
            author_id: row.get(4)?,
            author_name: row.get(5)?,
            private: row.get::<_, i32>(6)? != 0,
            downloads: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

impl FromRow for ConfigSummary {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ConfigSummary {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            author_id: row.get(3)?,
            author_name: row.get(4)?,
            private: row.get::<_, i32>(5)? != 0,
            downloads: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

impl FromRow for MediaConfig {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(MediaConfig {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            author_id: row.get(3)?,
            author_name: row.get(4)?,
            price: row.get(5)?,
            store_url: row.get(6)?,
            promo_code: row.get(7)?,
            downloads: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}
