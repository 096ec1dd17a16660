pub mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool and runtime configuration
#[derive(Clone)]
pub struct AppState {
    /// Database pool (accounts, sessions, keys, trials, configs)
    pub db: DbPool,
    /// Length of the free trial in days
    pub trial_days: i64,
    /// Passphrase required by the destructive admin reset (None disables it)
    pub reset_passphrase: Option<String>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
    });
    Pool::builder().max_size(10).build(manager)
}
