use rusqlite::Connection;

/// Initialize the database schema
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Accounts (game-client users, media publishers, admins)
        -- hwid is NULL until the launcher binds the first device
        -- subscription_tier/subscription_expires_at are NULL until a key or trial is applied
        CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            email TEXT,
            hwid TEXT,
            role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'media', 'admin')),
            subscription_tier TEXT,
            subscription_expires_at INTEGER,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_accounts_username ON accounts(username);
        CREATE INDEX IF NOT EXISTS idx_accounts_role ON accounts(role);
        CREATE INDEX IF NOT EXISTS idx_accounts_hwid ON accounts(hwid) WHERE hwid IS NOT NULL;

        -- Sessions (opaque bearer tokens, stored hashed)
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            token_hash TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_token ON sessions(token_hash);
        CREATE INDEX IF NOT EXISTS idx_sessions_account ON sessions(account_id);
        CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);

        -- Redemption keys (single-use, claimed via used 0 -> 1 flag)
        -- tier 'lifetime' and 'hwid_reset' are reserved; everything else is a timed tier
        CREATE TABLE IF NOT EXISTS redemption_keys (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            tier TEXT NOT NULL,
            duration_days INTEGER NOT NULL DEFAULT 0,
            used INTEGER NOT NULL DEFAULT 0,
            used_by TEXT REFERENCES accounts(id) ON DELETE SET NULL,
            used_at INTEGER,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_redemption_keys_code ON redemption_keys(code);
        CREATE INDEX IF NOT EXISTS idx_redemption_keys_unused ON redemption_keys(id) WHERE used = 0;

        -- Trial grants (one per account; the abuse filter dedup record)
        -- hwid is NULL when the trial predates device binding, backfilled on first bind
        CREATE TABLE IF NOT EXISTS trial_grants (
            id TEXT PRIMARY KEY,
            account_id TEXT NOT NULL UNIQUE REFERENCES accounts(id) ON DELETE CASCADE,
            origin TEXT NOT NULL,
            hwid TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_trial_grants_origin ON trial_grants(origin);
        CREATE INDEX IF NOT EXISTS idx_trial_grants_hwid ON trial_grants(hwid) WHERE hwid IS NOT NULL;

        -- Configs (user-uploaded game settings, content stored inline)
        -- author_name denormalized so listings skip the join
        CREATE TABLE IF NOT EXISTS configs (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            content TEXT NOT NULL,
            author_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            author_name TEXT NOT NULL,
            private INTEGER NOT NULL DEFAULT 0,
            downloads INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_configs_author ON configs(author_id);
        CREATE INDEX IF NOT EXISTS idx_configs_public ON configs(downloads DESC) WHERE private = 0;

        -- Media configs (showcase entries from media partners, metadata only)
        CREATE TABLE IF NOT EXISTS media_configs (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            author_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            author_name TEXT NOT NULL,
            price INTEGER NOT NULL DEFAULT 0,
            store_url TEXT,
            promo_code TEXT,
            downloads INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_media_configs_author ON media_configs(author_id);
        CREATE INDEX IF NOT EXISTS idx_media_configs_created ON media_configs(created_at DESC);
        "#,
    )?;
    Ok(())
}
