use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::time::Duration;

use turnstile::config::Config;
use turnstile::crypto::hash_password;
use turnstile::db::{create_pool, init_db, queries, AppState};
use turnstile::entitlement::{keys, TIER_HWID_RESET, TIER_LIFETIME};
use turnstile::handlers;
use turnstile::models::{CreateAccount, CreateKey, Role};

#[derive(Parser, Debug)]
#[command(name = "turnstile")]
#[command(about = "Subscription entitlement server for game clients")]
struct Cli {
    /// Seed the database with dev data (admin, media, player accounts and sample keys)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

fn bootstrap_admin(state: &AppState, username: &str, password: &str) {
    let conn = state.db.get().expect("Failed to get db connection for bootstrap");

    let count = queries::count_admins(&conn).expect("Failed to count admins");
    if count > 0 {
        tracing::info!("Admin account already exists, skipping bootstrap");
        return;
    }

    let input = CreateAccount {
        username: username.to_string(),
        password: password.to_string(),
        email: None,
    };
    input.validate().expect("Bootstrap admin credentials are invalid");

    let password_hash = hash_password(password).expect("Failed to hash bootstrap password");
    let account =
        queries::create_account(&conn, &input, &password_hash).expect("Failed to create bootstrap admin");
    queries::set_account_role(&conn, &account.id, Role::Admin)
        .expect("Failed to promote bootstrap admin");

    tracing::info!("============================================");
    tracing::info!("BOOTSTRAP ADMIN CREATED");
    tracing::info!("Username: {}", username);
    tracing::info!("============================================");
}

/// Seeds the database with dev data for testing.
/// Creates: admin, media and player accounts, plus sample redemption keys.
/// Only runs in dev mode and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    // Check if already seeded (any admin exists)
    let count = queries::count_admins(&conn).expect("Failed to count admins");
    if count > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    // 1. Accounts, one per role
    let admin_hash = hash_password("admin-dev-password").expect("Failed to hash seed password");
    let admin = queries::create_account(
        &conn,
        &CreateAccount {
            username: "admin".to_string(),
            password: "admin-dev-password".to_string(),
            email: None,
        },
        &admin_hash,
    )
    .expect("Failed to create dev admin");
    queries::set_account_role(&conn, &admin.id, Role::Admin).expect("Failed to set admin role");

    let media_hash = hash_password("media-dev-password").expect("Failed to hash seed password");
    let media = queries::create_account(
        &conn,
        &CreateAccount {
            username: "mediapartner".to_string(),
            password: "media-dev-password".to_string(),
            email: None,
        },
        &media_hash,
    )
    .expect("Failed to create dev media account");
    queries::set_account_role(&conn, &media.id, Role::Media).expect("Failed to set media role");

    let player_hash = hash_password("player-dev-password").expect("Failed to hash seed password");
    let player = queries::create_account(
        &conn,
        &CreateAccount {
            username: "player1".to_string(),
            password: "player-dev-password".to_string(),
            email: None,
        },
        &player_hash,
    )
    .expect("Failed to create dev player account");

    tracing::info!("Admin: {} / admin-dev-password", admin.username);
    tracing::info!("Media: {} / media-dev-password", media.username);
    tracing::info!("Player: {} / player-dev-password", player.username);
    tracing::info!("");

    // 2. Sample redemption keys
    let monthly = keys::issue(
        &conn,
        &CreateKey {
            tier: "premium".to_string(),
            duration_days: 30,
        },
    )
    .expect("Failed to create dev monthly key");

    let lifetime = keys::issue(
        &conn,
        &CreateKey {
            tier: TIER_LIFETIME.to_string(),
            duration_days: 0,
        },
    )
    .expect("Failed to create dev lifetime key");

    let hwid_reset = keys::issue(
        &conn,
        &CreateKey {
            tier: TIER_HWID_RESET.to_string(),
            duration_days: 0,
        },
    )
    .expect("Failed to create dev hwid reset key");

    tracing::info!("30-day key: {}", monthly.code);
    tracing::info!("Lifetime key: {}", lifetime.code);
    tracing::info!("HWID reset key: {}", hwid_reset.code);

    tracing::info!("============================================");
    tracing::info!("DEV DATA SEEDED SUCCESSFULLY");
    tracing::info!("============================================");

    // Print copy-paste friendly output (no log formatting)
    println!();
    println!("--- COPY FROM HERE ---");
    println!("  admin: admin / admin-dev-password");
    println!("  media: mediapartner / media-dev-password");
    println!("  player: player1 / player-dev-password");
    println!("  key_30d: {}", monthly.code);
    println!("  key_lifetime: {}", lifetime.code);
    println!("  key_hwid_reset: {}", hwid_reset.code);
    println!("--- END COPY ---");
    println!();
}

/// Spawns a background task that periodically removes expired sessions.
/// Runs hourly; expired tokens are already rejected at auth time, this
/// just keeps the table from growing without bound.
fn spawn_session_reaper(state: AppState) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(60 * 60);

        loop {
            tokio::time::sleep(interval).await;

            match state.db.get() {
                Ok(conn) => match queries::delete_expired_sessions(&conn) {
                    Ok(count) => {
                        if count > 0 {
                            tracing::debug!("Reaped {} expired sessions", count);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to reap expired sessions: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to get db connection for session reaper: {}", e);
                }
            }
        }
    });

    tracing::info!("Session reaper started (runs hourly)");
}

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turnstile=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    // Create database connection pool
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");

    // Initialize database schema
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        trial_days: config.trial_days,
        reset_passphrase: config.reset_passphrase.clone(),
    };

    // Seed dev data if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set TURNSTILE_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    // Bootstrap first admin if configured (fallback for non-seed usage)
    if let (Some(username), Some(password)) = (
        config.bootstrap_admin_username.as_deref(),
        config.bootstrap_admin_password.as_deref(),
    ) {
        bootstrap_admin(&state, username, password);
    }

    // Start background session cleanup
    spawn_session_reaper(state.clone());

    // Build the application router
    let app = Router::new()
        // Health probe (no auth)
        .merge(handlers::router(config.rate_limit))
        // Registration and session management
        .merge(handlers::auth::router(state.clone(), config.rate_limit))
        // Game launcher surface (credentials + device binding)
        .merge(handlers::launcher::router(config.rate_limit))
        // Key redemption and free trials (session auth)
        .merge(handlers::redeem::router(state.clone(), config.rate_limit))
        // Config marketplace
        .merge(handlers::configs::router(state.clone(), config.rate_limit))
        // Media showcase
        .merge(handlers::media::router(state.clone(), config.rate_limit))
        // Administration (admin role)
        .merge(handlers::admin::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    // Track if we should clean up on exit
    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Turnstile server listening on {}", addr);

    // Run server with graceful shutdown
    // Use into_make_service_with_connect_info to enable IP-based rate limiting
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    // Cleanup on exit if ephemeral mode
    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        // Also remove WAL and SHM files if they exist
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
        tracing::info!("Ephemeral cleanup complete");
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
