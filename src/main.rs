//! To-do list API server
//!
//! Usage:
//!   JWT_SECRET=... todolist --database-path todolist.db
//!
//! See `todolist --help` for every flag; each has an environment fallback.

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::Path;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todolist_backend::{
    api::{self, AppState},
    auth::{BcryptHasher, JwtHandler},
    config::{Args, Config},
    store::{seed, TodoStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    let config = Config::from_args(Args::parse()).context("Invalid configuration")?;

    let store = TodoStore::new(&config.database_path).with_context(|| {
        format!("Failed to open database at {}", config.database_path.display())
    })?;
    info!("Database initialized at: {}", config.database_path.display());

    let hasher = BcryptHasher::new(config.bcrypt_cost);

    if let Some(admin) = &config.bootstrap_admin {
        seed::bootstrap_admin(&store, &hasher, admin)?;
    }
    if config.seed_demo {
        seed::seed_demo_data(&store, &hasher)?;
    }
    if store.count_users()? == 0 {
        warn!("No users exist; set TODO_ADMIN_USERNAME/TODO_ADMIN_PASSWORD to create an admin");
    }

    let jwt = JwtHandler::new(&config.jwt_secret, config.token_ttl);
    let app = api::router(AppState::new(store, jwt, hasher));

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("API server listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todolist_backend=debug,todolist=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents), then the crate root.
    let _ = dotenv();

    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
