//! Bank Ledger server
//!
//! Startup order:
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │  Config  │───▶│ Database │───▶│  Store   │───▶│ Gateway  │
//! │  (YAML)  │    │ (schema) │    │  (+seed) │    │  (axum)  │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```
//!
//! The pool is created here, passed down explicitly, and closed after the
//! server has drained.

use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;

use bank_ledger::account::AccountDirectory;
use bank_ledger::config::{AppConfig, StoreBackend};
use bank_ledger::db::Database;
use bank_ledger::gateway::{self, AppState};
use bank_ledger::store::{MemoryLedgerStore, PgLedgerStore};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received, draining requests"),
        Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
    }
}

async fn seed<S: AccountDirectory>(store: &S, enabled: bool) -> anyhow::Result<()> {
    if enabled {
        store
            .seed_primary_account()
            .await
            .context("Failed to seed primary account")?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        config.gateway.port = port;
    }
    let _log_guard = bank_ledger::logging::init_logging(&config);

    tracing::info!("Starting Bank Ledger in {} mode", env);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    match config.store.backend {
        StoreBackend::Postgres => {
            let url = config
                .store
                .postgres_url
                .as_deref()
                .context("store.postgres_url is not set")?;
            let db = Database::connect(
                url,
                config.store.max_connections,
                config.store.acquire_timeout(),
            )
            .await
            .context("Failed to connect to PostgreSQL")?;
            db.init_schema()
                .await
                .context("Failed to initialize schema")?;

            let store = Arc::new(PgLedgerStore::new(
                db.pool().clone(),
                config.store.lock_timeout(),
            ));
            seed(store.as_ref(), config.store.seed_primary_account).await?;

            let router = gateway::build_router(AppState::new(store));
            let served = gateway::run_server(listener, router, shutdown_signal()).await;

            db.close().await;
            served.context("Server error")?;
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; balances are lost on exit");
            let store = Arc::new(MemoryLedgerStore::with_lock_timeout(
                config.store.lock_timeout(),
            ));
            seed(store.as_ref(), config.store.seed_primary_account).await?;

            let router = gateway::build_router(AppState::new(store));
            gateway::run_server(listener, router, shutdown_signal())
                .await
                .context("Server error")?;
        }
    }

    tracing::info!("Bank Ledger stopped");
    Ok(())
}
