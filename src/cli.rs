use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::app::{app, AppState};
use crate::auth::{JwtKeys, PasswordHashing};
use crate::config::config;
use crate::database::{schema, AccountStore, DatabaseManager, MemoryAccountStore, PgAccountStore};
use crate::services::AccountService;

#[derive(Parser)]
#[command(name = "referral-api")]
#[command(about = "Referral and credit API server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides REFERRAL_API_PORT")]
        port: Option<u16>,

        #[arg(long, help = "Keep accounts in memory instead of PostgreSQL")]
        memory: bool,
    },

    #[command(about = "Create the accounts table and indexes, then exit")]
    Migrate,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None, memory: false }) {
        Commands::Serve { port, memory } => serve(port, memory).await,
        Commands::Migrate => migrate().await,
    }
}

async fn serve(port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    let config = config();
    info!("Starting referral API in {:?} mode", config.environment);
    if crate::is_development!() && std::env::var("JWT_SECRET").is_err() {
        warn!("JWT_SECRET not set, using the development secret");
    }

    let jwt = JwtKeys::from_config(&config.security).context("JWT_SECRET must be set outside development")?;
    let passwords = PasswordHashing::from_config(&config.security);

    let store: Arc<dyn AccountStore> = if memory {
        warn!("Using in-memory account store; data is lost on exit");
        Arc::new(MemoryAccountStore::new())
    } else {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to PostgreSQL")?;
        schema::ensure_schema(&pool).await.context("failed to prepare schema")?;
        Arc::new(PgAccountStore::new(pool))
    };

    let state = AppState::new(
        AccountService::new(store, jwt, passwords),
        config.server.leaderboard_limit,
    );
    let router = app(state, &config.security.cors_origins);

    let port = port.unwrap_or(config.server.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Referral API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn migrate() -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config().database)
        .await
        .context("failed to connect to PostgreSQL")?;
    schema::ensure_schema(&pool).await.context("failed to prepare schema")?;
    info!("Schema is up to date");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
