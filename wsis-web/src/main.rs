//! wsis-web - Weekly safety-inspection reporting service
//!
//! Serves the report submission form and the per-user dashboard over a
//! local SQLite store with live snapshot updates.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use wsis_common::config::{AppConfig, ConfigOverrides};
use wsis_web::session::{SessionManager, SqliteIdentityProvider};
use wsis_web::store::ReportStore;
use wsis_web::{build_router, db, AppState};

#[derive(Parser, Debug)]
#[command(name = "wsis-web", about = "Weekly safety-inspection reporting service")]
struct Cli {
    /// Data root folder (holds the SQLite database)
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:5731
    #[arg(long)]
    bind: Option<String>,

    /// Application identifier (namespace segment)
    #[arg(long)]
    app_id: Option<String>,

    /// Bootstrap auth token (default: anonymous sign-in)
    #[arg(long)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting WSIS web service (wsis-web) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let cli = Cli::parse();

    // Single explicit configuration-resolution step; the result is
    // immutable and threaded everywhere it's needed
    let config = AppConfig::resolve(ConfigOverrides {
        root_folder: cli.root_folder,
        bind_address: cli.bind,
        app_id: cli.app_id,
        bootstrap_token: cli.token,
    })?;
    info!("App ID: {}", config.app_id);
    info!("Database path: {}", config.database_path().display());

    let pool = match db::init_database(&config.database_path()).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    // Explicitly constructed client context: provider → session manager →
    // store, lifecycle owned here
    let provider = Arc::new(SqliteIdentityProvider::new(pool.clone()));
    let session = Arc::new(SessionManager::new(provider));
    session.bootstrap(config.bootstrap_token.as_deref()).await;
    match session.current() {
        Some(user) => info!("✓ Session ready: {}", user),
        None => info!("Session not established (state: {})", session.phase().await.as_str()),
    }

    let store = Arc::new(ReportStore::new(pool, config.app_id.clone()));

    let config = Arc::new(config);
    let state = AppState::new(config.clone(), session, store);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("wsis-web listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
