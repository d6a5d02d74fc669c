use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_tour::config::Config;
use campus_tour::AppState;

#[derive(Parser, Debug)]
#[command(name = "campus-tour")]
#[command(author, version, about = "Backend API for a 3D campus virtual-tour application", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "campus-tour.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting campus-tour v{}", env!("CARGO_PKG_VERSION"));

    // Ensure data directory exists
    campus_tour::utils::ensure_dir(&config.server.data_dir)?;

    // Initialize database
    let db = campus_tour::db::init(&config.server.data_dir).await?;

    // Ensure default admin user exists
    campus_tour::api::auth::ensure_admin_user(
        &db,
        &config.auth.admin_email,
        &config.auth.admin_password,
    )
    .await?;

    // Resolve the token signing secret. There is no hardcoded fallback: when
    // unconfigured, a random per-process secret is generated and issued
    // tokens die with the process.
    let jwt_secret = match &config.auth.jwt_secret {
        Some(secret) => secret.clone(),
        None => {
            tracing::warn!(
                "No auth.jwt_secret configured; generated an ephemeral secret, \
                 issued tokens will not survive a restart"
            );
            campus_tour::api::auth::generate_secret()
        }
    };

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), jwt_secret, db));
    let app = campus_tour::api::create_router(state);

    // Start API server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
