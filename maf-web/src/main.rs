//! maf-web - MyAnimeFigures web service
//!
//! Serves the lookup form and per-user figure pages on the configured port
//! (5780 unless overridden).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use maf_common::config::{load_toml_config, resolve_root_folder, TomlConfig};
use maf_web::clients::{MalClient, MfcClient, RateLimiter};
use maf_web::services::{AnimeFigureService, LookupSettings};
use maf_web::{build_router, AppState};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "maf-web")]
#[command(about = "Figures for the anime you are watching")]
#[command(version)]
struct Args {
    /// HTTP port (overrides config file)
    #[arg(short, long, env = "MAF_PORT")]
    port: Option<u16>,

    /// Root folder holding the database
    #[arg(short, long, env = "MAF_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Path to TOML config file
    #[arg(short, long, env = "MAF_CONFIG")]
    config: Option<PathBuf>,
}

fn init_tracing(config: &TomlConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{},tower_http=info", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config =
        load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config);

    // Build identification first, before any slow startup work
    info!(
        "Starting MyAnimeFigures (maf-web) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    let db_path = config.database_path(&root_folder);
    info!("Root folder: {}", root_folder.display());
    info!("Database path: {}", db_path.display());

    let pool = maf_common::db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    let rate_limiter = Arc::new(RateLimiter::from_config(&config.endpoints));
    let anime_lists = MalClient::new(&config.endpoints, rate_limiter.clone())
        .context("Failed to build MAL client")?;
    let figures =
        MfcClient::new(&config.endpoints, rate_limiter).context("Failed to build MFC client")?;
    let service = AnimeFigureService::new(
        pool,
        Arc::new(anime_lists),
        Arc::new(figures),
        LookupSettings::from(&config.lists),
    );

    let state = AppState::new(service, config.endpoints.figure_image_url.as_str());
    let app = build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr = format!("{}:{}", config.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("maf-web listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
