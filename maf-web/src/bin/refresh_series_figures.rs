//! refresh-series-figures - batch figure cache refresh
//!
//! Re-queries figures for every cached series whose figures were last
//! fetched longer ago than `--max-age-hours` (default from config, 48h).
//! Intended to run from cron so page views rarely hit the figure API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use maf_common::config::{load_toml_config, resolve_root_folder};
use maf_common::time;
use maf_web::clients::{MalClient, MfcClient, RateLimiter};
use maf_web::services::{AnimeFigureService, LookupSettings};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "refresh-series-figures")]
#[command(about = "Refresh figures for series whose cache has gone stale")]
#[command(version)]
struct Args {
    /// Refresh series not recalculated within this many hours
    #[arg(long)]
    max_age_hours: Option<u64>,

    /// Root folder holding the database
    #[arg(short, long, env = "MAF_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Path to TOML config file
    #[arg(short, long, env = "MAF_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config =
        load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .init();

    info!(
        "Starting refresh-series-figures v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    let db_path = config.database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = maf_common::db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

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

    let max_age_hours = args.max_age_hours.unwrap_or(config.lists.refresh_after_hours);
    let refreshed = service
        .refresh_stale_series(time::hours(max_age_hours))
        .await
        .context("Figure refresh failed")?;

    info!(refreshed, max_age_hours, "Refresh complete");
    Ok(())
}
