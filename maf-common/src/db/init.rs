//! Database initialization
//!
//! Creates the series/figure cache schema on first run. Every statement is
//! idempotent, so opening an existing database is safe.

use crate::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas go on the connect options so every pooled connection gets them
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        // WAL lets page views read while the batch refresher writes
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// Limited to a single connection: every SQLite `:memory:` connection is a
/// separate database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create every table and index used by the figure cache
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_anime_series_table(pool).await?;
    create_figures_table(pool).await?;
    create_series_figures_table(pool).await?;
    Ok(())
}

/// Create the anime_series table
///
/// One row per MyAnimeList series, keyed externally by `mal_id`.
pub async fn create_anime_series_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS anime_series (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            mal_id INTEGER NOT NULL UNIQUE,
            image_url TEXT,
            title TEXT,
            last_updated TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_figure_calc TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_anime_series_last_figure_calc ON anime_series(last_figure_calc)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the figures table
///
/// One row per MyFigureCollection item, keyed externally by `mfc_id`.
/// `price` is in JPY.
pub async fn create_figures_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS figures (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            mfc_id INTEGER NOT NULL UNIQUE,
            barcode TEXT,
            name TEXT NOT NULL,
            release_date TIMESTAMP,
            price INTEGER,
            category INTEGER,
            last_updated TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_figures_release_date ON figures(release_date)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the series <-> figure join table
pub async fn create_series_figures_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS anime_series_figures (
            series_id INTEGER NOT NULL REFERENCES anime_series(id) ON DELETE CASCADE,
            figure_id INTEGER NOT NULL REFERENCES figures(id) ON DELETE CASCADE,
            PRIMARY KEY (series_id, figure_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_anime_series_figures_figure ON anime_series_figures(figure_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
