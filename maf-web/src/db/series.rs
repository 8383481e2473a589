//! Anime series database operations

use chrono::{DateTime, Utc};
use maf_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;

use super::{AnimeSeries, SaveOutcome, SeriesFields};

const SERIES_COLUMNS: &str = "id, mal_id, image_url, title, last_updated, last_figure_calc";

/// Load one series by MyAnimeList id
pub async fn load_series(pool: &SqlitePool, mal_id: i64) -> Result<Option<AnimeSeries>> {
    let series = sqlx::query_as::<_, AnimeSeries>(&format!(
        "SELECT {} FROM anime_series WHERE mal_id = ?",
        SERIES_COLUMNS
    ))
    .bind(mal_id)
    .fetch_optional(pool)
    .await?;

    Ok(series)
}

/// Get-or-create-or-update a series keyed by MyAnimeList id
///
/// Existing rows are only written when a field actually differs.
pub async fn save_series(
    pool: &SqlitePool,
    mal_id: i64,
    fields: &SeriesFields,
) -> Result<(AnimeSeries, SaveOutcome)> {
    match load_series(pool, mal_id).await? {
        None => {
            let series = insert_series(pool, mal_id, fields).await?;
            Ok((series, SaveOutcome::Created))
        }
        Some(existing) => update_series_fields(pool, existing, fields).await,
    }
}

/// Apply fields to an already-loaded series, writing only on change
pub async fn update_series_fields(
    pool: &SqlitePool,
    existing: AnimeSeries,
    fields: &SeriesFields,
) -> Result<(AnimeSeries, SaveOutcome)> {
    if existing.fields() == *fields {
        return Ok((existing, SaveOutcome::Unchanged));
    }

    let series = sqlx::query_as::<_, AnimeSeries>(&format!(
        r#"
        UPDATE anime_series
        SET image_url = ?, title = ?, last_updated = ?
        WHERE id = ?
        RETURNING {}
        "#,
        SERIES_COLUMNS
    ))
    .bind(&fields.image_url)
    .bind(&fields.title)
    .bind(Utc::now())
    .bind(existing.id)
    .fetch_one(pool)
    .await?;

    tracing::debug!(mal_id = series.mal_id, "Updated cached series fields");
    Ok((series, SaveOutcome::Updated))
}

async fn insert_series(
    pool: &SqlitePool,
    mal_id: i64,
    fields: &SeriesFields,
) -> Result<AnimeSeries> {
    let series = sqlx::query_as::<_, AnimeSeries>(&format!(
        r#"
        INSERT INTO anime_series (mal_id, image_url, title, last_updated)
        VALUES (?, ?, ?, ?)
        RETURNING {}
        "#,
        SERIES_COLUMNS
    ))
    .bind(mal_id)
    .bind(&fields.image_url)
    .bind(&fields.title)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    tracing::debug!(mal_id, title = ?series.title, "Cached new series");
    Ok(series)
}

/// Load every known series among `mal_ids`, keyed by MyAnimeList id
pub async fn load_series_by_mal_ids(
    pool: &SqlitePool,
    mal_ids: &[i64],
) -> Result<HashMap<i64, AnimeSeries>> {
    if mal_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {} FROM anime_series WHERE mal_id IN (", SERIES_COLUMNS));
    let mut separated = builder.separated(", ");
    for mal_id in mal_ids {
        separated.push_bind(*mal_id);
    }
    separated.push_unseparated(")");

    let rows = builder
        .build_query_as::<AnimeSeries>()
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|s| (s.mal_id, s)).collect())
}

/// Record that figures were recalculated for a series
///
/// Touches only `last_figure_calc`.
pub async fn mark_figures_calculated(
    pool: &SqlitePool,
    series_id: i64,
    at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("UPDATE anime_series SET last_figure_calc = ? WHERE id = ?")
        .bind(at)
        .bind(series_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Series whose figures were last calculated before `cutoff`
///
/// Never-calculated series are excluded; page views handle those.
pub async fn load_series_calculated_before(
    pool: &SqlitePool,
    cutoff: DateTime<Utc>,
) -> Result<Vec<AnimeSeries>> {
    let rows = sqlx::query_as::<_, AnimeSeries>(&format!(
        r#"
        SELECT {}
        FROM anime_series
        WHERE last_figure_calc IS NOT NULL AND last_figure_calc < ?
        ORDER BY last_figure_calc ASC
        "#,
        SERIES_COLUMNS
    ))
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
