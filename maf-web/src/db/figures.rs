//! Figure database operations

use chrono::Utc;
use maf_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;

use super::{Figure, FigureFields, SaveOutcome};

const FIGURE_COLUMNS: &str =
    "id, mfc_id, barcode, name, release_date, price, category, last_updated";

/// Figure row tagged with the series it is linked to
#[derive(Debug, sqlx::FromRow)]
struct LinkedFigure {
    series_id: i64,
    #[sqlx(flatten)]
    figure: Figure,
}

/// Load one figure by MyFigureCollection id
pub async fn load_figure(pool: &SqlitePool, mfc_id: i64) -> Result<Option<Figure>> {
    let figure = sqlx::query_as::<_, Figure>(&format!(
        "SELECT {} FROM figures WHERE mfc_id = ?",
        FIGURE_COLUMNS
    ))
    .bind(mfc_id)
    .fetch_optional(pool)
    .await?;

    Ok(figure)
}

/// Get-or-create-or-update a figure keyed by MyFigureCollection id
///
/// Existing rows are only written when a field actually differs.
pub async fn save_figure(
    pool: &SqlitePool,
    mfc_id: i64,
    fields: &FigureFields,
) -> Result<(Figure, SaveOutcome)> {
    let existing = load_figure(pool, mfc_id).await?;

    if let Some(figure) = &existing {
        if figure.fields() == *fields {
            return Ok((figure.clone(), SaveOutcome::Unchanged));
        }
    }

    let (sql, outcome) = match existing {
        None => (
            format!(
                r#"
                INSERT INTO figures (barcode, name, release_date, price, category, last_updated, mfc_id)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                RETURNING {}
                "#,
                FIGURE_COLUMNS
            ),
            SaveOutcome::Created,
        ),
        Some(_) => (
            format!(
                r#"
                UPDATE figures
                SET barcode = ?, name = ?, release_date = ?, price = ?, category = ?, last_updated = ?
                WHERE mfc_id = ?
                RETURNING {}
                "#,
                FIGURE_COLUMNS
            ),
            SaveOutcome::Updated,
        ),
    };

    let figure = sqlx::query_as::<_, Figure>(&sql)
        .bind(&fields.barcode)
        .bind(&fields.name)
        .bind(fields.release_date)
        .bind(fields.price)
        .bind(fields.category)
        .bind(Utc::now())
        .bind(mfc_id)
        .fetch_one(pool)
        .await?;

    tracing::debug!(mfc_id, outcome = ?outcome, "Saved figure");
    Ok((figure, outcome))
}

/// Associate figures with a series
///
/// Idempotent; existing links are never removed.
pub async fn link_figures(pool: &SqlitePool, series_id: i64, figure_ids: &[i64]) -> Result<()> {
    if figure_ids.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT OR IGNORE INTO anime_series_figures (series_id, figure_id) ");
    builder.push_values(figure_ids, |mut row, figure_id| {
        row.push_bind(series_id).push_bind(*figure_id);
    });

    builder.build().execute(pool).await?;
    Ok(())
}

/// Figures linked to each of the given series, keyed by series row id
///
/// Each list is ordered newest release first, undated figures last.
pub async fn load_figures_for_series(
    pool: &SqlitePool,
    mal_ids: &[i64],
) -> Result<HashMap<i64, Vec<Figure>>> {
    if mal_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT asf.series_id, f.id, f.mfc_id, f.barcode, f.name, f.release_date,
               f.price, f.category, f.last_updated
        FROM figures f
        JOIN anime_series_figures asf ON asf.figure_id = f.id
        JOIN anime_series s ON s.id = asf.series_id
        WHERE s.mal_id IN (
        "#,
    );
    let mut separated = builder.separated(", ");
    for mal_id in mal_ids {
        separated.push_bind(*mal_id);
    }
    separated.push_unseparated(")");
    builder.push(" ORDER BY f.release_date IS NULL, f.release_date DESC, f.id ASC");

    let rows = builder
        .build_query_as::<LinkedFigure>()
        .fetch_all(pool)
        .await?;

    let mut by_series: HashMap<i64, Vec<Figure>> = HashMap::new();
    for row in rows {
        by_series.entry(row.series_id).or_default().push(row.figure);
    }

    Ok(by_series)
}

/// Newest dated figures linked to any of the given series
pub async fn load_recent_figures(
    pool: &SqlitePool,
    mal_ids: &[i64],
    limit: usize,
) -> Result<Vec<Figure>> {
    if mal_ids.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT DISTINCT f.id, f.mfc_id, f.barcode, f.name, f.release_date,
               f.price, f.category, f.last_updated
        FROM figures f
        JOIN anime_series_figures asf ON asf.figure_id = f.id
        JOIN anime_series s ON s.id = asf.series_id
        WHERE f.release_date IS NOT NULL AND s.mal_id IN (
        "#,
    );
    let mut separated = builder.separated(", ");
    for mal_id in mal_ids {
        separated.push_bind(*mal_id);
    }
    separated.push_unseparated(")");
    builder.push(" ORDER BY f.release_date DESC, f.id ASC LIMIT ");
    builder.push_bind(limit as i64);

    let figures = builder.build_query_as::<Figure>().fetch_all(pool).await?;
    Ok(figures)
}
