//! Core logic connecting figures to anime series
//!
//! A page view fetches the user's list, picks the currently-watching and
//! recently-completed series, refreshes cached series rows, and re-queries
//! figures for any series whose figure cache is missing or stale.

use chrono::{DateTime, Duration, Utc};
use maf_common::config::ListConfig;
use maf_common::time;
use sqlx::SqlitePool;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::LookupError;
use crate::clients::{AnimeEntry, AnimeListDocument, AnimeListSource, FigureSource, WatchStatus};
use crate::db::{self, AnimeSeries, Figure, SeriesFields};

/// List sizes and cache policy for lookups
#[derive(Debug, Clone)]
pub struct LookupSettings {
    pub max_watching: usize,
    pub recently_completed: usize,
    pub recent_figures: usize,
    /// Figures older than this are re-queried on page view
    pub figure_cache_max_age: Duration,
}

impl From<&ListConfig> for LookupSettings {
    fn from(config: &ListConfig) -> Self {
        Self {
            max_watching: config.max_watching,
            recently_completed: config.recently_completed,
            recent_figures: config.recent_figures,
            figure_cache_max_age: time::hours(config.figure_cache_hours),
        }
    }
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self::from(&ListConfig::default())
    }
}

/// List entries chosen for display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSelection {
    /// Currently-watching entries, list order, capped
    pub watching: Vec<AnimeEntry>,
    /// Completed entries, most recently updated first, capped
    pub completed: Vec<AnimeEntry>,
    /// Every watching or completed series id, list order
    pub all_mal_ids: Vec<i64>,
    /// Ids of `watching` followed by `completed`
    pub lookup_ids: Vec<i64>,
}

/// A cached series with its figures, newest release first
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesWithFigures {
    pub series: AnimeSeries,
    pub figures: Vec<Figure>,
}

/// Everything the user page renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimeListView {
    pub user: String,
    pub watching: Vec<SeriesWithFigures>,
    pub watching_nofigs: Vec<SeriesWithFigures>,
    pub recently_completed: Vec<SeriesWithFigures>,
    pub completed_nofigs: Vec<SeriesWithFigures>,
    pub recent_figures: Vec<Figure>,
    pub all_mal_ids: Vec<i64>,
}

/// Search keywords for a series title
///
/// Drops surrounding whitespace and a trailing `(TV)` marker, which MAL
/// appends to disambiguate TV series and which MFC item names never carry.
pub fn sanitize_title(title: &str) -> String {
    let trimmed = title.trim();
    trimmed
        .strip_suffix("(TV)")
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Pick watching and recently-completed entries from a list
pub fn select_entries(document: &AnimeListDocument, settings: &LookupSettings) -> ListSelection {
    let mut selection = ListSelection::default();
    let mut completed = Vec::new();

    for entry in &document.entries {
        match entry.status {
            WatchStatus::Watching => {
                selection.all_mal_ids.push(entry.mal_id);
                if selection.watching.len() < settings.max_watching {
                    selection.watching.push(entry.clone());
                }
            }
            WatchStatus::Completed => {
                selection.all_mal_ids.push(entry.mal_id);
                completed.push(entry.clone());
            }
            _ => {}
        }
    }

    // Stable: ties keep list order
    completed.sort_by_key(|entry| Reverse(entry.last_updated));
    completed.truncate(settings.recently_completed);
    selection.completed = completed;

    selection.lookup_ids = selection
        .watching
        .iter()
        .chain(selection.completed.iter())
        .map(|entry| entry.mal_id)
        .collect();

    selection
}

/// Whether a series' figures must be re-queried before display
///
/// True when figures were never calculated or were calculated before
/// `now - max_age`.
pub fn needs_refresh(
    last_figure_calc: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    max_age: Duration,
) -> bool {
    time::is_stale(last_figure_calc, now, max_age)
}

/// Split series into (with figures, without figures), preserving order
fn partition_by_figures(
    items: Vec<SeriesWithFigures>,
) -> (Vec<SeriesWithFigures>, Vec<SeriesWithFigures>) {
    items.into_iter().partition(|item| !item.figures.is_empty())
}

/// Figure lookup service shared by the web handlers and the batch refresher
pub struct AnimeFigureService {
    db: SqlitePool,
    anime_lists: Arc<dyn AnimeListSource>,
    figures: Arc<dyn FigureSource>,
    settings: LookupSettings,
}

impl AnimeFigureService {
    pub fn new(
        db: SqlitePool,
        anime_lists: Arc<dyn AnimeListSource>,
        figures: Arc<dyn FigureSource>,
        settings: LookupSettings,
    ) -> Self {
        Self {
            db,
            anime_lists,
            figures,
            settings,
        }
    }

    /// Build the full figure page for a user
    pub async fn get_anime_list(&self, user: &str) -> Result<AnimeListView, LookupError> {
        info!(user = %user, "Looking up anime list");

        let document = self.anime_lists.fetch_anime_list(user).await?;
        if let Some(message) = document.error {
            return Err(LookupError::AnimeList(message));
        }

        let selection = select_entries(&document, &self.settings);

        // Two bulk queries instead of one per series
        let mut known_series =
            db::series::load_series_by_mal_ids(&self.db, &selection.lookup_ids).await?;
        let mut cached_figures =
            db::figures::load_figures_for_series(&self.db, &selection.lookup_ids).await?;

        let now = time::now();
        let mut watching = Vec::with_capacity(selection.watching.len());
        for entry in &selection.watching {
            watching.push(
                self.resolve_entry(entry, &mut known_series, &mut cached_figures, now)
                    .await?,
            );
        }

        let mut completed = Vec::with_capacity(selection.completed.len());
        for entry in &selection.completed {
            completed.push(
                self.resolve_entry(entry, &mut known_series, &mut cached_figures, now)
                    .await?,
            );
        }

        let (watching, watching_nofigs) = partition_by_figures(watching);
        let (recently_completed, completed_nofigs) = partition_by_figures(completed);

        let recent_figures = db::figures::load_recent_figures(
            &self.db,
            &selection.all_mal_ids,
            self.settings.recent_figures,
        )
        .await?;

        info!(
            user = %user,
            watching = watching.len() + watching_nofigs.len(),
            completed = recently_completed.len() + completed_nofigs.len(),
            recent_figures = recent_figures.len(),
            "Anime list lookup complete"
        );

        Ok(AnimeListView {
            user: user.to_string(),
            watching,
            watching_nofigs,
            recently_completed,
            completed_nofigs,
            recent_figures,
            all_mal_ids: selection.all_mal_ids,
        })
    }

    /// Refresh one list entry's series row and make sure its figures are current
    async fn resolve_entry(
        &self,
        entry: &AnimeEntry,
        known_series: &mut HashMap<i64, AnimeSeries>,
        cached_figures: &mut HashMap<i64, Vec<Figure>>,
        now: DateTime<Utc>,
    ) -> Result<SeriesWithFigures, LookupError> {
        let fields = SeriesFields {
            image_url: entry.image_url.clone(),
            title: entry.title.clone(),
        };

        let (series, _) = match known_series.remove(&entry.mal_id) {
            Some(existing) => db::series::update_series_fields(&self.db, existing, &fields).await?,
            None => db::series::save_series(&self.db, entry.mal_id, &fields).await?,
        };

        let cached = cached_figures.remove(&series.id).unwrap_or_default();

        if !needs_refresh(series.last_figure_calc, now, self.settings.figure_cache_max_age) {
            return Ok(SeriesWithFigures {
                series,
                figures: cached,
            });
        }

        match self.recalculate_figures(series.clone()).await {
            Ok((series, figures)) => Ok(SeriesWithFigures { series, figures }),
            Err(LookupError::Client(e)) => {
                // Serve what we have; last_figure_calc stays old so the next view retries
                warn!(
                    mal_id = series.mal_id,
                    error = %e,
                    "Figure search failed, using cached figures"
                );
                Ok(SeriesWithFigures {
                    series,
                    figures: cached,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Re-query figures for a series and link every result to it
    ///
    /// Returns the series with its new `last_figure_calc` and the figures
    /// found by this search, newest release first.
    pub async fn recalculate_figures(
        &self,
        mut series: AnimeSeries,
    ) -> Result<(AnimeSeries, Vec<Figure>), LookupError> {
        let keywords = sanitize_title(series.title.as_deref().unwrap_or_default());
        info!(
            mal_id = series.mal_id,
            title = ?series.title,
            keywords = %keywords,
            "Querying figures for anime"
        );

        let mut figures = Vec::new();
        if keywords.is_empty() {
            debug!(mal_id = series.mal_id, "No title to search figures for");
        } else {
            let records = self.figures.search_figures(&keywords).await?;
            for record in records {
                let (figure, _) =
                    db::figures::save_figure(&self.db, record.mfc_id, &record.fields).await?;
                figures.push(figure);
            }
        }

        let figure_ids: Vec<i64> = figures.iter().map(|f| f.id).collect();
        db::figures::link_figures(&self.db, series.id, &figure_ids).await?;

        let calculated_at = time::now();
        db::series::mark_figures_calculated(&self.db, series.id, calculated_at).await?;
        series.last_figure_calc = Some(calculated_at);

        // Match the ordering of cached figure lists
        figures.sort_by_key(|f| (f.release_date.is_none(), Reverse(f.release_date), f.id));
        figures.dedup_by_key(|f| f.id);

        debug!(mal_id = series.mal_id, figures = figures.len(), "Figures recalculated");
        Ok((series, figures))
    }

    /// Recalculate figures for every series not refreshed within `max_age`
    ///
    /// Failures are logged per series and do not stop the batch.
    pub async fn refresh_stale_series(&self, max_age: Duration) -> Result<usize, LookupError> {
        let cutoff = time::cutoff(time::now(), max_age);
        let stale = db::series::load_series_calculated_before(&self.db, cutoff).await?;
        info!(candidates = stale.len(), cutoff = %cutoff, "Refreshing stale series");

        let mut refreshed = 0;
        for series in stale {
            let mal_id = series.mal_id;
            match self.recalculate_figures(series).await {
                Ok(_) => refreshed += 1,
                Err(e) => warn!(mal_id, error = %e, "Failed to refresh series figures"),
            }
        }

        info!("refreshed {} series", refreshed);
        Ok(refreshed)
    }
}
