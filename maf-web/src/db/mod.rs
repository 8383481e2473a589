//! Database access for maf-web
//!
//! Cached series and figure rows plus the link table between them.
//! Schema creation lives in `maf_common::db`.

pub mod figures;
pub mod series;

use chrono::{DateTime, Utc};

/// Figure names longer than this are shortened for display
pub const TRUNCATE_NAME_LEN: usize = 50;

/// Result of a get-or-create-or-update save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No row existed for the external id
    Created,
    /// Row existed and at least one field changed
    Updated,
    /// Row existed with identical fields; nothing written
    Unchanged,
}

/// Cached MyAnimeList series
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AnimeSeries {
    pub id: i64,
    /// MyAnimeList series id
    pub mal_id: i64,
    pub image_url: Option<String>,
    pub title: Option<String>,
    pub last_updated: DateTime<Utc>,
    /// When figures were last fetched for this series; None = never
    pub last_figure_calc: Option<DateTime<Utc>>,
}

impl AnimeSeries {
    /// Mutable fields as they are currently stored
    pub fn fields(&self) -> SeriesFields {
        SeriesFields {
            image_url: self.image_url.clone(),
            title: self.title.clone(),
        }
    }

    /// Series page on MyAnimeList
    pub fn mal_url(&self) -> String {
        format!("https://myanimelist.net/anime/{}", self.mal_id)
    }
}

/// Series fields refreshed from the anime list on every lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesFields {
    pub image_url: Option<String>,
    pub title: Option<String>,
}

/// Cached MyFigureCollection item
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Figure {
    pub id: i64,
    /// MyFigureCollection item id
    pub mfc_id: i64,
    pub barcode: Option<String>,
    pub name: String,
    pub release_date: Option<DateTime<Utc>>,
    /// Price in JPY
    pub price: Option<i64>,
    pub category: Option<i64>,
    pub last_updated: DateTime<Utc>,
}

impl Figure {
    /// Mutable fields as they are currently stored
    pub fn fields(&self) -> FigureFields {
        FigureFields {
            barcode: self.barcode.clone(),
            name: self.name.clone(),
            release_date: self.release_date,
            price: self.price,
            category: self.category,
        }
    }

    /// Thumbnail URL from a template containing `{mfc_id}`
    pub fn image_url(&self, template: &str) -> String {
        template.replace("{mfc_id}", &self.mfc_id.to_string())
    }

    /// Item page on MyFigureCollection
    pub fn mfc_url(&self) -> String {
        format!("https://myfigurecollection.net/item/{}", self.mfc_id)
    }

    /// Name shortened to `TRUNCATE_NAME_LEN` characters, ellipsis included
    pub fn truncated_name(&self) -> String {
        if self.name.chars().count() > TRUNCATE_NAME_LEN {
            let head: String = self.name.chars().take(TRUNCATE_NAME_LEN - 3).collect();
            format!("{}...", head)
        } else {
            self.name.clone()
        }
    }
}

/// Figure fields refreshed from every search result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FigureFields {
    pub barcode: Option<String>,
    pub name: String,
    pub release_date: Option<DateTime<Utc>>,
    pub price: Option<i64>,
    pub category: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figure_named(name: &str) -> Figure {
        Figure {
            id: 1,
            mfc_id: 12345,
            barcode: None,
            name: name.to_string(),
            release_date: None,
            price: None,
            category: None,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_short_name_not_truncated() {
        let figure = figure_named("Asuka Langley Soryu");
        assert_eq!(figure.truncated_name(), "Asuka Langley Soryu");
    }

    #[test]
    fn test_name_at_limit_not_truncated() {
        let name = "x".repeat(TRUNCATE_NAME_LEN);
        assert_eq!(figure_named(&name).truncated_name(), name);
    }

    #[test]
    fn test_long_name_truncated_with_ellipsis() {
        let name = "y".repeat(TRUNCATE_NAME_LEN + 1);
        let truncated = figure_named(&name).truncated_name();
        assert_eq!(truncated.chars().count(), TRUNCATE_NAME_LEN);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncation_respects_multibyte_characters() {
        let name = "初音ミク".repeat(20);
        let truncated = figure_named(&name).truncated_name();
        assert_eq!(truncated.chars().count(), TRUNCATE_NAME_LEN);
        assert!(truncated.starts_with("初音ミク"));
    }

    #[test]
    fn test_image_url_from_template() {
        let figure = figure_named("Saber");
        assert_eq!(
            figure.image_url("http://s1.tsuki-board.net/pics/figure/{mfc_id}.jpg"),
            "http://s1.tsuki-board.net/pics/figure/12345.jpg"
        );
    }

    #[test]
    fn test_external_urls() {
        let figure = figure_named("Saber");
        assert_eq!(figure.mfc_url(), "https://myfigurecollection.net/item/12345");
    }
}
