//! Lookup services
//!
//! Reconciles remote anime lists and figure searches with the local cache.

pub mod anime_figures;

pub use anime_figures::{
    needs_refresh, sanitize_title, select_entries, AnimeFigureService, AnimeListView, ListSelection,
    LookupSettings, SeriesWithFigures,
};

use thiserror::Error;

use crate::clients::ClientError;

/// Errors raised while building a user's figure page
#[derive(Debug, Error)]
pub enum LookupError {
    /// The list API reported an error for this user (user-visible)
    #[error("{0}")]
    AnimeList(String),

    /// Remote request failed or returned garbage
    #[error("Remote API error: {0}")]
    Client(#[from] ClientError),

    /// Cache access failed
    #[error(transparent)]
    Common(#[from] maf_common::Error),
}
