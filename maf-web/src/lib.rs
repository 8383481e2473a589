//! maf-web library interface
//!
//! Looks up a MyAnimeList user's watching and recently completed series and
//! shows the matching MyFigureCollection figures. Exposed as a library so the
//! router and lookup service can be driven from integration tests.

pub mod api;
pub mod clients;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::AnimeFigureService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Lookup service backed by the figure cache
    pub service: Arc<AnimeFigureService>,
    /// Figure thumbnail URL template containing `{mfc_id}`
    pub figure_image_url: Arc<str>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: AnimeFigureService, figure_image_url: impl Into<Arc<str>>) -> Self {
        Self {
            service: Arc::new(service),
            figure_image_url: figure_image_url.into(),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::ui_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
