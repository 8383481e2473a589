//! UI routes - server-rendered HTML pages
//!
//! - `/` landing page with the lookup form
//! - `/user` form target, redirects to the user page
//! - `/user/:user_id` figure page for one MyAnimeList user

use axum::{
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use crate::AppState;

mod index;
pub mod templates;
mod user;

pub use user::parse_lookup_input;

const MAF_CSS: &str = include_str!("../../../static/maf.css");

/// GET /static/maf.css
async fn serve_maf_css() -> impl IntoResponse {
    ([("content-type", "text/css")], MAF_CSS)
}

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index::index_page))
        .route("/user", post(user::user_lookup))
        .route("/user/", post(user::user_lookup))
        .route("/user/:user_id", get(user::user_page))
        .route("/user/:user_id/", get(user::user_page))
        .route("/static/maf.css", get(serve_maf_css))
}
