//! Landing page

use axum::{extract::Query, response::Html};
use serde::Deserialize;

use super::templates::render_index;

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    /// Message from a failed lookup redirect
    #[serde(default)]
    pub error: Option<String>,
}

/// GET /
pub async fn index_page(Query(query): Query<IndexQuery>) -> Html<String> {
    Html(render_index(query.error.as_deref()))
}
