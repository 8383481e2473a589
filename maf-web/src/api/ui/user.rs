//! User lookup and figure page handlers

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::{info, warn};
use url::form_urlencoded;

use super::templates::render_user_page;
use crate::error::ApiResult;
use crate::services::LookupError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LookupForm {
    #[serde(rename = "malLookup", default)]
    pub mal_lookup: String,
}

/// User name from the lookup form input
///
/// Accepts a bare user name or any myanimelist.net URL ending in one
/// (e.g. `https://myanimelist.net/profile/spike`).
pub fn parse_lookup_input(input: &str) -> Option<String> {
    let mut user = input.trim();
    if user.contains("myanimelist.net") {
        user = user
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .trim();
        // A bare site URL names no user
        if user.contains("myanimelist.net") {
            return None;
        }
    }

    if user.is_empty() {
        None
    } else {
        Some(user.to_string())
    }
}

fn encode_component(value: &str) -> String {
    // Form encoding writes spaces as '+', which is literal in a path
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// POST /user
pub async fn user_lookup(Form(form): Form<LookupForm>) -> Redirect {
    match parse_lookup_input(&form.mal_lookup) {
        Some(user) => Redirect::to(&format!("/user/{}", encode_component(&user))),
        None => Redirect::to("/"),
    }
}

/// GET /user/:user_id
///
/// A list-level error (unknown user, private list) sends the visitor back to
/// the landing page with the message shown there.
pub async fn user_page(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Response> {
    match state.service.get_anime_list(&user_id).await {
        Ok(view) => Ok(Html(render_user_page(&view, &state.figure_image_url)).into_response()),
        Err(LookupError::AnimeList(message)) => {
            info!(user = %user_id, error = %message, "Anime list lookup rejected");
            let error = format!("Error looking up {}: {}", user_id, message);
            let location = format!(
                "/?error={}",
                form_urlencoded::byte_serialize(error.as_bytes()).collect::<String>()
            );
            Ok(Redirect::to(&location).into_response())
        }
        Err(e) => {
            warn!(user = %user_id, error = %e, "Anime list lookup failed");
            Err(e.into())
        }
    }
}
