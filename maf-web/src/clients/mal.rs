//! MyAnimeList list export client
//!
//! Fetches `malappinfo.php?u={user}&status=all&type=anime`, an XML document
//! shaped like:
//!
//! ```xml
//! <myanimelist>
//!   <myinfo>...</myinfo>
//!   <anime>
//!     <series_animedb_id>1</series_animedb_id>
//!     <series_title>Cowboy Bebop</series_title>
//!     <series_image>https://.../1.jpg</series_image>
//!     <my_status>2</my_status>
//!     <my_last_updated>1449622800</my_last_updated>
//!   </anime>
//! </myanimelist>
//! ```
//!
//! Unknown users produce `<myanimelist><error>...</error></myanimelist>`.

use async_trait::async_trait;
use maf_common::config::EndpointConfig;
use serde::Deserialize;
use std::sync::Arc;

use super::{
    build_http_client, fetch_text, non_blank, parse_int, AnimeListSource, ClientError,
    RateLimiter,
};

/// A user's progress on a series, as coded by the list export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStatus {
    Watching,
    Completed,
    OnHold,
    Dropped,
    PlanToWatch,
    Other(i64),
}

impl WatchStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => WatchStatus::Watching,
            2 => WatchStatus::Completed,
            3 => WatchStatus::OnHold,
            4 => WatchStatus::Dropped,
            6 => WatchStatus::PlanToWatch,
            other => WatchStatus::Other(other),
        }
    }
}

/// One series entry from a user's list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimeEntry {
    /// MyAnimeList series id
    pub mal_id: i64,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub status: WatchStatus,
    /// Unix timestamp of the user's last edit to this entry (0 if absent)
    pub last_updated: i64,
}

/// Parsed list export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimeListDocument {
    /// Error message reported by the API in place of a list
    pub error: Option<String>,
    pub entries: Vec<AnimeEntry>,
}

#[derive(Debug, Deserialize)]
struct RawAnimeList {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    anime: Vec<RawAnime>,
}

#[derive(Debug, Deserialize)]
struct RawAnime {
    #[serde(default)]
    series_animedb_id: Option<String>,
    #[serde(default)]
    series_title: Option<String>,
    #[serde(default)]
    series_image: Option<String>,
    #[serde(default)]
    my_status: Option<String>,
    #[serde(default)]
    my_last_updated: Option<String>,
}

/// Parse a list export document
///
/// Entries without a numeric series id are dropped.
pub fn parse_anime_list(xml: &str) -> Result<AnimeListDocument, ClientError> {
    let raw: RawAnimeList =
        quick_xml::de::from_str(xml).map_err(|e| ClientError::Parse(e.to_string()))?;

    if let Some(message) = raw.error {
        let message = message.trim().to_string();
        return Ok(AnimeListDocument {
            error: Some(if message.is_empty() {
                "unknown error".to_string()
            } else {
                message
            }),
            entries: Vec::new(),
        });
    }

    let mut entries = Vec::with_capacity(raw.anime.len());
    for anime in raw.anime {
        let Some(mal_id) = parse_int(anime.series_animedb_id.as_deref()) else {
            tracing::warn!(
                id = ?anime.series_animedb_id,
                title = ?anime.series_title,
                "Skipping anime entry without a valid series id"
            );
            continue;
        };

        entries.push(AnimeEntry {
            mal_id,
            title: non_blank(anime.series_title),
            image_url: non_blank(anime.series_image),
            status: WatchStatus::from_code(parse_int(anime.my_status.as_deref()).unwrap_or(0)),
            last_updated: parse_int(anime.my_last_updated.as_deref()).unwrap_or(0),
        });
    }

    Ok(AnimeListDocument {
        error: None,
        entries,
    })
}

/// MyAnimeList API client
pub struct MalClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
}

impl MalClient {
    pub fn new(
        config: &EndpointConfig,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            http_client: build_http_client(config)?,
            base_url: config.anime_list_url.clone(),
            rate_limiter,
        })
    }

    /// Full request URL for a user's list
    pub fn list_url(&self, user: &str) -> Result<reqwest::Url, ClientError> {
        reqwest::Url::parse_with_params(
            &self.base_url,
            &[("u", user), ("status", "all"), ("type", "anime")],
        )
        .map_err(|e| ClientError::Parse(format!("Invalid anime list URL: {}", e)))
    }
}

#[async_trait]
impl AnimeListSource for MalClient {
    async fn fetch_anime_list(&self, user: &str) -> Result<AnimeListDocument, ClientError> {
        let url = self.list_url(user)?;

        self.rate_limiter.wait().await;
        tracing::debug!(user = %user, url = %url, "Querying MyAnimeList");

        let body = fetch_text(&self.http_client, url).await?;
        let document = parse_anime_list(&body)?;

        tracing::info!(
            user = %user,
            entries = document.entries.len(),
            error = ?document.error,
            "Retrieved anime list"
        );

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<myanimelist>
  <myinfo>
    <user_id>123</user_id>
    <user_name>spike</user_name>
    <user_watching>1</user_watching>
  </myinfo>
  <anime>
    <series_animedb_id>1</series_animedb_id>
    <series_title>Cowboy Bebop</series_title>
    <series_synonyms>; Cowboy Bebop</series_synonyms>
    <series_image>https://myanimelist.cdn-dena.com/images/anime/4/19644.jpg</series_image>
    <my_status>2</my_status>
    <my_last_updated>1449622800</my_last_updated>
  </anime>
  <anime>
    <series_animedb_id>30</series_animedb_id>
    <series_title>Neon Genesis Evangelion &amp; Friends</series_title>
    <series_image></series_image>
    <my_status>1</my_status>
    <my_last_updated>1449700000</my_last_updated>
  </anime>
  <anime>
    <series_animedb_id></series_animedb_id>
    <series_title>Broken</series_title>
    <my_status>1</my_status>
  </anime>
</myanimelist>"#;

    #[test]
    fn test_parse_list_entries() {
        let document = parse_anime_list(LIST_XML).unwrap();

        assert!(document.error.is_none());
        assert_eq!(document.entries.len(), 2, "Entry without id should be skipped");

        let bebop = &document.entries[0];
        assert_eq!(bebop.mal_id, 1);
        assert_eq!(bebop.title.as_deref(), Some("Cowboy Bebop"));
        assert_eq!(bebop.status, WatchStatus::Completed);
        assert_eq!(bebop.last_updated, 1_449_622_800);
        assert!(bebop.image_url.is_some());

        let eva = &document.entries[1];
        assert_eq!(eva.mal_id, 30);
        assert_eq!(eva.title.as_deref(), Some("Neon Genesis Evangelion & Friends"));
        assert_eq!(eva.status, WatchStatus::Watching);
        assert_eq!(eva.image_url, None, "Empty image element should be absent");
    }

    #[test]
    fn test_parse_error_document() {
        let document =
            parse_anime_list("<myanimelist><error>Invalid username</error></myanimelist>").unwrap();

        assert_eq!(document.error.as_deref(), Some("Invalid username"));
        assert!(document.entries.is_empty());
    }

    #[test]
    fn test_parse_empty_list() {
        let document = parse_anime_list("<myanimelist><myinfo/></myanimelist>").unwrap();
        assert!(document.error.is_none());
        assert!(document.entries.is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_xml() {
        let result = parse_anime_list("<myanimelist><anime></myanimelist>");
        assert!(matches!(result, Err(ClientError::Parse(_))));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(WatchStatus::from_code(1), WatchStatus::Watching);
        assert_eq!(WatchStatus::from_code(2), WatchStatus::Completed);
        assert_eq!(WatchStatus::from_code(3), WatchStatus::OnHold);
        assert_eq!(WatchStatus::from_code(4), WatchStatus::Dropped);
        assert_eq!(WatchStatus::from_code(6), WatchStatus::PlanToWatch);
        assert_eq!(WatchStatus::from_code(5), WatchStatus::Other(5));
    }

    #[test]
    fn test_list_url_encodes_user() {
        let limiter = Arc::new(RateLimiter::new(0));
        let client = MalClient::new(&EndpointConfig::default(), limiter).unwrap();
        let url = client.list_url("some user&x=1").unwrap();

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs[0], ("u".to_string(), "some user&x=1".to_string()));
        assert_eq!(pairs[1], ("status".to_string(), "all".to_string()));
        assert_eq!(pairs[2], ("type".to_string(), "anime".to_string()));
        assert!(url.as_str().starts_with("http://myanimelist.net/malappinfo.php?"));
    }
}
