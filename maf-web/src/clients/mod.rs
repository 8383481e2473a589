//! Third-party API clients
//!
//! Two XML-over-HTTP sources feed the figure cache:
//! - MyAnimeList list export (`mal`)
//! - MyFigureCollection search (`mfc`)
//!
//! Both sit behind traits so the lookup service can be exercised without
//! network access.

pub mod mal;
pub mod mfc;

pub use mal::{AnimeEntry, AnimeListDocument, MalClient, WatchStatus};
pub use mfc::{FigureRecord, MfcClient};

use async_trait::async_trait;
use maf_common::config::EndpointConfig;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

/// Client errors shared by both APIs
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Status(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Source of a user's anime list
#[async_trait]
pub trait AnimeListSource: Send + Sync {
    /// Fetch and parse the full list for `user`
    ///
    /// A list-level `<error>` is reported inside the document, not as `Err`.
    async fn fetch_anime_list(&self, user: &str) -> Result<AnimeListDocument, ClientError>;
}

/// Source of figure search results
#[async_trait]
pub trait FigureSource: Send + Sync {
    /// Search figures by keywords, returning only figure-type items
    async fn search_figures(&self, keywords: &str) -> Result<Vec<FigureRecord>, ClientError>;
}

/// Rate limiter enforcing a minimum interval between requests
///
/// One instance is shared by both API clients, so a batch refresh that
/// alternates list and figure requests still sends at most one request per
/// interval.
pub struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Limiter with the configured minimum spacing
    pub fn from_config(config: &EndpointConfig) -> Self {
        Self::new(config.min_request_interval_ms)
    }

    /// Wait if necessary to comply with rate limit
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Build the shared reqwest client from endpoint settings
pub(crate) fn build_http_client(config: &EndpointConfig) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| ClientError::Network(e.to_string()))
}

/// GET `url` and return the body, mapping transport and status failures
pub(crate) async fn fetch_text(
    http_client: &reqwest::Client,
    url: reqwest::Url,
) -> Result<String, ClientError> {
    let response = http_client
        .get(url)
        .send()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status(status.as_u16(), body));
    }

    response
        .text()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))
}

/// Text content of an optional XML element, with blank treated as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Integer content of an optional XML element
pub(crate) fn parse_int(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(1000);
        assert_eq!(limiter.min_interval, Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_rate_limiter_timing() {
        let limiter = RateLimiter::new(200);

        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_millis(100), "First request should be immediate");

        let start = Instant::now();
        limiter.wait().await;
        assert!(
            start.elapsed() >= Duration::from_millis(150),
            "Second request should wait, got {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn test_limiter_shared_across_clients() {
        let config = EndpointConfig {
            min_request_interval_ms: 200,
            ..EndpointConfig::default()
        };
        let limiter = Arc::new(RateLimiter::from_config(&config));
        let _mal = MalClient::new(&config, limiter.clone()).unwrap();
        let _mfc = MfcClient::new(&config, limiter.clone()).unwrap();
        assert_eq!(Arc::strong_count(&limiter), 3);

        // A figure request right after a list request still waits
        let list_side = limiter.clone();
        let figure_side = limiter.clone();
        list_side.wait().await;
        let start = Instant::now();
        figure_side.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(150));
    }

    #[test]
    fn test_client_creation() {
        let client = build_http_client(&EndpointConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(Some(" abc ".to_string())), Some("abc".to_string()));
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int(Some("12800")), Some(12800));
        assert_eq!(parse_int(Some(" 7 ")), Some(7));
        assert_eq!(parse_int(Some("")), None);
        assert_eq!(parse_int(Some("n/a")), None);
        assert_eq!(parse_int(None), None);
    }
}
