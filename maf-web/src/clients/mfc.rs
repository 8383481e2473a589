//! MyFigureCollection search client
//!
//! Fetches `api.php?mode=search&keywords={title}`. Each `<item>` carries a
//! root type (`0` = Figures), a category, and the item data:
//!
//! ```xml
//! <search>
//!   <item>
//!     <root><id>0</id><name>Figures</name></root>
//!     <category><id>1</id><name>Prepainted</name></category>
//!     <data>
//!       <id>12345</id>
//!       <barcode>4580416920385</barcode>
//!       <name>Asuka Langley Soryu 1/7</name>
//!       <release_date>2015-06-00</release_date>
//!       <price>12800</price>
//!     </data>
//!   </item>
//! </search>
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use maf_common::config::EndpointConfig;
use serde::Deserialize;
use std::sync::Arc;

use super::{
    build_http_client, fetch_text, non_blank, parse_int, ClientError, FigureSource, RateLimiter,
};
use crate::db::FigureFields;

/// Root type id of figure items; other roots are goods, media, etc.
pub const FIGURE_ROOT_ID: i64 = 0;

/// One figure-type search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureRecord {
    /// MyFigureCollection item id
    pub mfc_id: i64,
    pub fields: FigureFields,
}

#[derive(Debug, Deserialize)]
struct RawSearch {
    #[serde(default)]
    item: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    root: Option<RawRef>,
    #[serde(default)]
    category: Option<RawRef>,
    #[serde(default)]
    data: Option<RawData>,
}

#[derive(Debug, Deserialize)]
struct RawRef {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawData {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    barcode: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    price: Option<String>,
}

/// Normalize an MFC release date
///
/// Unknown day or month components are sent as `00` and become `01`; a date
/// with an unknown year (`0000`) is treated as absent.
pub fn normalize_release_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    if raw.contains("0000") {
        return None;
    }

    let normalized = raw.replace("-00", "-01");
    let date = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", normalized), "%Y-%m-%d"));

    match date {
        Ok(date) => date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
        Err(_) => {
            tracing::debug!(release_date = %raw, "Ignoring unparseable release date");
            None
        }
    }
}

/// Parse a search response, keeping only figure-type items
pub fn parse_figure_search(xml: &str) -> Result<Vec<FigureRecord>, ClientError> {
    let raw: RawSearch =
        quick_xml::de::from_str(xml).map_err(|e| ClientError::Parse(e.to_string()))?;

    let mut records = Vec::new();
    for item in raw.item {
        let root_id = item.root.as_ref().and_then(|r| parse_int(r.id.as_deref()));
        if root_id != Some(FIGURE_ROOT_ID) {
            continue;
        }

        let Some(data) = item.data else {
            continue;
        };
        let Some(mfc_id) = parse_int(data.id.as_deref()) else {
            tracing::warn!(name = ?data.name, "Skipping figure without a valid item id");
            continue;
        };

        records.push(FigureRecord {
            mfc_id,
            fields: FigureFields {
                barcode: non_blank(data.barcode),
                name: non_blank(data.name).unwrap_or_default(),
                release_date: normalize_release_date(data.release_date.as_deref()),
                price: parse_int(data.price.as_deref()),
                category: item.category.and_then(|c| parse_int(c.id.as_deref())),
            },
        });
    }

    Ok(records)
}

/// MyFigureCollection API client
pub struct MfcClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
}

impl MfcClient {
    pub fn new(
        config: &EndpointConfig,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            http_client: build_http_client(config)?,
            base_url: config.figure_search_url.clone(),
            rate_limiter,
        })
    }

    /// Full request URL for a keyword search
    pub fn search_url(&self, keywords: &str) -> Result<reqwest::Url, ClientError> {
        reqwest::Url::parse_with_params(
            &self.base_url,
            &[("mode", "search"), ("keywords", keywords)],
        )
        .map_err(|e| ClientError::Parse(format!("Invalid figure search URL: {}", e)))
    }
}

#[async_trait]
impl FigureSource for MfcClient {
    async fn search_figures(&self, keywords: &str) -> Result<Vec<FigureRecord>, ClientError> {
        let url = self.search_url(keywords)?;

        self.rate_limiter.wait().await;
        tracing::debug!(keywords = %keywords, url = %url, "Querying MyFigureCollection");

        let body = fetch_text(&self.http_client, url).await?;
        let records = parse_figure_search(&body)?;

        tracing::debug!(keywords = %keywords, figures = records.len(), "Figure search complete");
        Ok(records)
    }
}
