//! Marketplace order-volume client (Apify listings actor).
//!
//! Runs the scraping actor synchronously and reads its dataset items. Each
//! item carries a display string like `"1,234 sold"`; decoding keeps the
//! digits. A listing without a readable count contributes 0, the
//! aggregate's documented "no data" value for a single listing.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::SourceError;
use crate::sources::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://api.apify.com";
const ACTOR_ID: &str = "piotrv1001~aliexpress-listings-scraper";
const PROVIDER: &str = "order-volume";

/// One dataset item from the actor run.
#[derive(Debug, Deserialize)]
struct RawListingItem {
    #[serde(default, rename = "totalSold")]
    total_sold: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct ActorInput {
    #[serde(rename = "searchUrls")]
    search_urls: Vec<String>,
    #[serde(rename = "maxItems")]
    max_items: u32,
}

/// Client for the order-volume provider.
pub struct OrdersClient {
    client: Client,
    api_token: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl OrdersClient {
    /// Creates a client pointed at the production provider.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_token: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, SourceError> {
        Self::with_base_url(api_token, timeout_secs, max_retries, backoff_base_ms, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SourceError::Api`] if `base_url` is not
    /// a valid URL.
    pub fn with_base_url(
        api_token: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("flipscout/0.1 (product-research)")
            .build()?;

        let base_url = Url::parse(base_url).map_err(|e| SourceError::Api {
            provider: PROVIDER,
            message: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            api_token: api_token.to_owned(),
            base_url,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Fetches per-listing order counts for the top marketplace listings
    /// matching `search_term`.
    ///
    /// # Errors
    ///
    /// Transport errors after retries, unexpected statuses, and body-shape
    /// mismatches.
    pub async fn fetch_order_counts(
        &self,
        search_term: &str,
        max_items: u32,
    ) -> Result<Vec<u64>, SourceError> {
        let url = self.run_url();
        let input = ActorInput {
            search_urls: vec![wholesale_search_url(search_term)],
            max_items,
        };

        let items = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.run_actor(url.clone(), &input)
        })
        .await?;

        let counts: Vec<u64> = items
            .into_iter()
            .map(|item| parse_order_count(item.total_sold.as_deref().unwrap_or_default()))
            .collect();

        tracing::debug!(
            search_term,
            listings = counts.len(),
            "collected order counts"
        );

        Ok(counts)
    }

    async fn run_actor(
        &self,
        url: Url,
        input: &ActorInput,
    ) -> Result<Vec<RawListingItem>, SourceError> {
        let response = self.client.post(url.clone()).json(input).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(SourceError::RateLimited {
                provider: PROVIDER,
                retry_after_secs,
            });
        }

        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
            context: format!("actor dataset items from {url}"),
            source: e,
        })
    }

    fn run_url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("v2/acts/{ACTOR_ID}/run-sync-get-dataset-items"));
        url.query_pairs_mut().append_pair("token", &self.api_token);
        url
    }
}

/// Marketplace wholesale-search URL for a query. Terms are hyphen-joined
/// the way the storefront builds its own search paths.
fn wholesale_search_url(search_term: &str) -> String {
    let slug = search_term.split_whitespace().collect::<Vec<_>>().join("-");
    format!("https://www.aliexpress.us/w/wholesale-{slug}.html")
}

/// Digits-only parse of a display order count. `"1,234 sold"` → 1234;
/// unreadable values count as zero orders.
fn parse_order_count(raw: &str) -> u64 {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}
