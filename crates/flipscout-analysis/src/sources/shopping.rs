//! Shopping-price search client (SerpApi, Google Shopping engine).
//!
//! One GET per marketplace; the query is suffixed with the marketplace
//! keyword to steer results. The decode step keeps the provider's own
//! ranking — rank 0 is its most relevant listing — and tolerates absent or
//! noisy price text per listing.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::SourceError;
use crate::normalize::parse_price;
use crate::sources::retry::retry_with_backoff;
use crate::types::{Marketplace, QuoteSet, ScoredListing};

const DEFAULT_BASE_URL: &str = "https://serpapi.com/search";
const PROVIDER: &str = "shopping-search";

/// How many raw results to request per search; only the top few feed the
/// price estimate.
const RESULT_FETCH_COUNT: u32 = 15;

/// Top-level provider response. `shopping_results` is absent entirely when
/// the engine found nothing.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    shopping_results: Vec<RawShoppingResult>,
    #[serde(default)]
    error: Option<String>,
}

/// One raw listing. Prices arrive as display strings (`"$12.99"`,
/// `"1,299.00"`) or not at all.
#[derive(Debug, Deserialize)]
struct RawShoppingResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    price: Option<String>,
}

/// Client for the shopping-search provider.
///
/// Use [`ShoppingClient::new`] for production or
/// [`ShoppingClient::with_base_url`] to point at a mock server in tests.
pub struct ShoppingClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ShoppingClient {
    /// Creates a client pointed at the production provider.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, SourceError> {
        Self::with_base_url(api_key, timeout_secs, max_retries, backoff_base_ms, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SourceError::Api`] if `base_url` is not
    /// a valid URL.
    pub fn with_base_url(
        api_key: &str,
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
            api_key: api_key.to_owned(),
            base_url,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Searches one marketplace for price quotes matching `query`.
    ///
    /// Returns up to `quote_limit` listings in provider order. Listings
    /// whose price text does not parse stay in the set (they count toward
    /// match totals) with `price: None` so the estimators skip them.
    ///
    /// # Errors
    ///
    /// - [`SourceError::RateLimited`] — HTTP 429 after all retries.
    /// - [`SourceError::UnexpectedStatus`] — any other non-2xx status.
    /// - [`SourceError::Api`] — the provider reported an engine error.
    /// - [`SourceError::Deserialize`] — the body is not the expected shape.
    /// - [`SourceError::Http`] — network failure after all retries.
    pub async fn search_quotes(
        &self,
        query: &str,
        marketplace: Marketplace,
        quote_limit: usize,
    ) -> Result<QuoteSet, SourceError> {
        let search_query = format!("{query} {}", marketplace.query_suffix());
        let url = self.search_url(&search_query);

        let response = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.fetch_page(url.clone())
        })
        .await?;

        if let Some(message) = response.error {
            return Err(SourceError::Api {
                provider: PROVIDER,
                message,
            });
        }

        let listings: Vec<ScoredListing> = response
            .shopping_results
            .into_iter()
            .take(quote_limit)
            .map(|raw| ScoredListing {
                title: raw.title.unwrap_or_default(),
                price: raw.price.as_deref().and_then(parse_price),
                relevance: 1.0,
            })
            .collect();

        tracing::debug!(
            query = search_query,
            marketplace = %marketplace,
            listings = listings.len(),
            "collected shopping quotes"
        );

        Ok(QuoteSet { listings })
    }

    async fn fetch_page(&self, url: Url) -> Result<SearchResponse, SourceError> {
        let response = self.client.get(url.clone()).send().await?;
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
            context: format!("shopping search response from {url}"),
            source: e,
        })
    }

    fn search_url(&self, query: &str) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api_key", &self.api_key);
            pairs.append_pair("engine", "google_shopping");
            pairs.append_pair("q", query);
            pairs.append_pair("num", &RESULT_FETCH_COUNT.to_string());
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> ShoppingClient {
        ShoppingClient::with_base_url("test-key", 30, 0, 0, base_url)
            .expect("client construction should not fail")
    }

    #[test]
    fn search_url_carries_engine_and_query() {
        let client = test_client("https://serpapi.com/search");
        let url = client.search_url("uv sterilizer amazon");
        assert_eq!(
            url.as_str(),
            "https://serpapi.com/search?api_key=test-key&engine=google_shopping&q=uv+sterilizer+amazon&num=15"
        );
    }

    #[test]
    fn decode_tolerates_missing_price() {
        let body = serde_json::json!({
            "shopping_results": [
                { "title": "UV Sterilizer", "price": "$12.99" },
                { "title": "No price listed" }
            ]
        });
        let parsed: SearchResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.shopping_results.len(), 2);
        assert!(parsed.shopping_results[1].price.is_none());
    }

    #[test]
    fn decode_tolerates_missing_results_key() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.shopping_results.is_empty());
        assert!(parsed.error.is_none());
    }
}
