//! Social post search client (TikAPI).
//!
//! Two retrieval paths: cursor-paginated keyword search (primary) and a
//! hashtag-id lookup (fallback). The decode step converts the provider's
//! loosely-shaped payloads into [`RawPost`] records; entries without an
//! `item` object are skipped per record rather than failing the page.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::SourceError;
use crate::sources::retry::retry_with_backoff;
use crate::types::RawPost;

const DEFAULT_BASE_URL: &str = "https://api.tikapi.io";
const PROVIDER: &str = "social-search";

/// Maximum posts the hashtag endpoint returns for an id lookup.
const HASHTAG_POST_COUNT: u32 = 30;

/// One page of keyword-search results plus the continuation cursor, when
/// the provider has more.
#[derive(Debug)]
pub struct SearchPage {
    pub posts: Vec<RawPost>,
    pub next_cursor: Option<String>,
}

/// Keyword search envelope. Result arrays have appeared under both `data`
/// and `itemList` across provider versions; decode accepts either.
#[derive(Debug, Deserialize)]
struct GeneralSearchResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Vec<PostEnvelope>>,
    #[serde(default, rename = "itemList")]
    item_list: Option<Vec<PostEnvelope>>,
    #[serde(default, rename = "nextCursor")]
    next_cursor: Option<String>,
}

/// Hashtag lookup envelope (`?name=`) carrying the numeric challenge id.
#[derive(Debug, Deserialize)]
struct HashtagLookupResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "challengeInfo")]
    challenge_info: Option<ChallengeInfo>,
}

#[derive(Debug, Deserialize)]
struct ChallengeInfo {
    #[serde(default)]
    challenge: Option<Challenge>,
}

#[derive(Debug, Deserialize)]
struct Challenge {
    #[serde(default)]
    id: Option<String>,
}

/// Hashtag post-list envelope (`?id=`).
#[derive(Debug, Deserialize)]
struct HashtagPostsResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "itemList")]
    item_list: Option<Vec<PostEnvelope>>,
}

#[derive(Debug, Deserialize)]
struct PostEnvelope {
    #[serde(default)]
    item: Option<PostItem>,
}

#[derive(Debug, Deserialize)]
struct PostItem {
    #[serde(default, rename = "createTime")]
    create_time: Option<i64>,
    #[serde(default)]
    stats: Option<PostStats>,
}

#[derive(Debug, Default, Deserialize)]
struct PostStats {
    #[serde(default, rename = "diggCount")]
    digg_count: u64,
    #[serde(default, rename = "commentCount")]
    comment_count: u64,
    #[serde(default, rename = "shareCount")]
    share_count: u64,
}

fn decode_post(envelope: PostEnvelope) -> Option<RawPost> {
    let item = envelope.item?;
    let stats = item.stats.unwrap_or_default();
    Some(RawPost {
        created_at_epoch_seconds: item.create_time,
        likes: stats.digg_count,
        comments: stats.comment_count,
        shares: stats.share_count,
    })
}

/// Client for the social post search provider.
pub struct SocialClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl SocialClient {
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

    /// Fetches one page of keyword-search results.
    ///
    /// Pass the cursor from the previous page's [`SearchPage::next_cursor`]
    /// to continue; `None` fetches the first page.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`ShoppingClient::search_quotes`]: transport errors
    /// after retries, unexpected statuses, provider-reported errors, and
    /// body-shape mismatches.
    ///
    /// [`ShoppingClient::search_quotes`]: crate::sources::ShoppingClient::search_quotes
    pub async fn search_posts(
        &self,
        query: &str,
        count: u32,
        cursor: Option<&str>,
    ) -> Result<SearchPage, SourceError> {
        let mut url = self.endpoint("public/search/general");
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", query);
            pairs.append_pair("count", &count.to_string());
            if let Some(cursor) = cursor {
                pairs.append_pair("nextCursor", cursor);
            }
        }

        let response: GeneralSearchResponse =
            retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                self.fetch_json(url.clone())
            })
            .await?;

        check_provider_status(response.status.as_deref(), response.message)?;

        let envelopes = response.data.or(response.item_list).unwrap_or_default();
        let posts: Vec<RawPost> = envelopes.into_iter().filter_map(decode_post).collect();

        // A cursor with no new records means the stream is exhausted.
        let next_cursor = response.next_cursor.filter(|_| !posts.is_empty());

        tracing::debug!(
            query,
            posts = posts.len(),
            has_cursor = next_cursor.is_some(),
            "fetched social search page"
        );

        Ok(SearchPage { posts, next_cursor })
    }

    /// Resolves a hashtag name to its provider id.
    ///
    /// Returns `Ok(None)` when the hashtag does not exist (404 or an empty
    /// challenge object) — that outcome is "no data", not an error.
    ///
    /// # Errors
    ///
    /// Any failure other than not-found is surfaced, terminal for the
    /// caller's metric.
    pub async fn lookup_hashtag_id(&self, name: &str) -> Result<Option<String>, SourceError> {
        let mut url = self.endpoint("public/hashtag");
        url.query_pairs_mut().append_pair("name", name);

        let response = self.client.get(url.clone()).header("X-API-KEY", &self.api_key).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let parsed: HashtagLookupResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
                context: format!("hashtag lookup for \"{name}\""),
                source: e,
            })?;

        check_provider_status(parsed.status.as_deref(), parsed.message)?;

        Ok(parsed
            .challenge_info
            .and_then(|info| info.challenge)
            .and_then(|challenge| challenge.id))
    }

    /// Fetches posts for a resolved hashtag id.
    ///
    /// # Errors
    ///
    /// Transport errors after retries, unexpected statuses,
    /// provider-reported errors, and body-shape mismatches.
    pub async fn posts_by_hashtag(&self, hashtag_id: &str) -> Result<Vec<RawPost>, SourceError> {
        let mut url = self.endpoint("public/hashtag");
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("id", hashtag_id);
            pairs.append_pair("count", &HASHTAG_POST_COUNT.to_string());
        }

        let response: HashtagPostsResponse =
            retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                self.fetch_json(url.clone())
            })
            .await?;

        check_provider_status(response.status.as_deref(), response.message)?;

        let posts: Vec<RawPost> = response
            .item_list
            .unwrap_or_default()
            .into_iter()
            .filter_map(decode_post)
            .collect();

        tracing::debug!(hashtag_id, posts = posts.len(), "fetched hashtag posts");

        Ok(posts)
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, SourceError> {
        let response = self
            .client
            .get(url.clone())
            .header("X-API-KEY", &self.api_key)
            .send()
            .await?;
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
            context: format!("social search response from {url}"),
            source: e,
        })
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url
    }
}

fn check_provider_status(status: Option<&str>, message: Option<String>) -> Result<(), SourceError> {
    if status == Some("error") {
        return Err(SourceError::Api {
            provider: PROVIDER,
            message: message.unwrap_or_else(|| "unknown provider error".to_owned()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_post_requires_item_object() {
        let envelope: PostEnvelope = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(decode_post(envelope).is_none());
    }

    #[test]
    fn decode_post_defaults_missing_stats_to_zero() {
        let envelope: PostEnvelope = serde_json::from_value(serde_json::json!({
            "item": { "createTime": 1_700_000_000 }
        }))
        .unwrap();
        let post = decode_post(envelope).unwrap();
        assert_eq!(post.created_at_epoch_seconds, Some(1_700_000_000));
        assert_eq!(post.likes, 0);
        assert_eq!(post.comments, 0);
        assert_eq!(post.shares, 0);
    }

    #[test]
    fn decode_post_reads_engagement_counters() {
        let envelope: PostEnvelope = serde_json::from_value(serde_json::json!({
            "item": {
                "createTime": 1_700_000_000,
                "stats": { "diggCount": 120, "commentCount": 14, "shareCount": 3 }
            }
        }))
        .unwrap();
        let post = decode_post(envelope).unwrap();
        assert_eq!(post.likes, 120);
        assert_eq!(post.comments, 14);
        assert_eq!(post.shares, 3);
    }

    #[test]
    fn search_response_accepts_either_result_key() {
        let with_data: GeneralSearchResponse = serde_json::from_value(serde_json::json!({
            "data": [{ "item": { "createTime": 1 } }],
            "nextCursor": "abc"
        }))
        .unwrap();
        assert_eq!(with_data.data.as_ref().map(Vec::len), Some(1));

        let with_item_list: GeneralSearchResponse = serde_json::from_value(serde_json::json!({
            "itemList": [{ "item": { "createTime": 1 } }]
        }))
        .unwrap();
        assert_eq!(with_item_list.item_list.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn provider_status_error_maps_to_api_error() {
        let result = check_provider_status(Some("error"), Some("invalid key".to_owned()));
        assert!(matches!(result, Err(SourceError::Api { .. })));
        assert!(check_provider_status(Some("success"), None).is_ok());
        assert!(check_provider_status(None, None).is_ok());
    }
}
