//! Product analysis orchestration.
//!
//! Drives the three metric paths — resale value, social engagement, order
//! volume — for one query and assembles the final [`ProductMetrics`]. The
//! paths are independent: they run concurrently, and a failure in one is
//! logged and degrades that section to `None` without blocking the others.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

use flipscout_core::AppConfig;

use crate::confidence::confidence_score;
use crate::distill::{distill_social_query, is_searchable};
use crate::engagement::{summarize, Granularity};
use crate::error::SourceError;
use crate::pricing::representative_price;
use crate::sources::{OrdersClient, ShoppingClient, SocialClient};
use crate::types::{
    EngagementWindows, Marketplace, MatchDetails, OrderVolume, ProductInsight, ProductMetrics,
    QuoteSet, RawPost, ResaleMetrics,
};
use crate::volume::classify_order_volume;

/// Orchestration knobs, split from [`AppConfig`] so tests can drive the
/// engine against mock servers without a full configuration.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub shopping_quote_limit: usize,
    pub orders_listing_limit: u32,
    pub social_page_size: u32,
    pub social_max_pages: usize,
    pub social_max_posts: usize,
    pub social_inter_page_delay_ms: u64,
}

impl EngineOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            shopping_quote_limit: config.shopping_quote_limit,
            orders_listing_limit: config.orders_listing_limit,
            social_page_size: config.social_page_size,
            social_max_pages: config.social_max_pages,
            social_max_posts: config.social_max_posts,
            social_inter_page_delay_ms: config.social_inter_page_delay_ms,
        }
    }
}

/// The analysis engine: provider clients plus orchestration limits.
///
/// Request handlers share one engine; all per-request state lives on the
/// stack of [`AnalysisEngine::analyze`].
pub struct AnalysisEngine {
    shopping: ShoppingClient,
    social: SocialClient,
    orders: OrdersClient,
    options: EngineOptions,
}

impl AnalysisEngine {
    /// Builds the engine and its provider clients from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if an underlying HTTP client cannot be
    /// constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, SourceError> {
        let shopping = ShoppingClient::new(
            &config.shopping_api_key,
            config.request_timeout_secs,
            config.max_retries,
            config.retry_backoff_base_ms,
        )?;
        let social = SocialClient::new(
            &config.social_api_key,
            config.request_timeout_secs,
            config.max_retries,
            config.retry_backoff_base_ms,
        )?;
        let orders = OrdersClient::new(
            &config.orders_api_token,
            config.request_timeout_secs,
            config.max_retries,
            config.retry_backoff_base_ms,
        )?;

        Ok(Self::with_clients(
            shopping,
            social,
            orders,
            EngineOptions::from_config(config),
        ))
    }

    /// Builds an engine from pre-constructed clients (mock servers in
    /// tests).
    #[must_use]
    pub fn with_clients(
        shopping: ShoppingClient,
        social: SocialClient,
        orders: OrdersClient,
        options: EngineOptions,
    ) -> Self {
        Self {
            shopping,
            social,
            orders,
            options,
        }
    }

    /// Runs the full analysis for one product insight.
    ///
    /// The three metric paths are issued concurrently and awaited before
    /// assembly. Each failed or empty section is reported as `None`; the
    /// call itself never fails.
    pub async fn analyze(&self, insight: &ProductInsight) -> ProductMetrics {
        let (resale_value, engagement, order_volume) = tokio::join!(
            self.resale_section(&insight.search_term),
            self.engagement_section(&insight.social_search_term),
            self.volume_section(&insight.search_term),
        );

        ProductMetrics {
            resale_value,
            engagement,
            order_volume,
        }
    }

    async fn resale_section(&self, query: &str) -> Option<ResaleMetrics> {
        match self.resale_metrics(query).await {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                tracing::warn!(query, error = %e, "resale value search failed");
                None
            }
        }
    }

    async fn engagement_section(&self, description: &str) -> Option<EngagementWindows> {
        match self.engagement_metrics(description, Utc::now()).await {
            Ok(windows) => windows,
            Err(e) => {
                tracing::warn!(description, error = %e, "engagement search failed");
                None
            }
        }
    }

    async fn volume_section(&self, query: &str) -> Option<OrderVolume> {
        match self.order_volume(query).await {
            Ok(volume) => volume,
            Err(e) => {
                tracing::warn!(query, error = %e, "order volume search failed");
                None
            }
        }
    }

    /// Computes the resale aggregate for one query: one quote set per
    /// marketplace, reduced by the biased estimators and scored.
    ///
    /// # Errors
    ///
    /// Propagates [`SourceError`] from the shopping client.
    pub async fn resale_metrics(&self, query: &str) -> Result<ResaleMetrics, SourceError> {
        let supply = self
            .shopping
            .search_quotes(query, Marketplace::AliExpress, self.options.shopping_quote_limit)
            .await?;
        let retail = self
            .shopping
            .search_quotes(query, Marketplace::Amazon, self.options.shopping_quote_limit)
            .await?;

        Ok(assemble_resale(&supply, &retail, &mut rand::rng()))
    }

    /// Computes engagement summaries for one product description.
    ///
    /// The description is distilled into a compact query first. Primary
    /// retrieval is the paginated keyword search; if it yields nothing or
    /// fails, the hashtag lookup runs instead. `Ok(None)` means no usable
    /// data — a weak query, an unknown hashtag, or zero posts.
    ///
    /// # Errors
    ///
    /// Propagates fallback failures other than hashtag-not-found; those are
    /// terminal for this metric only.
    pub async fn engagement_metrics(
        &self,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EngagementWindows>, SourceError> {
        let query = distill_social_query(description);
        if !is_searchable(&query) {
            tracing::warn!(description, "social query too weak, skipping search");
            return Ok(None);
        }

        let posts = match self.collect_search_posts(&query).await {
            Ok(posts) if !posts.is_empty() => posts,
            Ok(_) => {
                tracing::info!(query, "primary social search empty, trying hashtag fallback");
                self.collect_hashtag_posts(&query).await?
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "primary social search failed, trying hashtag fallback");
                self.collect_hashtag_posts(&query).await?
            }
        };

        if posts.is_empty() {
            return Ok(None);
        }

        Ok(Some(EngagementWindows {
            day: summarize(&posts, Granularity::Day, now),
            week: summarize(&posts, Granularity::Week, now),
            monthly: summarize(&posts, Granularity::Month, now),
        }))
    }

    /// Computes the order-volume aggregate for one query. `Ok(None)` when
    /// the marketplace returned no listings.
    ///
    /// # Errors
    ///
    /// Propagates [`SourceError`] from the orders client.
    pub async fn order_volume(&self, query: &str) -> Result<Option<OrderVolume>, SourceError> {
        let counts = self
            .orders
            .fetch_order_counts(query, self.options.orders_listing_limit)
            .await?;
        Ok(classify_order_volume(&counts))
    }

    /// Accumulates keyword-search posts across pages.
    ///
    /// Pages are fetched strictly sequentially with the configured delay
    /// between requests (never before the first or after the last page).
    /// Stops at the first of: an empty page or exhausted cursor, the page
    /// ceiling, or the absolute post ceiling.
    async fn collect_search_posts(&self, query: &str) -> Result<Vec<RawPost>, SourceError> {
        let mut all_posts: Vec<RawPost> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut is_first_page = true;
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            if page_count > self.options.social_max_pages {
                break;
            }

            if !is_first_page && self.options.social_inter_page_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.options.social_inter_page_delay_ms))
                    .await;
            }
            is_first_page = false;

            let page = self
                .social
                .search_posts(query, self.options.social_page_size, cursor.as_deref())
                .await?;

            if page.posts.is_empty() {
                break;
            }
            all_posts.extend(page.posts);

            if all_posts.len() >= self.options.social_max_posts {
                all_posts.truncate(self.options.social_max_posts);
                break;
            }

            cursor = page.next_cursor;
            if cursor.is_none() {
                break;
            }
        }

        tracing::debug!(
            query,
            posts = all_posts.len(),
            pages = page_count,
            "social pagination complete"
        );

        Ok(all_posts)
    }

    /// Hashtag fallback: resolve the query to a hashtag id, then fetch its
    /// posts. An unknown hashtag yields an empty list, not an error.
    async fn collect_hashtag_posts(&self, query: &str) -> Result<Vec<RawPost>, SourceError> {
        let Some(hashtag_id) = self.social.lookup_hashtag_id(query).await? else {
            tracing::info!(query, "no matching hashtag, engagement has no data");
            return Ok(Vec::new());
        };
        self.social.posts_by_hashtag(&hashtag_id).await
    }
}

/// Assembles the resale aggregate from two scored quote sets.
///
/// Pure except for the bounded margin perturbation, which draws from `rng`
/// so callers can pin it down in tests.
pub fn assemble_resale<R: Rng>(supply: &QuoteSet, retail: &QuoteSet, rng: &mut R) -> ResaleMetrics {
    let ali_express_average = representative_price(
        &supply.usable_prices(),
        Marketplace::AliExpress.bias(),
    );
    let amazon_average =
        representative_price(&retail.usable_prices(), Marketplace::Amazon.bias());

    let potential_profit = amazon_average - ali_express_average;
    let raw_margin = if amazon_average > 0.0 {
        potential_profit / amazon_average * 100.0
    } else {
        0.0
    };

    ResaleMetrics {
        ali_express_average,
        amazon_average,
        potential_profit,
        profit_margin: jittered_margin(raw_margin, rng),
        confidence: confidence_score(supply, retail),
        match_details: MatchDetails {
            ali_express_matches: supply.len(),
            amazon_matches: retail.len(),
            ali_express_top_score: supply.top_relevance(),
            amazon_top_score: retail.top_relevance(),
        },
    }
}

/// Perturbs a published margin by at most ±5% of itself and clamps the
/// result to `[0, 100]`, so repeated identical queries don't pin to a
/// static value.
fn jittered_margin<R: Rng>(margin: f64, rng: &mut R) -> f64 {
    let variation = rng.random_range(-0.05..0.05);
    (margin * (1.0 + variation)).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScoredListing;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quotes(prices: &[f64]) -> QuoteSet {
        QuoteSet {
            listings: prices
                .iter()
                .map(|&p| ScoredListing {
                    title: format!("listing at {p}"),
                    price: Some(p),
                    relevance: 1.0,
                })
                .collect(),
        }
    }

    #[test]
    fn profitable_spread_reports_positive_profit() {
        let supply = quotes(&[5.0, 6.0, 7.0]);
        let retail = quotes(&[40.0, 45.0, 50.0]);
        let mut rng = StdRng::seed_from_u64(7);

        let metrics = assemble_resale(&supply, &retail, &mut rng);

        assert!(metrics.ali_express_average > 0.0);
        assert!(metrics.amazon_average > metrics.ali_express_average);
        assert!(
            (metrics.potential_profit - (metrics.amazon_average - metrics.ali_express_average))
                .abs()
                < 1e-9
        );
        assert!(metrics.potential_profit > 0.0);
        assert!((0.0..=100.0).contains(&metrics.profit_margin));
        assert!((0.0..=1.0).contains(&metrics.confidence));
        assert_eq!(metrics.match_details.ali_express_matches, 3);
        assert_eq!(metrics.match_details.amazon_matches, 3);
    }

    #[test]
    fn empty_quote_sets_degrade_without_panicking() {
        let mut rng = StdRng::seed_from_u64(7);
        let metrics = assemble_resale(&QuoteSet::default(), &QuoteSet::default(), &mut rng);

        assert_eq!(metrics.ali_express_average, 0.0);
        assert_eq!(metrics.amazon_average, 0.0);
        assert_eq!(metrics.potential_profit, 0.0);
        assert_eq!(metrics.profit_margin, 0.0);
        assert_eq!(metrics.confidence, 0.0);
        assert_eq!(metrics.match_details.ali_express_top_score, 0.0);
    }

    #[test]
    fn margin_jitter_stays_within_five_percent() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let jittered = jittered_margin(50.0, &mut rng);
            assert!(
                (47.5..=52.5).contains(&jittered),
                "jittered margin {jittered} outside +/-5% band"
            );
        }
    }

    #[test]
    fn margin_jitter_clamps_to_percentage_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let high = jittered_margin(100.0, &mut rng);
            assert!(high <= 100.0, "margin {high} exceeded 100");
            let low = jittered_margin(-10.0, &mut rng);
            assert_eq!(low, 0.0, "negative margins must clamp to 0");
        }
    }

    #[test]
    fn supply_priced_above_retail_reports_negative_profit_but_zero_margin() {
        let supply = quotes(&[60.0]);
        let retail = quotes(&[40.0]);
        let mut rng = StdRng::seed_from_u64(7);

        let metrics = assemble_resale(&supply, &retail, &mut rng);
        assert!(metrics.potential_profit < 0.0);
        assert_eq!(metrics.profit_margin, 0.0);
    }
}
