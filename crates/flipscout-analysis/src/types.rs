use serde::{Deserialize, Serialize};

/// Marketplace a quote set was collected from.
///
/// AliExpress quotes stand in for the wholesale/sourcing side of a flip,
/// Amazon quotes for the retail/resale side; the price estimator skews each
/// set accordingly (see [`crate::pricing`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marketplace {
    AliExpress,
    Amazon,
}

impl Marketplace {
    /// Keyword appended to the shopping query to steer results toward this
    /// marketplace.
    #[must_use]
    pub fn query_suffix(self) -> &'static str {
        match self {
            Marketplace::AliExpress => "aliexpress",
            Marketplace::Amazon => "amazon",
        }
    }
}

impl std::fmt::Display for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Marketplace::AliExpress => write!(f, "aliexpress"),
            Marketplace::Amazon => write!(f, "amazon"),
        }
    }
}

/// One shopping listing after the provider decode step.
#[derive(Debug, Clone)]
pub struct ScoredListing {
    pub title: String,
    /// Normalized price; `None` when the listed price text did not parse.
    /// Unparseable prices are excluded from all downstream math.
    pub price: Option<f64>,
    /// Provider relevance in `[0, 1]`. The provider's own result ordering is
    /// the rank; index 0 is its best match.
    pub relevance: f64,
}

/// Up to the configured number of listings for one marketplace, in the
/// provider's relevance order.
#[derive(Debug, Clone, Default)]
pub struct QuoteSet {
    pub listings: Vec<ScoredListing>,
}

impl QuoteSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Usable prices in provider rank order.
    #[must_use]
    pub fn usable_prices(&self) -> Vec<f64> {
        self.listings.iter().filter_map(|l| l.price).collect()
    }

    /// Relevance of the provider's best match, or 0 when the set is empty.
    #[must_use]
    pub fn top_relevance(&self) -> f64 {
        self.listings.first().map_or(0.0, |l| l.relevance)
    }
}

/// One social post after the provider decode step.
///
/// Timestamps stay raw here; [`crate::normalize::parse_epoch_seconds`]
/// decides validity during bucketing so malformed records are skipped, not
/// silently zeroed.
#[derive(Debug, Clone, Default)]
pub struct RawPost {
    pub created_at_epoch_seconds: Option<i64>,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

/// Output of the image-understanding step for one uploaded photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInsight {
    /// Query for shopping-price and order-volume searches.
    pub search_term: String,
    /// Condensed query for social search.
    pub social_search_term: String,
    /// Text read verbatim from the image, when any.
    pub exact_text: Option<String>,
    pub niche: Option<String>,
    pub adjacent_niche: Option<String>,
}

impl ProductInsight {
    /// Insight for a caller-supplied description, no photo involved. The
    /// description serves as both the shopping and the social query; the
    /// social query is distilled later in the pipeline.
    #[must_use]
    pub fn from_description(description: &str) -> Self {
        Self {
            search_term: description.to_owned(),
            social_search_term: description.to_owned(),
            exact_text: None,
            niche: None,
            adjacent_niche: None,
        }
    }
}

/// Per-marketplace match counts and top relevance scores backing a
/// [`ResaleMetrics`] value.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    pub ali_express_matches: usize,
    pub amazon_matches: usize,
    pub ali_express_top_score: f64,
    pub amazon_top_score: f64,
}

/// Terminal resale aggregate for one query. Immutable once computed; a new
/// analysis always produces a new value.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResaleMetrics {
    pub ali_express_average: f64,
    pub amazon_average: f64,
    pub potential_profit: f64,
    /// Percentage clamped to `[0, 100]`.
    pub profit_margin: f64,
    /// Heuristic trust signal in `[0, 1]`.
    pub confidence: f64,
    pub match_details: MatchDetails,
}

/// One calendar bucket in a dense engagement series.
///
/// `likes`/`comments`/`shares` are per-post averages within the bucket,
/// rounded to whole counts; empty buckets report zeroes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketRow {
    /// `YYYY-MM-DD` for day and week buckets (week-start date), `YYYY-MM`
    /// for month buckets.
    pub date: String,
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
    pub total_engagement: f64,
    pub post_count: usize,
}

/// Engagement aggregate for one window granularity, buckets in ascending
/// key order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementSummary {
    pub posts: Vec<BucketRow>,
    pub average_likes: f64,
    pub average_comments: f64,
    pub average_shares: f64,
    pub total_posts: usize,
}

/// Engagement summaries for each supported window, computed independently
/// from the same post sample.
#[derive(Debug, Clone, Serialize)]
pub struct EngagementWindows {
    pub day: EngagementSummary,
    pub week: EngagementSummary,
    pub monthly: EngagementSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMetrics {
    pub average_orders: u64,
    pub top_listing_orders: u64,
    pub total_orders: u64,
}

/// Marketplace order-volume aggregate for one query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderVolume {
    pub volume_level: VolumeLevel,
    pub metrics: OrderMetrics,
}

/// Final response assembled from the independent metric sections.
///
/// Any section may be `None` when its sources produced no usable data or
/// failed; the others are still populated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMetrics {
    pub resale_value: Option<ResaleMetrics>,
    pub engagement: Option<EngagementWindows>,
    pub order_volume: Option<OrderVolume>,
}
