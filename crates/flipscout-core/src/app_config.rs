use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub upload_dir: PathBuf,

    /// SerpApi key for Google Shopping searches.
    pub shopping_api_key: String,
    /// TikAPI key for social post searches.
    pub social_api_key: String,
    /// Apify token for the marketplace listings actor.
    pub orders_api_token: String,
    /// Key for the image-understanding service.
    pub vision_api_key: String,

    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,

    /// Page-size, page-count, and record ceilings for the paginated social
    /// search, plus the enforced delay between page requests.
    pub social_page_size: u32,
    pub social_max_pages: usize,
    pub social_max_posts: usize,
    pub social_inter_page_delay_ms: u64,

    /// How many listings per marketplace feed the price estimate.
    pub shopping_quote_limit: usize,
    /// How many marketplace listings feed the order-volume estimate.
    pub orders_listing_limit: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("upload_dir", &self.upload_dir)
            .field("shopping_api_key", &"[redacted]")
            .field("social_api_key", &"[redacted]")
            .field("orders_api_token", &"[redacted]")
            .field("vision_api_key", &"[redacted]")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("social_page_size", &self.social_page_size)
            .field("social_max_pages", &self.social_max_pages)
            .field("social_max_posts", &self.social_max_posts)
            .field(
                "social_inter_page_delay_ms",
                &self.social_inter_page_delay_ms,
            )
            .field("shopping_quote_limit", &self.shopping_quote_limit)
            .field("orders_listing_limit", &self.orders_listing_limit)
            .finish()
    }
}
