use thiserror::Error;

/// Errors surfaced by the external source clients.
///
/// Record-level problems (an unparseable price, a post without a timestamp)
/// are never errors — those records are skipped during decoding. This enum
/// covers transport and provider-level failures only.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// HTTP 429 from a provider.
    #[error("rate limited by {provider} (retry after {retry_after_secs}s)")]
    RateLimited {
        provider: &'static str,
        retry_after_secs: u64,
    },

    /// Any other non-2xx HTTP status.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The provider answered 2xx but reported an application-level error.
    #[error("{provider} API error: {message}")]
    Api {
        provider: &'static str,
        message: String,
    },
}
