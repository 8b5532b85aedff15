//! Image-understanding client.
//!
//! The vision step is an opaque collaborator: it takes a product photo and
//! returns search terms and niche labels. Whatever intelligence sits behind
//! the endpoint is out of scope here; this client only speaks the chat
//! completions wire format and decodes the JSON payload the model was
//! instructed to produce.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;

use crate::error::SourceError;
use crate::types::ProductInsight;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const MODEL: &str = "gpt-4o";
const PROVIDER: &str = "vision";

const ANALYSIS_PROMPT: &str = "You are a product analysis expert. Analyze this product image and provide the following information in JSON format:\n\
1. Extract the exact text visible in the image\n\
2. Based on the text and visual analysis, provide two search terms:\n\
   - A smart search term that captures what the product actually is: concise, clear, suitable for both product searches and social engagement analysis.\n\
   - A condensed social search term (3 words max, space separated, no hashtags or hyphens, focusing on the core product identity)\n\
3. Identify the specific niche category this product belongs to\n\
4. Identify an adjacent niche category relevant for cross-selling\n\n\
Format the response as a JSON object with these keys: exactText, searchTerm, socialSearchTerm, niche, adjacentNiche";

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

/// The JSON object the model is instructed to emit.
#[derive(Debug, Deserialize)]
struct InsightPayload {
    #[serde(rename = "searchTerm")]
    search_term: String,
    #[serde(rename = "socialSearchTerm")]
    social_search_term: String,
    #[serde(default, rename = "exactText")]
    exact_text: Option<String>,
    #[serde(default)]
    niche: Option<String>,
    #[serde(default, rename = "adjacentNiche")]
    adjacent_niche: Option<String>,
}

/// Client for the image-understanding service.
pub struct VisionClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl VisionClient {
    /// Creates a client pointed at the production service.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, SourceError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
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
        })
    }

    /// Analyzes a product photo and returns its search terms and niche
    /// labels.
    ///
    /// This is the mandatory first step of a photo analysis: its output is
    /// the query input for every other metric, so a failure here fails the
    /// whole request.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Api`] — the service answered without a usable
    ///   completion, or with a payload missing the required keys.
    /// - [`SourceError::UnexpectedStatus`] / [`SourceError::Http`] —
    ///   transport-level failures.
    pub async fn analyze_image(&self, image_bytes: &[u8]) -> Result<ProductInsight, SourceError> {
        let mut url = self.base_url.clone();
        url.set_path("v1/chat/completions");

        let data_url = format!("data:image/jpeg;base64,{}", BASE64.encode(image_bytes));
        let body = json!({
            "model": MODEL,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": ANALYSIS_PROMPT },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }],
            "max_tokens": 1000,
            "temperature": 0.3,
            "response_format": { "type": "json_object" }
        });

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let completion: CompletionResponse = {
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
                context: "vision completion response".to_owned(),
                source: e,
            })?
        };

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| SourceError::Api {
                provider: PROVIDER,
                message: "completion contained no choices".to_owned(),
            })?;

        let payload: InsightPayload =
            serde_json::from_str(&content).map_err(|e| SourceError::Deserialize {
                context: "vision insight payload".to_owned(),
                source: e,
            })?;

        tracing::debug!(
            search_term = payload.search_term,
            social_search_term = payload.social_search_term,
            "image analysis complete"
        );

        Ok(ProductInsight {
            search_term: payload.search_term,
            social_search_term: payload.social_search_term,
            exact_text: payload.exact_text,
            niche: payload.niche,
            adjacent_niche: payload.adjacent_niche,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insight_payload_decodes_required_and_optional_keys() {
        let payload: InsightPayload = serde_json::from_value(serde_json::json!({
            "searchTerm": "uv toothbrush sterilizer",
            "socialSearchTerm": "toothbrush sterilizer",
            "exactText": "UV CLEAN",
            "niche": "Bathroom Gadgets",
            "adjacentNiche": "Travel Hygiene"
        }))
        .unwrap();
        assert_eq!(payload.search_term, "uv toothbrush sterilizer");
        assert_eq!(payload.adjacent_niche.as_deref(), Some("Travel Hygiene"));
    }

    #[test]
    fn insight_payload_tolerates_missing_optional_keys() {
        let payload: InsightPayload = serde_json::from_value(serde_json::json!({
            "searchTerm": "desk lamp",
            "socialSearchTerm": "desk lamp"
        }))
        .unwrap();
        assert!(payload.exact_text.is_none());
        assert!(payload.niche.is_none());
    }

    #[test]
    fn insight_payload_rejects_missing_search_term() {
        let result = serde_json::from_value::<InsightPayload>(serde_json::json!({
            "socialSearchTerm": "desk lamp"
        }));
        assert!(result.is_err());
    }
}
