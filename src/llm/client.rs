use crate::error::{MarketInsightsError, Result};
use crate::llm::types::*;
use log::debug;
use reqwest::Client;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Connection settings for one pipeline run. Nothing here is global: callers
/// build a config and hand it to the client they create.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub generation: Option<GenerationConfig>,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("generation", &self.generation)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            generation: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reads `GEMINI_API_KEY` and, optionally, `GEMINI_MODEL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                MarketInsightsError::ConfigError("GEMINI_API_KEY must be set".to_string())
            })?;
        let config = Self::new(api_key);
        Ok(match std::env::var("GEMINI_MODEL") {
            Ok(model) if !model.trim().is_empty() => config.with_model(model),
            _ => config,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// One `generateContent` call carrying `parts` as a single user turn.
    pub async fn generate_text(&self, parts: &[&str]) -> Result<String> {
        let payload = GenerateContentRequest {
            contents: vec![Content::user_parts(parts.iter().copied())],
            generation_config: self.config.generation.clone(),
        };

        debug!(
            "Calling Gemini model {} with {} parts",
            self.config.model,
            parts.len()
        );
        // The key travels in a header; errors are stripped of the URL as well.
        let res = self
            .client
            .post(self.config.endpoint())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await.map_err(reqwest::Error::without_url)?;
            return Err(MarketInsightsError::ServiceError(format!(
                "Gemini API Error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse =
            res.json().await.map_err(reqwest::Error::without_url)?;
        body.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_uses_model_and_base_url() {
        let config = GeminiConfig::new("secret")
            .with_model("gemini-1.5-pro")
            .with_base_url("http://localhost:9000/v1beta/");
        assert_eq!(
            config.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[tokio::test]
    async fn test_transport_error_does_not_reveal_key() {
        let client = GeminiClient::new(
            GeminiConfig::new("SUPER-SECRET-KEY").with_base_url("http://127.0.0.1:9/v1beta"),
        );
        let err = client.generate_text(&["prompt"]).await.unwrap_err();

        assert!(matches!(err, MarketInsightsError::HttpError(_)));
        let printed = format!("{} {:?}", err, err);
        assert!(!printed.contains("SUPER-SECRET-KEY"));
    }

    #[test]
    fn test_debug_output_hides_key() {
        let config = GeminiConfig::new("super-secret-key");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret-key"));
        assert!(printed.contains(DEFAULT_GEMINI_MODEL));
    }
}
