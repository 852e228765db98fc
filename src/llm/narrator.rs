use async_trait::async_trait;

use crate::error::Result;
use crate::llm::client::{GeminiClient, GeminiConfig};
use crate::narrative::NarrativeService;
use crate::schema::AnalysisRequest;

/// Gemini-backed narrative service.
pub struct GeminiNarrator {
    client: GeminiClient,
}

impl GeminiNarrator {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: GeminiConfig) -> Self {
        Self::new(GeminiClient::new(config))
    }
}

#[async_trait]
impl NarrativeService for GeminiNarrator {
    async fn complete(&self, request: &AnalysisRequest) -> Result<String> {
        self.client.generate_text(&request.parts()).await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
