use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::error::{MarketInsightsError, Result};
use crate::prompts::PromptTemplate;
use crate::schema::{AnalysisRequest, AnalysisResult, MetricsPair};

/// An opaque text-completion backend.
#[async_trait]
pub trait NarrativeService: Send + Sync {
    /// Submits the prompt and both documents and waits for the full response.
    async fn complete(&self, request: &AnalysisRequest) -> Result<String>;

    /// Service name for logs and reports.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: NarrativeService + ?Sized> NarrativeService for Arc<T> {
    async fn complete(&self, request: &AnalysisRequest) -> Result<String> {
        (**self).complete(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

pub struct NarrativeGenerator<S> {
    service: S,
    prompt: PromptTemplate,
}

impl<S: NarrativeService> NarrativeGenerator<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            prompt: PromptTemplate::default(),
        }
    }

    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    /// Calls the service exactly once. Any failure, whatever its cause, comes
    /// back as `AnalysisFailed` and is not retried.
    pub async fn generate(&self, pair: &MetricsPair) -> Result<AnalysisResult> {
        let request = AnalysisRequest::new(self.prompt.text(), pair)?;
        debug!(
            "Submitting analysis request to {} (prompt {} chars, agency {} chars, market {} chars)",
            self.service.name(),
            request.prompt().len(),
            request.agency_text().len(),
            request.market_text().len()
        );

        match self.service.complete(&request).await {
            Ok(text) => {
                info!(
                    "Received {} chars of analysis from {}",
                    text.len(),
                    self.service.name()
                );
                Ok(AnalysisResult {
                    text,
                    service: self.service.name().to_string(),
                })
            }
            Err(e) => {
                warn!("Narrative service {} failed: {}", self.service.name(), e);
                Err(MarketInsightsError::AnalysisFailed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DocumentRole, MetricsDocument};
    use serde_json::json;
    use std::sync::Mutex;

    struct Recording {
        seen: Mutex<Vec<Vec<String>>>,
        reply: Result<String>,
    }

    impl Recording {
        fn replying(reply: Result<String>) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                reply,
            }
        }
    }

    #[async_trait]
    impl NarrativeService for Recording {
        async fn complete(&self, request: &AnalysisRequest) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push(request.parts().iter().map(|p| p.to_string()).collect());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(MarketInsightsError::ServiceError(e.to_string())),
            }
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn pair() -> MetricsPair {
        MetricsPair {
            agency: MetricsDocument::new(DocumentRole::Agency, json!({"kpis": {"x": 1}})),
            market: MetricsDocument::new(DocumentRole::Market, json!({"market_overview": {}})),
        }
    }

    #[tokio::test]
    async fn test_generate_returns_text_verbatim() {
        let service = Arc::new(Recording::replying(Ok("  Agency beats market.\n".to_string())));
        let generator =
            NarrativeGenerator::new(service.clone()).with_prompt(PromptTemplate::TravelAgency);

        let result = generator.generate(&pair()).await.unwrap();
        assert_eq!(result.text, "  Agency beats market.\n");
        assert_eq!(result.service, "recording");

        let seen = service.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0][0], PromptTemplate::TravelAgency.text());
        assert_eq!(seen[0][1], r#"{"kpis":{"x":1}}"#);
        assert_eq!(seen[0][2], r#"{"market_overview":{}}"#);
    }

    #[tokio::test]
    async fn test_service_error_becomes_analysis_failed() {
        let service = Recording::replying(Err(MarketInsightsError::ServiceError(
            "quota exceeded".to_string(),
        )));
        let generator = NarrativeGenerator::new(service);

        let err = generator.generate(&pair()).await.unwrap_err();
        match err {
            MarketInsightsError::AnalysisFailed(detail) => assert!(detail.contains("quota")),
            other => panic!("expected AnalysisFailed, got {:?}", other),
        }
    }
}
