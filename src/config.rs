use schemars::{schema::RootSchema, schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::charts::default_chart_specs;
use crate::error::{MarketInsightsError, Result};
use crate::export::ExportOptions;
use crate::prompts::PromptTemplate;
use crate::schema::ChartSpec;

/// Everything that differs between one analysis setup and another. Service
/// credentials are not part of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct InsightsConfig {
    #[serde(default)]
    #[schemars(description = "Instruction text sent ahead of the two metrics documents")]
    pub prompt: PromptTemplate,

    #[serde(default = "default_true")]
    #[schemars(description = "Resolve comparison charts from the metrics documents")]
    pub charts_enabled: bool,

    #[serde(default = "default_chart_specs")]
    #[schemars(description = "Charts to draw; defaults to the standard four comparisons")]
    pub chart_specs: Vec<ChartSpec>,

    #[serde(default = "default_reveal_delay_ms")]
    #[schemars(description = "Pause between revealed words, in milliseconds")]
    pub reveal_delay_ms: u64,

    #[serde(default)]
    #[schemars(description = "PDF export settings; export is skipped when absent")]
    pub export: Option<ExportOptions>,
}

fn default_true() -> bool {
    true
}

fn default_reveal_delay_ms() -> u64 {
    100
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            prompt: PromptTemplate::default(),
            charts_enabled: true,
            chart_specs: default_chart_specs(),
            reveal_delay_ms: default_reveal_delay_ms(),
            export: None,
        }
    }
}

impl InsightsConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: InsightsConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let PromptTemplate::Custom(text) = &self.prompt {
            if text.trim().is_empty() {
                return Err(MarketInsightsError::ConfigError(
                    "Custom prompt must not be empty".to_string(),
                ));
            }
        }
        for spec in &self.chart_specs {
            spec.validate()?;
        }
        Ok(())
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn json_schema() -> RootSchema {
        schema_for!(InsightsConfig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config: InsightsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, InsightsConfig::default());
        assert_eq!(config.chart_specs.len(), 4);
        assert_eq!(config.reveal_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_from_file_reads_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("insights.json");
        std::fs::write(
            &path,
            r#"{
                "prompt": "travel_agency",
                "charts_enabled": false,
                "reveal_delay_ms": 0,
                "export": { "output_dir": "out" }
            }"#,
        )
        .unwrap();

        let config = InsightsConfig::from_file(&path).unwrap();
        assert_eq!(config.prompt, PromptTemplate::TravelAgency);
        assert!(!config.charts_enabled);
        let export = config.export.unwrap();
        assert_eq!(export.output_dir, Path::new("out"));
        assert!(export.include_charts);
        assert_eq!(export.download_name, "market_insights.pdf");
    }

    #[test]
    fn test_blank_custom_prompt_is_rejected() {
        let config = InsightsConfig {
            prompt: PromptTemplate::Custom("   ".to_string()),
            ..InsightsConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MarketInsightsError::ConfigError(_))
        ));
    }

    #[test]
    fn test_schema_lists_chart_kinds() {
        let schema = serde_json::to_string(&InsightsConfig::json_schema()).unwrap();
        assert!(schema.contains("grouped_comparison"));
        assert!(schema.contains("multi_series_trend"));
    }
}
