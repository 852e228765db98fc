use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::Sender;

use crate::charts::{build_charts, ChartOutcome, ChartRenderer};
use crate::config::InsightsConfig;
use crate::error::{MarketInsightsError, Result};
use crate::export::{DocumentAssembler, ExportArtifact, ExportBundle, Exporter};
use crate::ingestion::ingest_pair;
use crate::narrative::{NarrativeGenerator, NarrativeService};
use crate::schema::AnalysisResult;
use crate::stream::WordStream;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PipelineEvent {
    Starting,
    Ingested,
    GeneratingNarrative,
    NarrativeReady { words: usize },
    NarrativeFailed { reason: String },
    ChartRendered { title: String },
    ChartUnavailable { title: String, reason: String },
    Exporting,
    Exported { path: String },
    ExportFailed { reason: String },
    Finished,
}

#[derive(Debug)]
pub struct PipelineReport {
    pub narrative: Result<AnalysisResult>,
    pub charts: Vec<ChartOutcome>,
    /// `None` when export is not configured or there was no narrative to export.
    pub export: Option<Result<ExportArtifact>>,
}

impl PipelineReport {
    /// Reveal stream for the narrative, when there is one.
    pub fn words(&self) -> Option<WordStream> {
        self.narrative
            .as_ref()
            .ok()
            .map(|result| WordStream::new(result.text.as_str()))
    }

    pub fn rendered_charts(&self) -> impl Iterator<Item = &crate::charts::ChartData> {
        self.charts.iter().filter_map(ChartOutcome::chart)
    }
}

/// Ingest, narrate, chart, export. Only ingestion failures abort the run;
/// everything after it is reported inside the [`PipelineReport`].
pub struct InsightsPipeline {
    config: InsightsConfig,
    generator: NarrativeGenerator<Arc<dyn NarrativeService>>,
    renderer: Option<Arc<dyn ChartRenderer>>,
    assembler: Option<Arc<dyn DocumentAssembler>>,
}

impl InsightsPipeline {
    pub fn new(config: InsightsConfig, service: Arc<dyn NarrativeService>) -> Self {
        let generator = NarrativeGenerator::new(service).with_prompt(config.prompt.clone());
        Self {
            config,
            generator,
            renderer: None,
            assembler: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ChartRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_assembler(mut self, assembler: Arc<dyn DocumentAssembler>) -> Self {
        self.assembler = Some(assembler);
        self
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    pub async fn run(
        &self,
        agency: Option<&[u8]>,
        market: Option<&[u8]>,
        progress: Option<Sender<PipelineEvent>>,
    ) -> Result<PipelineReport> {
        self.send_event(&progress, PipelineEvent::Starting).await;

        let pair = ingest_pair(agency, market)?;
        self.send_event(&progress, PipelineEvent::Ingested).await;

        self.send_event(&progress, PipelineEvent::GeneratingNarrative)
            .await;
        let narrative = self.generator.generate(&pair).await;
        let event = match &narrative {
            Ok(result) => PipelineEvent::NarrativeReady {
                words: WordStream::new(result.text.as_str()).len(),
            },
            Err(e) => PipelineEvent::NarrativeFailed {
                reason: e.to_string(),
            },
        };
        self.send_event(&progress, event).await;

        // Charts do not depend on the narrative having succeeded.
        let charts = if self.config.charts_enabled {
            build_charts(&pair, &self.config.chart_specs)
        } else {
            Vec::new()
        };
        for outcome in &charts {
            let event = match outcome {
                ChartOutcome::Rendered { chart } => PipelineEvent::ChartRendered {
                    title: chart.title().to_string(),
                },
                ChartOutcome::Unavailable { title, reason } => PipelineEvent::ChartUnavailable {
                    title: title.clone(),
                    reason: reason.clone(),
                },
            };
            self.send_event(&progress, event).await;
        }

        let export = match (&self.config.export, &narrative) {
            (Some(options), Ok(result)) => {
                self.send_event(&progress, PipelineEvent::Exporting).await;
                let bundle = ExportBundle {
                    narrative: result.text.clone(),
                    charts: charts.iter().filter_map(ChartOutcome::chart).cloned().collect(),
                };

                let mut exporter = Exporter::new(options.clone());
                if let Some(assembler) = &self.assembler {
                    exporter = exporter.with_assembler(Arc::clone(assembler));
                }
                if let Some(renderer) = &self.renderer {
                    exporter = exporter.with_renderer(Arc::clone(renderer));
                }

                let outcome = exporter.export(&bundle).map_err(|e| match e {
                    MarketInsightsError::ExportFailed(_) => e,
                    other => MarketInsightsError::ExportFailed(other.to_string()),
                });
                let event = match &outcome {
                    Ok(artifact) => PipelineEvent::Exported {
                        path: artifact.path.display().to_string(),
                    },
                    Err(e) => {
                        warn!("{}", e);
                        PipelineEvent::ExportFailed {
                            reason: e.to_string(),
                        }
                    }
                };
                self.send_event(&progress, event).await;
                Some(outcome)
            }
            _ => None,
        };

        info!(
            "Pipeline finished: narrative {}, {} of {} charts rendered, export {}",
            if narrative.is_ok() { "ok" } else { "failed" },
            charts.iter().filter(|c| c.chart().is_some()).count(),
            charts.len(),
            match &export {
                Some(Ok(_)) => "written",
                Some(Err(_)) => "failed",
                None => "skipped",
            }
        );
        self.send_event(&progress, PipelineEvent::Finished).await;

        Ok(PipelineReport {
            narrative,
            charts,
            export,
        })
    }

    async fn send_event(&self, sender: &Option<Sender<PipelineEvent>>, event: PipelineEvent) {
        if let Some(tx) = sender {
            let _ = tx.send(event).await;
        }
    }
}
