//! # Market Insights
//!
//! A library for comparing an agency's metrics against market averages: the
//! two JSON documents are sent to a text-completion service for a written
//! analysis, the same documents feed a fixed set of comparison charts, and the
//! analysis can be exported as a PDF.
//!
//! ## Core Concepts
//!
//! - **Metrics Documents**: Two arbitrary JSON uploads, one for the agency and one for the market
//! - **Narrative**: Free-form analysis text returned verbatim by a [`NarrativeService`]
//! - **Chart Specs**: Declarative charts that read numbers from fixed field paths
//! - **Partial Failure**: A missing field only disables the chart that needs it
//! - **Export**: A PDF named by a per-request id, with chart images cleaned up afterwards
//!
//! ## Example
//!
//! ```rust,ignore
//! use market_insights::*;
//! use std::sync::Arc;
//!
//! let config = InsightsConfig {
//!     prompt: PromptTemplate::TravelAgency,
//!     export: Some(ExportOptions::default()),
//!     ..InsightsConfig::default()
//! };
//! let service = Arc::new(llm::GeminiNarrator::from_config(llm::GeminiConfig::from_env()?));
//! let pipeline = InsightsPipeline::new(config, service)
//!     .with_renderer(Arc::new(PlottersRenderer::default()));
//!
//! let report = pipeline
//!     .run(Some(agency_bytes.as_slice()), Some(market_bytes.as_slice()), None)
//!     .await?;
//! for chart in report.rendered_charts() {
//!     println!("{}", chart.to_figure());
//! }
//! ```

pub mod charts;
pub mod config;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod narrative;
pub mod pipeline;
pub mod prompts;
pub mod render;
pub mod schema;
pub mod stream;
pub mod utils;

#[cfg(feature = "gemini")]
pub mod llm;

pub use charts::{
    build_chart, build_charts, default_chart_specs, ChartData, ChartOutcome, ChartRenderer,
    RasterImage, Series,
};
pub use config::InsightsConfig;
pub use error::{MarketInsightsError, Result};
pub use export::{
    ChartImage, DocumentAssembler, ExportArtifact, ExportBundle, ExportOptions, Exporter,
    PdfAssembler,
};
pub use ingestion::*;
pub use narrative::{NarrativeGenerator, NarrativeService};
pub use pipeline::{InsightsPipeline, PipelineEvent, PipelineReport};
pub use prompts::PromptTemplate;
pub use render::PlottersRenderer;
pub use schema::*;
pub use stream::{WordStream, DEFAULT_REVEAL_DELAY};
pub use utils::*;
