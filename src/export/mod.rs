pub mod pdf;
pub mod raster;

pub use pdf::PdfAssembler;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};
use uuid::Uuid;

use crate::charts::{ChartData, ChartRenderer};
use crate::error::Result;

pub const DEFAULT_DOWNLOAD_NAME: &str = "market_insights.pdf";

/// Turns the narrative and chart images into a single downloadable document.
pub trait DocumentAssembler: Send + Sync {
    fn assemble(&self, narrative: &str, images: &[ChartImage]) -> Result<Vec<u8>>;
}

/// A rasterized chart waiting on disk for the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImage {
    pub title: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ExportOptions {
    #[serde(default = "default_output_dir")]
    #[schemars(description = "Directory receiving the generated PDF files")]
    pub output_dir: PathBuf,

    #[serde(default)]
    #[schemars(
        description = "Where temporary chart images are written; the system temp dir when absent"
    )]
    pub scratch_dir: Option<PathBuf>,

    #[serde(default = "default_true")]
    #[schemars(description = "Embed chart images when a chart renderer is available")]
    pub include_charts: bool,

    #[serde(default = "default_download_name")]
    #[schemars(description = "File name offered to the user when downloading")]
    pub download_name: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_true() -> bool {
    true
}

fn default_download_name() -> String {
    DEFAULT_DOWNLOAD_NAME.to_string()
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            scratch_dir: None,
            include_charts: true,
            download_name: default_download_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportBundle {
    pub narrative: String,
    pub charts: Vec<ChartData>,
}

impl ExportBundle {
    pub fn text_only(narrative: impl Into<String>) -> Self {
        Self {
            narrative: narrative.into(),
            charts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportArtifact {
    pub id: Uuid,
    pub path: PathBuf,
    pub download_name: String,
    pub created_at: DateTime<Utc>,
    pub chart_count: usize,
    pub size_bytes: u64,
}

pub struct Exporter {
    options: ExportOptions,
    assembler: Arc<dyn DocumentAssembler>,
    renderer: Option<Arc<dyn ChartRenderer>>,
}

impl Exporter {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            assembler: Arc::new(PdfAssembler::default()),
            renderer: None,
        }
    }

    pub fn with_assembler(mut self, assembler: Arc<dyn DocumentAssembler>) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ChartRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Writes one document named after a fresh request id, so concurrent
    /// exports never share a file. Chart images live in a scratch directory
    /// that is removed before this returns, whether assembly worked or not.
    /// The document is staged next to its destination and only appears under
    /// its final name once fully written.
    pub fn export(&self, bundle: &ExportBundle) -> Result<ExportArtifact> {
        let id = Uuid::new_v4();

        let scratch = match (&self.renderer, self.options.include_charts) {
            (Some(renderer), true) if !bundle.charts.is_empty() => {
                let dir = self.scratch_dir()?;
                let images = rasterize_charts(renderer.as_ref(), &bundle.charts, dir.path());
                Some((dir, images))
            }
            _ => None,
        };
        let images: &[ChartImage] = scratch
            .as_ref()
            .map_or(&[][..], |(_, images)| images.as_slice());

        let assembled = self.assembler.assemble(&bundle.narrative, images);
        let chart_count = images.len();

        if let Some((dir, _)) = scratch {
            let location = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!("Could not remove chart scratch directory {:?}: {}", location, e);
            }
        }

        let document = assembled?;

        fs::create_dir_all(&self.options.output_dir)?;
        let path = self
            .options
            .output_dir
            .join(format!("market_insights-{}.pdf", id));
        let mut staged = NamedTempFile::new_in(&self.options.output_dir)?;
        staged.write_all(&document)?;
        staged.persist(&path).map_err(std::io::Error::from)?;

        info!(
            "Exported {} ({} bytes, {} charts)",
            path.display(),
            document.len(),
            chart_count
        );

        Ok(ExportArtifact {
            id,
            path,
            download_name: self.options.download_name.clone(),
            created_at: Utc::now(),
            chart_count,
            size_bytes: document.len() as u64,
        })
    }

    fn scratch_dir(&self) -> Result<TempDir> {
        let builder = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("market-insights-charts-");
            builder
        };
        let dir = match &self.options.scratch_dir {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}

/// A chart that cannot be rasterized is left out of the document.
fn rasterize_charts(
    renderer: &dyn ChartRenderer,
    charts: &[ChartData],
    dir: &Path,
) -> Vec<ChartImage> {
    let mut images = Vec::with_capacity(charts.len());

    for (index, chart) in charts.iter().enumerate() {
        let bitmap = match renderer.rasterize(chart) {
            Ok(bitmap) => bitmap,
            Err(e) => {
                warn!("Skipping chart '{}' in export: {}", chart.title(), e);
                continue;
            }
        };

        let path = dir.join(format!("chart-{}.png", index + 1));
        match raster::write_png(&path, &bitmap) {
            Ok(()) => {
                debug!("Wrote chart image {:?}", path);
                images.push(ChartImage {
                    title: chart.title().to_string(),
                    path,
                });
            }
            Err(e) => warn!("Skipping chart '{}' in export: {}", chart.title(), e),
        }
    }

    images
}
