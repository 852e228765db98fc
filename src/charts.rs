//! Comparison charts resolved from fixed field paths.
//!
//! Every spec is resolved on its own: a missing field makes that one chart
//! unavailable and the remaining charts still render. Numbers are passed
//! through exactly as they appear in the documents.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{MarketInsightsError, Result};
use crate::schema::{ChartSpec, DocumentRole, FieldPath, MetricsPair, TrendKpi};
use crate::utils::{resolve_category_shares, resolve_number};

pub const AXIS_TITLE_X: &str = "KPIs";
pub const AXIS_TITLE_Y: &str = "Values";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartData {
    Pie {
        title: String,
        labels: Vec<String>,
        values: Vec<f64>,
    },
    GroupedBar {
        title: String,
        categories: Vec<String>,
        series: Vec<Series>,
    },
    Line {
        title: String,
        categories: Vec<String>,
        series: Vec<Series>,
    },
}

impl ChartData {
    pub fn title(&self) -> &str {
        match self {
            ChartData::Pie { title, .. }
            | ChartData::GroupedBar { title, .. }
            | ChartData::Line { title, .. } => title,
        }
    }

    /// Plotly-compatible figure for a front end to draw.
    pub fn to_figure(&self) -> Value {
        match self {
            ChartData::Pie {
                title,
                labels,
                values,
            } => json!({
                "data": [{ "type": "pie", "labels": labels, "values": values }],
                "layout": { "title": { "text": title } }
            }),
            ChartData::GroupedBar {
                title,
                categories,
                series,
            } => {
                let traces: Vec<Value> = series
                    .iter()
                    .map(|s| json!({ "type": "bar", "name": s.name, "x": categories, "y": s.values }))
                    .collect();
                json!({
                    "data": traces,
                    "layout": {
                        "barmode": "group",
                        "title": { "text": title },
                        "xaxis": { "title": { "text": AXIS_TITLE_X } },
                        "yaxis": { "title": { "text": AXIS_TITLE_Y } }
                    }
                })
            }
            ChartData::Line {
                title,
                categories,
                series,
            } => {
                let traces: Vec<Value> = series
                    .iter()
                    .map(|s| {
                        json!({
                            "type": "scatter",
                            "mode": "lines+markers",
                            "name": s.name,
                            "x": categories,
                            "y": s.values
                        })
                    })
                    .collect();
                json!({
                    "data": traces,
                    "layout": {
                        "title": { "text": title },
                        "xaxis": { "title": { "text": AXIS_TITLE_X } },
                        "yaxis": { "title": { "text": AXIS_TITLE_Y } }
                    }
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartOutcome {
    Rendered { chart: ChartData },
    Unavailable { title: String, reason: String },
}

impl ChartOutcome {
    pub fn title(&self) -> &str {
        match self {
            ChartOutcome::Rendered { chart } => chart.title(),
            ChartOutcome::Unavailable { title, .. } => title,
        }
    }

    pub fn chart(&self) -> Option<&ChartData> {
        match self {
            ChartOutcome::Rendered { chart } => Some(chart),
            ChartOutcome::Unavailable { .. } => None,
        }
    }
}

/// 8-bit RGB pixels, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(MarketInsightsError::RenderFailed(format!(
                "{}x{} image needs {} RGB bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

/// Rasterizes resolved charts. The drawing backend lives outside this crate.
pub trait ChartRenderer: Send + Sync {
    fn rasterize(&self, chart: &ChartData) -> Result<RasterImage>;
}

fn path(raw: &'static str) -> FieldPath {
    FieldPath::builtin(raw)
}

/// The four comparison charts drawn for every agency/market pair.
pub fn default_chart_specs() -> Vec<ChartSpec> {
    vec![
        ChartSpec::CategoryShare {
            title: "Agency Product Categories".to_string(),
            role: DocumentRole::Agency,
            path: path("kpis.products.by_category"),
        },
        ChartSpec::CategoryShare {
            title: "Market Average Product Categories".to_string(),
            role: DocumentRole::Market,
            path: path("market_overview.metrics.products.avg_by_category"),
        },
        ChartSpec::GroupedComparison {
            title: "Sales Comparison: Agency vs Market Average".to_string(),
            kpi: "sales".to_string(),
            agency_path: path("kpis.sales.total_revenue"),
            market_path: path("market_overview.metrics.sales.avg_total_revenue"),
        },
        ChartSpec::MultiSeriesTrend {
            title: "Bookings and Reviews Comparison: Agency vs Market Average".to_string(),
            kpis: vec![
                TrendKpi {
                    name: "bookings".to_string(),
                    agency_path: path("kpis.bookings.total"),
                    market_path: path("market_overview.metrics.bookings.avg_total"),
                },
                TrendKpi {
                    name: "reviews".to_string(),
                    agency_path: path("kpis.reviews.total_count"),
                    market_path: path("market_overview.metrics.reviews.avg_total_count"),
                },
            ],
        },
    ]
}

pub fn build_charts(pair: &MetricsPair, specs: &[ChartSpec]) -> Vec<ChartOutcome> {
    specs
        .iter()
        .map(|spec| match build_chart(pair, spec) {
            Ok(chart) => {
                debug!("Resolved chart '{}'", chart.title());
                ChartOutcome::Rendered { chart }
            }
            Err(e) => {
                warn!("Chart '{}' skipped: {}", spec.title(), e);
                ChartOutcome::Unavailable {
                    title: spec.title().to_string(),
                    reason: e.to_string(),
                }
            }
        })
        .collect()
}

pub fn build_chart(pair: &MetricsPair, spec: &ChartSpec) -> Result<ChartData> {
    spec.validate()?;

    match spec {
        ChartSpec::CategoryShare { title, role, path } => {
            let (labels, values) = resolve_category_shares(pair.document(*role).value(), path)?;
            Ok(ChartData::Pie {
                title: title.clone(),
                labels,
                values,
            })
        }
        ChartSpec::GroupedComparison {
            title,
            kpi,
            agency_path,
            market_path,
        } => {
            let agency = resolve_number(pair.agency.value(), agency_path)?;
            let market = resolve_number(pair.market.value(), market_path)?;
            Ok(ChartData::GroupedBar {
                title: title.clone(),
                categories: vec![kpi.clone()],
                series: vec![
                    Series {
                        name: DocumentRole::Agency.series_name().to_string(),
                        values: vec![agency],
                    },
                    Series {
                        name: DocumentRole::Market.series_name().to_string(),
                        values: vec![market],
                    },
                ],
            })
        }
        ChartSpec::MultiSeriesTrend { title, kpis } => {
            let mut agency = Vec::with_capacity(kpis.len());
            let mut market = Vec::with_capacity(kpis.len());
            for kpi in kpis {
                agency.push(resolve_number(pair.agency.value(), &kpi.agency_path)?);
                market.push(resolve_number(pair.market.value(), &kpi.market_path)?);
            }
            Ok(ChartData::Line {
                title: title.clone(),
                categories: kpis.iter().map(|k| k.name.clone()).collect(),
                series: vec![
                    Series {
                        name: DocumentRole::Agency.series_name().to_string(),
                        values: agency,
                    },
                    Series {
                        name: DocumentRole::Market.series_name().to_string(),
                        values: market,
                    },
                ],
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MetricsDocument;

    fn pair(agency: Value, market: Value) -> MetricsPair {
        MetricsPair {
            agency: MetricsDocument::new(DocumentRole::Agency, agency),
            market: MetricsDocument::new(DocumentRole::Market, market),
        }
    }

    #[test]
    fn test_default_specs_are_valid() {
        let specs = default_chart_specs();
        assert_eq!(specs.len(), 4);
        for spec in &specs {
            assert!(spec.validate().is_ok());
        }
    }

    #[test]
    fn test_grouped_bar_passes_values_through() {
        let docs = pair(
            json!({"kpis": {"sales": {"total_revenue": 1234.5}}}),
            json!({"market_overview": {"metrics": {"sales": {"avg_total_revenue": 999}}}}),
        );
        let chart = build_chart(&docs, &default_chart_specs()[2]).unwrap();
        match chart {
            ChartData::GroupedBar {
                categories, series, ..
            } => {
                assert_eq!(categories, vec!["sales"]);
                assert_eq!(series[0].name, "Agency");
                assert_eq!(series[0].values, vec![1234.5]);
                assert_eq!(series[1].name, "Market Average");
                assert_eq!(series[1].values, vec![999.0]);
            }
            other => panic!("unexpected chart {:?}", other),
        }
    }

    #[test]
    fn test_trend_fails_when_any_kpi_missing() {
        let docs = pair(
            json!({"kpis": {"bookings": {"total": 40}}}),
            json!({"market_overview": {"metrics": {
                "bookings": {"avg_total": 20},
                "reviews": {"avg_total_count": 10}
            }}}),
        );
        let outcomes = build_charts(&docs, &default_chart_specs()[3..]);
        assert_eq!(
            outcomes[0],
            ChartOutcome::Unavailable {
                title: "Bookings and Reviews Comparison: Agency vs Market Average".to_string(),
                reason: "chart unavailable: missing field kpis.reviews.total_count".to_string(),
            }
        );
    }

    #[test]
    fn test_pie_figure_shape() {
        let chart = ChartData::Pie {
            title: "Agency Product Categories".to_string(),
            labels: vec!["tours".to_string(), "hotels".to_string()],
            values: vec![5.0, 3.0],
        };
        let figure = chart.to_figure();
        assert_eq!(figure["data"][0]["type"], "pie");
        assert_eq!(figure["data"][0]["labels"], json!(["tours", "hotels"]));
        assert_eq!(figure["layout"]["title"]["text"], "Agency Product Categories");
    }

    #[test]
    fn test_bar_figure_is_grouped() {
        let docs = pair(
            json!({"kpis": {"sales": {"total_revenue": 10}}}),
            json!({"market_overview": {"metrics": {"sales": {"avg_total_revenue": 5}}}}),
        );
        let figure = build_chart(&docs, &default_chart_specs()[2])
            .unwrap()
            .to_figure();
        assert_eq!(figure["layout"]["barmode"], "group");
        assert_eq!(figure["layout"]["xaxis"]["title"]["text"], "KPIs");
        assert_eq!(figure["data"].as_array().unwrap().len(), 2);
        assert_eq!(figure["data"][1]["name"], "Market Average");
    }

    #[test]
    fn test_raster_image_checks_buffer_size() {
        assert!(RasterImage::new(2, 2, vec![0; 12]).is_ok());
        assert!(RasterImage::new(2, 2, vec![0; 11]).is_err());
        assert!(RasterImage::new(0, 2, vec![]).is_err());
    }
}
