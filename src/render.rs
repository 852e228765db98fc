//! Bitmap rendering of resolved charts with plotters.
//!
//! Images carry no text: titles and series names are typeset by whatever
//! document the image is placed in.

use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::PI;

use crate::charts::{ChartData, ChartRenderer, RasterImage, Series};
use crate::error::{MarketInsightsError, Result};

/// Plotly's default colorway, so exported images match the interactive figures.
const PALETTE: [RGBColor; 6] = [
    RGBColor(0x63, 0x6E, 0xFA),
    RGBColor(0xEF, 0x55, 0x3B),
    RGBColor(0x00, 0xCC, 0x96),
    RGBColor(0xAB, 0x63, 0xFA),
    RGBColor(0xFF, 0xA1, 0x5A),
    RGBColor(0x19, 0xD3, 0xF3),
];

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlottersRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for PlottersRenderer {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

impl ChartRenderer for PlottersRenderer {
    fn rasterize(&self, chart: &ChartData) -> Result<RasterImage> {
        let mut pixels = vec![0u8; self.width as usize * self.height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, (self.width, self.height))
                .into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;

            match chart {
                ChartData::Pie { values, .. } => draw_pie(&root, values)?,
                ChartData::GroupedBar {
                    categories, series, ..
                } => draw_bars(&root, categories.len(), series)?,
                ChartData::Line {
                    categories, series, ..
                } => draw_lines(&root, categories.len(), series)?,
            }

            root.present().map_err(render_err)?;
        }
        RasterImage::new(self.width, self.height, pixels)
    }
}

fn render_err(e: impl std::fmt::Display) -> MarketInsightsError {
    MarketInsightsError::RenderFailed(e.to_string())
}

fn color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Slices start at twelve o'clock and run clockwise.
fn draw_pie(root: &Area, values: &[f64]) -> Result<()> {
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(MarketInsightsError::RenderFailed(
            "pie slices must be finite and non-negative".to_string(),
        ));
    }
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return Err(MarketInsightsError::RenderFailed(
            "pie chart has nothing to show".to_string(),
        ));
    }

    let (width, height) = root.dim_in_pixel();
    let center = (width as f64 / 2.0, height as f64 / 2.0);
    let radius = width.min(height) as f64 * 0.4;

    let mut start = -PI / 2.0;
    for (index, value) in values.iter().enumerate() {
        let sweep = value / total * 2.0 * PI;
        if sweep <= 0.0 {
            continue;
        }
        let steps = ((sweep / (2.0 * PI)) * 180.0).ceil().max(2.0) as usize;
        let mut points = vec![(center.0.round() as i32, center.1.round() as i32)];
        points.extend((0..=steps).map(|step| {
            let angle = start + sweep * step as f64 / steps as f64;
            (
                (center.0 + radius * angle.cos()).round() as i32,
                (center.1 + radius * angle.sin()).round() as i32,
            )
        }));
        root.draw(&Polygon::new(points, color(index).filled()))
            .map_err(render_err)?;
        start += sweep;
    }
    Ok(())
}

fn draw_bars(root: &Area, categories: usize, series: &[Series]) -> Result<()> {
    let (low, high) = value_range(series)?;
    let mut chart = ChartBuilder::on(root)
        .margin(40)
        .build_cartesian_2d(0f64..categories.max(1) as f64, low..high)
        .map_err(render_err)?;
    chart
        .draw_series(axes(categories, low, high))
        .map_err(render_err)?;

    let group = 0.8;
    let bar = group / series.len().max(1) as f64;
    for (index, s) in series.iter().enumerate() {
        let style = color(index).filled();
        chart
            .draw_series(s.values.iter().enumerate().map(|(category, value)| {
                let left = category as f64 + (1.0 - group) / 2.0 + index as f64 * bar;
                Rectangle::new([(left, 0.0), (left + bar, *value)], style)
            }))
            .map_err(render_err)?;
    }
    Ok(())
}

fn draw_lines(root: &Area, categories: usize, series: &[Series]) -> Result<()> {
    let (low, high) = value_range(series)?;
    let mut chart = ChartBuilder::on(root)
        .margin(40)
        .build_cartesian_2d(0f64..categories.max(1) as f64, low..high)
        .map_err(render_err)?;
    chart
        .draw_series(axes(categories, low, high))
        .map_err(render_err)?;

    for (index, s) in series.iter().enumerate() {
        let points: Vec<(f64, f64)> = s
            .values
            .iter()
            .enumerate()
            .map(|(category, value)| (category as f64 + 0.5, *value))
            .collect();
        chart
            .draw_series(LineSeries::new(
                points.clone(),
                color(index).stroke_width(3),
            ))
            .map_err(render_err)?;
        chart
            .draw_series(
                points
                    .into_iter()
                    .map(|point| Circle::new(point, 5, color(index).filled())),
            )
            .map_err(render_err)?;
    }
    Ok(())
}

fn axes(categories: usize, low: f64, high: f64) -> [PathElement<(f64, f64)>; 2] {
    let right = categories.max(1) as f64;
    [
        PathElement::new(vec![(0.0, 0.0), (right, 0.0)], BLACK),
        PathElement::new(vec![(0.0, low), (0.0, high)], BLACK),
    ]
}

/// Y range covering every value and zero, with headroom above and below.
fn value_range(series: &[Series]) -> Result<(f64, f64)> {
    let values: Vec<f64> = series.iter().flat_map(|s| s.values.iter().copied()).collect();
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MarketInsightsError::RenderFailed(
            "chart values must be finite".to_string(),
        ));
    }

    let low = values.iter().copied().fold(0.0, f64::min);
    let high = values.iter().copied().fold(0.0, f64::max);
    let span = if high > low { high - low } else { 1.0 };
    let low = if low < 0.0 { low - span * 0.1 } else { 0.0 };
    Ok((low, high + span * 0.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> PlottersRenderer {
        PlottersRenderer {
            width: 160,
            height: 120,
        }
    }

    fn coloured_pixels(image: &RasterImage) -> usize {
        image
            .pixels
            .chunks(3)
            .filter(|px| px.iter().any(|c| *c != 255))
            .count()
    }

    fn comparison(values: (f64, f64)) -> Vec<Series> {
        vec![
            Series {
                name: "Agency".to_string(),
                values: vec![values.0],
            },
            Series {
                name: "Market Average".to_string(),
                values: vec![values.1],
            },
        ]
    }

    #[test]
    fn test_pie_fills_slices() {
        let chart = ChartData::Pie {
            title: "Agency Product Categories".to_string(),
            labels: vec!["tours".to_string(), "hotels".to_string()],
            values: vec![5.0, 3.0],
        };
        let image = small().rasterize(&chart).unwrap();

        assert_eq!((image.width, image.height), (160, 120));
        assert_eq!(image.pixels.len(), 160 * 120 * 3);
        assert!(coloured_pixels(&image) > 1000);
        // Corners stay background.
        assert_eq!(&image.pixels[..3], &[255, 255, 255]);
    }

    #[test]
    fn test_empty_pie_is_render_failure() {
        let chart = ChartData::Pie {
            title: "Nothing".to_string(),
            labels: vec!["tours".to_string()],
            values: vec![0.0],
        };
        assert!(matches!(
            small().rasterize(&chart),
            Err(MarketInsightsError::RenderFailed(_))
        ));
    }

    #[test]
    fn test_grouped_bars_use_both_series_colours() {
        let chart = ChartData::GroupedBar {
            title: "Sales".to_string(),
            categories: vec!["sales".to_string()],
            series: comparison((1000.0, 500.0)),
        };
        let image = small().rasterize(&chart).unwrap();

        let has = |c: RGBColor| {
            image
                .pixels
                .chunks(3)
                .any(|px| px == [c.0, c.1, c.2].as_slice())
        };
        assert!(has(PALETTE[0]));
        assert!(has(PALETTE[1]));
    }

    #[test]
    fn test_lines_render_negative_values() {
        let chart = ChartData::Line {
            title: "Trend".to_string(),
            categories: vec!["bookings".to_string(), "reviews".to_string()],
            series: vec![
                Series {
                    name: "Agency".to_string(),
                    values: vec![40.0, -20.0],
                },
                Series {
                    name: "Market Average".to_string(),
                    values: vec![20.0, 10.0],
                },
            ],
        };
        let image = small().rasterize(&chart).unwrap();
        assert!(coloured_pixels(&image) > 0);
    }

    #[test]
    fn test_value_range_includes_zero() {
        assert_eq!(value_range(&comparison((10.0, 5.0))).unwrap(), (0.0, 11.0));
        let (low, high) = value_range(&comparison((-10.0, 10.0))).unwrap();
        assert!(low < -10.0 && high > 10.0);
        assert!(value_range(&comparison((f64::NAN, 1.0))).is_err());
    }
}
