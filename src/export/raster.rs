//! PNG files used as the on-disk format for chart images.

use image::{ColorType, ImageFormat};
use std::path::Path;

use crate::charts::RasterImage;
use crate::error::{MarketInsightsError, Result};

pub fn write_png(path: &Path, raster: &RasterImage) -> Result<()> {
    image::save_buffer_with_format(
        path,
        &raster.pixels,
        raster.width,
        raster.height,
        ColorType::Rgb8,
        ImageFormat::Png,
    )
    .map_err(|e| {
        MarketInsightsError::ExportFailed(format!("writing {}: {}", path.display(), e))
    })
}

/// Loads any PNG as 8-bit RGB; alpha and palette images are converted.
pub fn read_png(path: &Path) -> Result<RasterImage> {
    let decoded = image::open(path)
        .map_err(|e| {
            MarketInsightsError::ExportFailed(format!("reading {}: {}", path.display(), e))
        })?
        .to_rgb8();
    let (width, height) = decoded.dimensions();
    RasterImage::new(width, height, decoded.into_raw())
}
