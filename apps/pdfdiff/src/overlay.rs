//! Diff highlight compositing
//!
//! Burns translucent rectangles for each diff region onto a rendered page.
//! Regions are in page pixels; the page image may have been rendered at any
//! scale, so each rectangle is scaled and its edges snapped to the nearest
//! pixel boundary. Snapping the edges (rather than the origin and size)
//! keeps neighbouring cells flush with no gaps or double-blended seams.

use std::io::Cursor;

use image::{Rgb, RgbImage};

use crate::config::DiffConfig;
use crate::error::Result;
use crate::raster::{DiffRegion, RegionSet};

/// Highlight style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay {
    pub color: [u8; 3],
    pub opacity_percent: u8,
}

impl Default for Overlay {
    fn default() -> Self {
        Self::from_config(&DiffConfig::default())
    }
}

impl Overlay {
    pub fn from_config(config: &DiffConfig) -> Self {
        Self {
            color: config.overlay_color,
            opacity_percent: config.opacity_percent,
        }
    }

    pub fn with_opacity(mut self, opacity_percent: u8) -> Self {
        self.opacity_percent = opacity_percent;
        self
    }

    /// Percent mapped onto 0..=255, rounded half up
    pub fn alpha(&self) -> u8 {
        let percent = self.opacity_percent.min(100) as u32;
        ((percent * 255 + 50) / 100) as u8
    }

    /// Draw `regions` over `base` rendered at `scale`.
    ///
    /// Returns `base` untouched when there is nothing visible to draw.
    pub fn composite(&self, base: RgbImage, regions: &RegionSet, scale: f32) -> RgbImage {
        let alpha = self.alpha();
        if alpha == 0 || regions.is_empty() {
            return base;
        }

        let mut img = base;
        let dimensions = img.dimensions();
        for region in regions {
            let bounds = scaled_bounds(region, scale, dimensions);
            fill_rect(&mut img, bounds, self.color, alpha);
        }
        img
    }
}

/// Composite with the default highlight color
pub fn composite(base: RgbImage, regions: &RegionSet, scale: f32, opacity_percent: u8) -> RgbImage {
    Overlay::default()
        .with_opacity(opacity_percent)
        .composite(base, regions, scale)
}

/// Pixel bounds `(x0, y0, x1, y1)` of a region at `scale`, clipped to the image
pub fn scaled_bounds(region: &DiffRegion, scale: f32, (width, height): (u32, u32)) -> (u32, u32, u32, u32) {
    let s = scale.max(0.0) as f64;
    // Edges in u64 so regions near u32::MAX cannot overflow
    let snap = |v: u64, limit: u32| -> u32 { ((v as f64 * s).round() as u64).min(limit as u64) as u32 };
    let (x, y) = (region.x as u64, region.y as u64);

    (
        snap(x, width),
        snap(y, height),
        snap(x + region.w as u64, width),
        snap(y + region.h as u64, height),
    )
}

/// Source-over blend of one color channel
#[inline]
fn blend(src: u8, dst: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((src as u32 * a + dst as u32 * (255 - a) + 127) / 255) as u8
}

fn fill_rect(img: &mut RgbImage, (x0, y0, x1, y1): (u32, u32, u32, u32), color: [u8; 3], alpha: u8) {
    for y in y0..y1 {
        for x in x0..x1 {
            let px = img.get_pixel_mut(x, y);
            let Rgb([r, g, b]) = *px;
            *px = Rgb([
                blend(color[0], r, alpha),
                blend(color[1], g, alpha),
                blend(color[2], b, alpha),
            ]);
        }
    }
}

/// Place two page images next to each other on a white background
pub fn side_by_side(left: &RgbImage, right: &RgbImage, gap: u32) -> RgbImage {
    let width = left.width() + gap + right.width();
    let height = left.height().max(right.height());
    let mut out = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    image::imageops::replace(&mut out, left, 0, 0);
    image::imageops::replace(&mut out, right, (left.width() + gap) as i64, 0);
    out
}

/// Encode an image as PNG bytes
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    img.write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)?;
    Ok(output)
}
