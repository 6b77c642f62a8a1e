//! Pixel differencing and grid reduction
//!
//! Both rasters are reduced to BT.601 luma, differenced per pixel, and the
//! delta map is coarsened into `grid_size` square cells. A cell is reported
//! when the largest delta inside it is strictly above the threshold. The max
//! (not the mean) keeps one-pixel rules and single glyph edits visible.

use rayon::prelude::*;
use serde::Serialize;

use crate::config::DiffConfig;
use crate::error::{DiffError, Result};

use super::buffer::{PixelBuffer, CHANNELS};
use super::region::{DiffRegion, RegionSet};

/// BT.601 luma in 16.16 fixed point (the usual "L" conversion)
#[inline]
pub fn luma(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb;
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// Summary of one comparison, for logging and reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    /// Largest per-pixel luma delta on the page
    pub max_delta: u8,
    /// Cells above threshold
    pub hot_cells: usize,
    /// Cells on the page, including clipped edge cells
    pub total_cells: usize,
}

/// Grid-based raster differ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterDiffer {
    grid_size: u32,
    threshold: u8,
}

impl Default for RasterDiffer {
    fn default() -> Self {
        Self::from_config(&DiffConfig::default())
    }
}

impl RasterDiffer {
    pub fn new(grid_size: u32, threshold: u8) -> Result<Self> {
        if grid_size == 0 {
            return Err(DiffError::InvalidConfig("grid_size must be at least 1".into()));
        }
        Ok(Self { grid_size, threshold })
    }

    pub fn from_config(config: &DiffConfig) -> Self {
        Self {
            grid_size: config.grid_size.max(1),
            threshold: config.diff_threshold,
        }
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Compare two rasters and return the hot cells
    pub fn diff(&self, a: &PixelBuffer, b: &PixelBuffer) -> Result<RegionSet> {
        self.diff_with_stats(a, b).map(|(regions, _)| regions)
    }

    /// Like [`diff`](Self::diff), also returning counters
    pub fn diff_with_stats(&self, a: &PixelBuffer, b: &PixelBuffer) -> Result<(RegionSet, DiffStats)> {
        let delta = delta_map(a, b)?;
        let (width, height) = a.dimensions();
        let grid = self.grid_size;

        let cols = width.div_ceil(grid);
        let rows = height.div_ceil(grid);
        let total_cells = cols as usize * rows as usize;

        let max_delta = delta.par_iter().copied().max().unwrap_or(0);
        if max_delta == 0 {
            tracing::trace!(width, height, "Rasters identical, skipping grid reduction");
            return Ok((
                RegionSet::new(),
                DiffStats {
                    max_delta,
                    hot_cells: 0,
                    total_cells,
                },
            ));
        }

        // Each cell row is independent; collect keeps row order.
        let per_row: Vec<Vec<DiffRegion>> = (0..rows)
            .into_par_iter()
            .map(|cell_row| {
                let y = cell_row * grid;
                let h = grid.min(height - y);
                let mut hot = Vec::new();

                for cell_col in 0..cols {
                    let x = cell_col * grid;
                    let w = grid.min(width - x);
                    if cell_max(&delta, width, x, y, w, h) > self.threshold {
                        hot.push(DiffRegion::new(x, y, w, h));
                    }
                }
                hot
            })
            .collect();

        let regions: Vec<DiffRegion> = per_row.into_iter().flatten().collect();
        let stats = DiffStats {
            max_delta,
            hot_cells: regions.len(),
            total_cells,
        };

        tracing::debug!(
            width,
            height,
            grid,
            threshold = self.threshold,
            max_delta,
            hot_cells = stats.hot_cells,
            "Raster diff complete"
        );

        Ok((RegionSet::from_scan(regions), stats))
    }
}

/// Compare two rasters with an explicit grid and threshold
pub fn diff(a: &PixelBuffer, b: &PixelBuffer, grid_size: u32, threshold: u8) -> Result<RegionSet> {
    RasterDiffer::new(grid_size, threshold)?.diff(a, b)
}

/// Per-pixel `|luma(a) - luma(b)|`, row-major, one byte per pixel
pub fn delta_map(a: &PixelBuffer, b: &PixelBuffer) -> Result<Vec<u8>> {
    if a.dimensions() != b.dimensions() {
        return Err(DiffError::DimensionMismatch {
            left: a.dimensions(),
            right: b.dimensions(),
        });
    }

    let (width, height) = a.dimensions();
    let mut delta = vec![0u8; width as usize * height as usize];
    if delta.is_empty() {
        return Ok(delta);
    }

    delta
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, out)| {
            let row_a = a.row(y as u32);
            let row_b = b.row(y as u32);
            for (x, slot) in out.iter_mut().enumerate() {
                let i = x * CHANNELS;
                let la = luma([row_a[i], row_a[i + 1], row_a[i + 2]]);
                let lb = luma([row_b[i], row_b[i + 1], row_b[i + 2]]);
                *slot = la.abs_diff(lb);
            }
        });

    Ok(delta)
}

/// Running max over one (possibly clipped) cell
fn cell_max(delta: &[u8], width: u32, x: u32, y: u32, w: u32, h: u32) -> u8 {
    let mut max = 0u8;
    for row in y..y + h {
        let start = row as usize * width as usize + x as usize;
        for &value in &delta[start..start + w as usize] {
            max = max.max(value);
        }
    }
    max
}
