//! Page sources
//!
//! The diff engine does not open documents itself. A [`PageSource`] hands it
//! page counts, page sizes, rasters and text for one loaded document.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐     ┌──────────────────────┐
//! │  ComparisonSession   │────▶│  Box<dyn PageSource> │  (slot A, slot B)
//! └──────────────────────┘     └──────────────────────┘
//!                                        │
//!                         ┌──────────────┴──────────────┐
//!                         ▼                             ▼
//!               ┌──────────────────┐          ┌──────────────────┐
//!               │   CachedSource   │─────────▶│    PdfSource     │
//!               │ (LRU of rasters) │          │ (MuPDF, feature) │
//!               └──────────────────┘          └──────────────────┘
//! ```

mod cache;
#[cfg(feature = "mupdf")]
mod pdf;

pub use cache::{CacheStats, CachedSource, RasterCacheKey};
#[cfg(feature = "mupdf")]
pub use pdf::PdfSource;

use crate::error::Result;
use crate::raster::PixelBuffer;

/// Read access to one loaded document
///
/// Implementations must be cheap to query for `page_count` and must not
/// panic for out-of-range pages: they return an empty raster or empty text
/// instead, which the session treats as nothing to compare.
pub trait PageSource: Send + Sync {
    /// Number of pages
    fn page_count(&self) -> usize;

    /// Page size in points at scale 1.0, or `None` past the last page
    fn page_size(&self, page: usize) -> Option<(f32, f32)>;

    /// Render a page to RGB at `scale`
    fn pixmap(&self, page: usize, scale: f32) -> Result<PixelBuffer>;

    /// Plain text of a page
    fn text(&self, page: usize) -> Result<String>;
}

impl<S: PageSource + ?Sized> PageSource for Box<S> {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn page_size(&self, page: usize) -> Option<(f32, f32)> {
        (**self).page_size(page)
    }

    fn pixmap(&self, page: usize, scale: f32) -> Result<PixelBuffer> {
        (**self).pixmap(page, scale)
    }

    fn text(&self, page: usize) -> Result<String> {
        (**self).text(page)
    }
}

impl<S: PageSource + ?Sized> PageSource for std::sync::Arc<S> {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn page_size(&self, page: usize) -> Option<(f32, f32)> {
        (**self).page_size(page)
    }

    fn pixmap(&self, page: usize, scale: f32) -> Result<PixelBuffer> {
        (**self).pixmap(page, scale)
    }

    fn text(&self, page: usize) -> Result<String> {
        (**self).text(page)
    }
}
