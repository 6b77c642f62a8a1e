//! pdfdiff
//!
//! Page-by-page comparison of two paged documents. Pages are compared
//! either visually, by reducing a per-pixel luminance delta onto a coarse
//! grid, or textually, with a Ratcliff/Obershelp similarity ratio.
//!
//! # Modules
//!
//! - `raster`: pixel buffers and the grid differ
//! - `text`: sequence matcher and similarity ratio
//! - `overlay`: highlight compositing at render scale
//! - `session`: two-slot comparison state and result cache
//! - `source`: page source trait, LRU raster cache, MuPDF backend
//! - `zoom`: shared zoom level
//!
//! # Example
//!
//! ```
//! use pdfdiff::raster::{PixelBuffer, RasterDiffer};
//!
//! let a = PixelBuffer::filled(20, 20, [255, 255, 255]);
//! let mut b = a.clone();
//! b.set_pixel(12, 3, [0, 0, 0]);
//!
//! let regions = RasterDiffer::default().diff(&a, &b).unwrap();
//! assert_eq!(regions.len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod overlay;
pub mod raster;
pub mod session;
pub mod source;
pub mod text;
pub mod zoom;

pub use config::DiffConfig;
pub use error::{DiffError, Result};
pub use overlay::Overlay;
pub use raster::{DiffRegion, PixelBuffer, RasterDiffer, RegionSet};
pub use session::{CompareMode, ComparisonSession, Duplicate, RefreshOutcome, SessionState, Slot};
pub use source::{CachedSource, PageSource};
pub use text::{compare_text, TextDiffer, TextMatchResult};
pub use zoom::Zoom;

#[cfg(feature = "mupdf")]
pub use source::PdfSource;
