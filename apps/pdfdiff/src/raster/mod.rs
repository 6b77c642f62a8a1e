//! Raster comparison
//!
//! Takes two same-sized RGB page rasters and reduces their difference to a
//! sparse set of grid cells.
//!
//! # Usage
//!
//! ```rust
//! use pdfdiff::raster::{diff, DiffRegion, PixelBuffer};
//!
//! let a = PixelBuffer::filled(100, 100, [255, 255, 255]);
//! let mut b = a.clone();
//! for y in 50..55 {
//!     for x in 50..55 {
//!         b.set_pixel(x, y, [0, 0, 0]);
//!     }
//! }
//!
//! let regions = diff(&a, &b, 5, 20)?;
//! assert!(regions.contains(&DiffRegion::new(50, 50, 5, 5)));
//! # Ok::<(), pdfdiff::DiffError>(())
//! ```

mod buffer;
mod differ;
mod region;

pub use buffer::PixelBuffer;
pub use differ::{delta_map, diff, luma, DiffStats, RasterDiffer};
pub use region::{DiffRegion, RegionSet};
