//! Owned RGB page raster

use image::RgbImage;

use crate::error::{DiffError, Result};

/// Bytes per RGB pixel
pub const CHANNELS: usize = 3;

/// Row-major RGB raster with a stride of `width * 3` and no padding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGB samples, checking the length against the dimensions
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(DiffError::InvalidBuffer {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Raster filled with a single color
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self { width, height, data }
    }

    /// Zero-sized raster, returned by sources for pages they cannot render
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    /// Build from samples with `n` channels per pixel.
    ///
    /// One or two channels are gray (plus alpha) and are replicated into RGB.
    /// Three or more are RGB followed by extras such as alpha, which are
    /// dropped.
    pub fn from_samples(width: u32, height: u32, samples: &[u8], n: usize) -> Result<Self> {
        let pixels = width as usize * height as usize;
        let expected = pixels * n;
        if n == 0 || samples.len() < expected {
            return Err(DiffError::InvalidBuffer {
                expected,
                actual: samples.len(),
            });
        }

        let mut data = Vec::with_capacity(pixels * CHANNELS);
        for pixel in samples[..expected].chunks_exact(n) {
            if n <= 2 {
                data.extend_from_slice(&[pixel[0]; CHANNELS]);
            } else {
                data.extend_from_slice(&pixel[..CHANNELS]);
            }
        }

        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True when there is nothing to compare
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// RGB triple at `(x, y)`, or `None` outside the raster
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * CHANNELS;
        Some([self.data[offset], self.data[offset + 1], self.data[offset + 2]])
    }

    /// Overwrite one pixel; out-of-range writes are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * CHANNELS;
        self.data[offset..offset + CHANNELS].copy_from_slice(&rgb);
    }

    /// One row of RGB samples
    pub(crate) fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * CHANNELS;
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    pub fn into_image(self) -> RgbImage {
        // Length is checked at construction, so from_raw cannot fail here;
        // fall back to a blank image rather than panic.
        let (width, height) = (self.width, self.height);
        RgbImage::from_raw(width, height, self.data).unwrap_or_else(|| RgbImage::new(width, height))
    }
}

impl From<RgbImage> for PixelBuffer {
    fn from(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}
