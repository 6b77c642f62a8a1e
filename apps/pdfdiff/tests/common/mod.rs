//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use pdfdiff::{PageSource, PixelBuffer, Result};

/// One synthetic page
#[derive(Clone)]
pub struct FakePage {
    pub raster: PixelBuffer,
    pub text: String,
}

impl FakePage {
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            raster: PixelBuffer::filled(width, height, [255, 255, 255]),
            text: String::new(),
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// Paint a filled square
    pub fn with_mark(mut self, x: u32, y: u32, size: u32, rgb: [u8; 3]) -> Self {
        for yy in y..(y + size).min(self.raster.height()) {
            for xx in x..(x + size).min(self.raster.width()) {
                self.raster.set_pixel(xx, yy, rgb);
            }
        }
        self
    }
}

/// In-memory document that upscales its rasters by pixel repetition
pub struct FakeDocument {
    pages: Vec<FakePage>,
    renders: AtomicUsize,
}

impl FakeDocument {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            renders: AtomicUsize::new(0),
        }
    }

    pub fn blank(count: usize, width: u32, height: u32) -> Self {
        Self::new(vec![FakePage::blank(width, height); count])
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl PageSource for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page: usize) -> Option<(f32, f32)> {
        self.pages
            .get(page)
            .map(|p| (p.raster.width() as f32, p.raster.height() as f32))
    }

    fn pixmap(&self, page: usize, scale: f32) -> Result<PixelBuffer> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        let Some(page) = self.pages.get(page) else {
            return Ok(PixelBuffer::empty());
        };
        let src = &page.raster;
        let width = (src.width() as f32 * scale) as u32;
        let height = (src.height() as f32 * scale) as u32;

        let mut out = PixelBuffer::filled(width, height, [0, 0, 0]);
        for y in 0..height {
            for x in 0..width {
                let sx = ((x as f32 / scale) as u32).min(src.width() - 1);
                let sy = ((y as f32 / scale) as u32).min(src.height() - 1);
                if let Some(rgb) = src.pixel(sx, sy) {
                    out.set_pixel(x, y, rgb);
                }
            }
        }
        Ok(out)
    }

    fn text(&self, page: usize) -> Result<String> {
        Ok(self.pages.get(page).map(|p| p.text.clone()).unwrap_or_default())
    }
}
