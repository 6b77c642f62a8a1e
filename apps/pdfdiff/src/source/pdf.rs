//! MuPDF-backed page source
//!
//! MuPDF documents are not thread-safe. Like the rest of the crate's
//! sources, this one keeps only the document bytes or path, opens a fresh
//! `mupdf::Document` for each operation, and serializes those operations
//! through a `parking_lot::Mutex`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mupdf::{Colorspace, Document, Matrix};
use parking_lot::Mutex;

use super::PageSource;
use crate::error::{DiffError, Result};
use crate::raster::PixelBuffer;

const PDF_MIME: &str = "application/pdf";

/// Lower and upper bound for render scale
const MIN_SCALE: f32 = 0.1;
const MAX_SCALE: f32 = 8.0;

#[derive(Clone)]
enum PdfData {
    Bytes(Arc<Vec<u8>>),
    Path(PathBuf),
}

/// Page source for one PDF file
pub struct PdfSource {
    data: PdfData,
    /// Page sizes at scale 1.0, read once at open
    page_sizes: Vec<(f32, f32)>,
    lock: Mutex<()>,
}

impl PdfSource {
    /// Open a PDF from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = Document::open(&*path.to_string_lossy())
            .map_err(|e| DiffError::DocumentLoad(format!("{}: {}", path.display(), e)))?;
        let page_sizes = read_page_sizes(&doc)?;

        tracing::debug!(path = %path.display(), pages = page_sizes.len(), "Opened PDF");

        Ok(Self {
            data: PdfData::Path(path),
            page_sizes,
            lock: Mutex::new(()),
        })
    }

    /// Open a PDF held in memory
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if !data.starts_with(b"%PDF") {
            return Err(DiffError::DocumentLoad("missing %PDF header".into()));
        }
        let doc = Document::from_bytes(&data, PDF_MIME)?;
        let page_sizes = read_page_sizes(&doc)?;

        Ok(Self {
            data: PdfData::Bytes(Arc::new(data)),
            page_sizes,
            lock: Mutex::new(()),
        })
    }

    fn open_document(&self) -> Result<Document> {
        match &self.data {
            PdfData::Bytes(data) => Document::from_bytes(data, PDF_MIME).map_err(Into::into),
            PdfData::Path(path) => Document::open(&*path.to_string_lossy()).map_err(Into::into),
        }
    }

    /// Run `f` against a freshly opened document, one caller at a time
    fn with_doc<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Document) -> Result<R>,
    {
        let _guard = self.lock.lock();
        let doc = self.open_document()?;
        f(&doc)
    }
}

fn read_page_sizes(doc: &Document) -> Result<Vec<(f32, f32)>> {
    let count = doc.page_count()?;
    let mut sizes = Vec::with_capacity(count.max(0) as usize);
    for index in 0..count {
        let bounds = doc.load_page(index)?.bounds()?;
        sizes.push((bounds.x1 - bounds.x0, bounds.y1 - bounds.y0));
    }
    Ok(sizes)
}

impl PageSource for PdfSource {
    fn page_count(&self) -> usize {
        self.page_sizes.len()
    }

    fn page_size(&self, page: usize) -> Option<(f32, f32)> {
        self.page_sizes.get(page).copied()
    }

    fn pixmap(&self, page: usize, scale: f32) -> Result<PixelBuffer> {
        if page >= self.page_count() {
            return Ok(PixelBuffer::empty());
        }
        let scale = scale.clamp(MIN_SCALE, MAX_SCALE);

        self.with_doc(|doc| {
            let page = doc.load_page(page as i32)?;
            let matrix = Matrix::new_scale(scale, scale);
            let pixmap = page.to_pixmap(&matrix, &Colorspace::device_rgb(), false, true)?;

            PixelBuffer::from_samples(
                pixmap.width() as u32,
                pixmap.height() as u32,
                pixmap.samples(),
                pixmap.n() as usize,
            )
        })
    }

    fn text(&self, page: usize) -> Result<String> {
        if page >= self.page_count() {
            return Ok(String::new());
        }
        self.with_doc(|doc| {
            let page = doc.load_page(page as i32)?;
            page.to_text().map_err(Into::into)
        })
    }
}
