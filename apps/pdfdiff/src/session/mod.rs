//! Comparison session
//!
//! Holds the two document slots, the active page and mode, and the diff
//! result cached for that page. The session is an ordinary value owned by
//! the front end; there is no global engine.
//!
//! # State machine
//!
//! ```text
//!            load(A|B)              load(other slot)
//!   Empty ─────────────▶ SingleLoaded ─────────────▶ BothLoaded
//!     ▲                      │  ▲                        │
//!     └──── unload ──────────┘  └──────── unload ────────┘
//! ```
//!
//! Loading a slot always replaces its previous document. Only `BothLoaded`
//! runs comparisons; `refresh` in any other state is a no-op.
//!
//! # Concurrency
//!
//! The cached region set sits behind a `parking_lot::RwLock`. `refresh`
//! computes without holding the lock and swaps the new `Arc<RegionSet>` in
//! with a single write, so a concurrent `render` sees either the old set
//! or the new one, never a partial one.

mod duplicates;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

pub use duplicates::{check_duplicates, file_hash, Duplicate};

use crate::config::DiffConfig;
use crate::error::{DiffError, Result};
use crate::overlay::Overlay;
use crate::raster::{RasterDiffer, RegionSet};
use crate::source::PageSource;
use crate::text::{TextDiffer, TextMatchResult};

/// Document slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::A, Slot::B];

    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => f.write_str("A"),
            Slot::B => f.write_str("B"),
        }
    }
}

/// Which slots are populated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Empty,
    SingleLoaded,
    BothLoaded,
}

/// What `refresh` compares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    #[default]
    Visual,
    Text,
}

/// Result of a `refresh`
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Session is not `BothLoaded`; nothing ran
    Skipped,
    /// Visual diff ran; these regions are now cached
    Visual(Arc<RegionSet>),
    /// Pages could not be compared (size mismatch or empty raster); the
    /// cache holds an empty set
    Degraded,
    /// Text comparison ran
    Text(TextMatchResult),
}

/// A document loaded into a slot
pub struct LoadedDocument {
    path: PathBuf,
    source: Box<dyn PageSource>,
}

impl LoadedDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &dyn PageSource {
        self.source.as_ref()
    }

    pub fn page_count(&self) -> usize {
        self.source.page_count()
    }
}

#[derive(Default)]
struct Slots {
    a: Option<LoadedDocument>,
    b: Option<LoadedDocument>,
}

impl Slots {
    fn get(&self, slot: Slot) -> Option<&LoadedDocument> {
        match slot {
            Slot::A => self.a.as_ref(),
            Slot::B => self.b.as_ref(),
        }
    }

    fn set(&mut self, slot: Slot, doc: Option<LoadedDocument>) {
        match slot {
            Slot::A => self.a = doc,
            Slot::B => self.b = doc,
        }
    }
}

/// Last comparison result
struct PageCache {
    /// Page the cached result belongs to
    page: Option<usize>,
    regions: Arc<RegionSet>,
    text: Option<TextMatchResult>,
    dirty: bool,
}

impl PageCache {
    fn reset() -> Self {
        Self {
            page: None,
            regions: Arc::new(RegionSet::new()),
            text: None,
            dirty: true,
        }
    }
}

/// One open comparison between two documents
pub struct ComparisonSession {
    config: DiffConfig,
    differ: RasterDiffer,
    text_differ: TextDiffer,
    overlay: Overlay,
    slots: Slots,
    mode: CompareMode,
    current_page: usize,
    total_pages: usize,
    cache: RwLock<PageCache>,
}

impl Default for ComparisonSession {
    fn default() -> Self {
        Self::with_config(DiffConfig::default())
    }
}

impl ComparisonSession {
    /// Create a session, rejecting invalid tunables
    pub fn new(config: DiffConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: DiffConfig) -> Self {
        Self {
            differ: RasterDiffer::from_config(&config),
            text_differ: TextDiffer::default(),
            overlay: Overlay::from_config(&config),
            config,
            slots: Slots::default(),
            mode: CompareMode::default(),
            current_page: 0,
            total_pages: 0,
            cache: RwLock::new(PageCache::reset()),
        }
    }

    // ========================================================================
    // Slots
    // ========================================================================

    /// Load a document into `slot`, replacing whatever was there.
    ///
    /// Returns the document's page count.
    pub fn load<S>(&mut self, slot: Slot, path: impl Into<PathBuf>, source: S) -> usize
    where
        S: PageSource + 'static,
    {
        let path = path.into();
        let pages = source.page_count();
        tracing::info!(%slot, path = %path.display(), pages, "Loaded document");

        self.slots.set(
            slot,
            Some(LoadedDocument {
                path,
                source: Box::new(source),
            }),
        );
        self.reset_after_load();
        pages
    }

    /// Empty a slot
    pub fn unload(&mut self, slot: Slot) {
        if self.slots.get(slot).is_some() {
            tracing::info!(%slot, "Unloaded document");
        }
        self.slots.set(slot, None);
        self.reset_after_load();
    }

    fn reset_after_load(&mut self) {
        self.total_pages = self.compute_total_pages();
        self.current_page = 0;
        *self.cache.write() = PageCache::reset();
    }

    fn compute_total_pages(&self) -> usize {
        let count = |slot| self.slots.get(slot).map(LoadedDocument::page_count);
        match (count(Slot::A), count(Slot::B)) {
            (Some(a), Some(b)) => a.min(b),
            (Some(n), None) | (None, Some(n)) => n,
            (None, None) => 0,
        }
    }

    pub fn document(&self, slot: Slot) -> Option<&LoadedDocument> {
        self.slots.get(slot)
    }

    pub fn path(&self, slot: Slot) -> Option<&Path> {
        self.slots.get(slot).map(LoadedDocument::path)
    }

    pub fn state(&self) -> SessionState {
        match (self.slots.a.is_some(), self.slots.b.is_some()) {
            (true, true) => SessionState::BothLoaded,
            (false, false) => SessionState::Empty,
            _ => SessionState::SingleLoaded,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::BothLoaded
    }

    /// Check whether both slots hold the same file
    pub fn check_duplicates(&self) -> Result<Option<Duplicate>> {
        match (self.path(Slot::A), self.path(Slot::B)) {
            (Some(a), Some(b)) => check_duplicates(a, b),
            _ => Ok(None),
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Replace the tunables; the cached result is marked stale
    pub fn set_config(&mut self, config: DiffConfig) -> Result<()> {
        config.validate()?;
        self.differ = RasterDiffer::from_config(&config);
        self.overlay = Overlay::from_config(&config);
        self.config = config;
        self.cache.write().dirty = true;
        Ok(())
    }

    /// Overlay opacity only affects drawing, not the cached result
    pub fn set_opacity(&mut self, opacity_percent: u8) {
        let opacity_percent = opacity_percent.min(100);
        self.config.opacity_percent = opacity_percent;
        self.overlay.opacity_percent = opacity_percent;
    }

    pub fn set_text_differ(&mut self, text_differ: TextDiffer) {
        self.text_differ = text_differ;
        self.cache.write().dirty = true;
    }

    pub fn mode(&self) -> CompareMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CompareMode) {
        if self.mode != mode {
            self.mode = mode;
            self.cache.write().dirty = true;
        }
    }

    // ========================================================================
    // Pages
    // ========================================================================

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// One-based page label, `"0 / 0"` when nothing is loaded
    pub fn page_label(&self) -> String {
        if self.total_pages == 0 {
            return "0 / 0".to_string();
        }
        format!("{} / {}", self.current_page + 1, self.total_pages)
    }

    /// Jump to `page` and refresh it
    pub fn go_to(&mut self, page: usize) -> Result<RefreshOutcome> {
        if page >= self.total_pages {
            return Err(DiffError::PageRange {
                page,
                total: self.total_pages,
            });
        }
        self.current_page = page;
        self.refresh(page)
    }

    /// Step forward; `None` when already on the last page
    pub fn next_page(&mut self) -> Result<Option<RefreshOutcome>> {
        if self.current_page + 1 >= self.total_pages {
            return Ok(None);
        }
        self.go_to(self.current_page + 1).map(Some)
    }

    /// Step back; `None` when already on the first page
    pub fn prev_page(&mut self) -> Result<Option<RefreshOutcome>> {
        if self.current_page == 0 || self.total_pages == 0 {
            return Ok(None);
        }
        self.go_to(self.current_page - 1).map(Some)
    }

    /// Re-run the comparison for the current page
    pub fn refresh_current(&self) -> Result<RefreshOutcome> {
        self.refresh(self.current_page)
    }

    /// Size of a page in one slot
    pub fn page_size(&self, slot: Slot, page: usize) -> Option<(f32, f32)> {
        self.slots.get(slot)?.source.page_size(page)
    }

    /// Size of `page`, preferring slot A and falling back to slot B
    pub fn reference_page_size(&self, page: usize) -> Option<(f32, f32)> {
        self.page_size(Slot::A, page)
            .filter(|(w, _)| *w > 0.0)
            .or_else(|| self.page_size(Slot::B, page))
    }

    // ========================================================================
    // Comparison
    // ========================================================================

    /// Recompute and cache the diff for `page`
    pub fn refresh(&self, page: usize) -> Result<RefreshOutcome> {
        let (Some(a), Some(b)) = (self.slots.get(Slot::A), self.slots.get(Slot::B)) else {
            return Ok(RefreshOutcome::Skipped);
        };
        if page >= self.total_pages {
            return Err(DiffError::PageRange {
                page,
                total: self.total_pages,
            });
        }

        match self.mode {
            CompareMode::Visual => self.refresh_visual(page, a, b),
            CompareMode::Text => self.refresh_text(page, a, b),
        }
    }

    fn refresh_visual(&self, page: usize, a: &LoadedDocument, b: &LoadedDocument) -> Result<RefreshOutcome> {
        let pix_a = a.source.pixmap(page, 1.0)?;
        let pix_b = b.source.pixmap(page, 1.0)?;

        if pix_a.is_empty() || pix_b.is_empty() {
            tracing::debug!(page, "Empty raster, nothing to compare");
            self.store(page, RegionSet::new(), None);
            return Ok(RefreshOutcome::Degraded);
        }

        match self.differ.diff(&pix_a, &pix_b) {
            Ok(regions) => {
                let regions = self.store(page, regions, None);
                Ok(RefreshOutcome::Visual(regions))
            }
            Err(DiffError::DimensionMismatch { left, right }) => {
                tracing::debug!(page, ?left, ?right, "Page sizes differ, showing no overlay");
                self.store(page, RegionSet::new(), None);
                Ok(RefreshOutcome::Degraded)
            }
            Err(e) => Err(e),
        }
    }

    fn refresh_text(&self, page: usize, a: &LoadedDocument, b: &LoadedDocument) -> Result<RefreshOutcome> {
        let text_a = a.source.text(page)?;
        let text_b = b.source.text(page)?;
        let result = self.text_differ.compare(&text_a, &text_b);

        tracing::debug!(page, ratio = result.ratio, "Text comparison complete");
        self.store(page, RegionSet::new(), Some(result));
        Ok(RefreshOutcome::Text(result))
    }

    /// Swap in a new result under one write lock
    fn store(&self, page: usize, regions: RegionSet, text: Option<TextMatchResult>) -> Arc<RegionSet> {
        let regions = Arc::new(regions);
        let mut cache = self.cache.write();
        *cache = PageCache {
            page: Some(page),
            regions: Arc::clone(&regions),
            text,
            dirty: false,
        };
        regions
    }

    /// Cached regions for the last refreshed page
    pub fn regions(&self) -> Arc<RegionSet> {
        Arc::clone(&self.cache.read().regions)
    }

    /// Page the cached result belongs to
    pub fn cached_page(&self) -> Option<usize> {
        self.cache.read().page
    }

    pub fn text_result(&self) -> Option<TextMatchResult> {
        self.cache.read().text
    }

    /// True until `refresh` succeeds after a load or settings change
    pub fn is_dirty(&self) -> bool {
        self.cache.read().dirty
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Render the current page of `slot` at `scale`, with highlights when
    /// `show_diff` is set and the session is in visual mode.
    ///
    /// Returns `None` for an empty slot or a page the slot does not have.
    pub fn render(&self, slot: Slot, scale: f32, show_diff: bool) -> Result<Option<RgbImage>> {
        let Some(doc) = self.slots.get(slot) else {
            return Ok(None);
        };
        let page = self.current_page;
        if page >= doc.page_count() {
            return Ok(None);
        }

        let raster = doc.source.pixmap(page, scale)?;
        if raster.is_empty() {
            return Ok(None);
        }
        let base = raster.into_image();

        if !show_diff || self.mode != CompareMode::Visual {
            return Ok(Some(base));
        }

        // Snapshot the set; never draw highlights computed for another page
        let regions = {
            let cache = self.cache.read();
            if cache.page != Some(page) {
                return Ok(Some(base));
            }
            Arc::clone(&cache.regions)
        };

        Ok(Some(self.overlay.composite(base, &regions, scale)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{DiffRegion, PixelBuffer};

    /// Pages are solid white with optional black squares
    struct FakeSource {
        pages: Vec<(u32, u32, Option<(u32, u32, u32)>)>,
        texts: Vec<String>,
    }

    impl FakeSource {
        fn blank(count: usize) -> Self {
            Self {
                pages: vec![(20, 20, None); count],
                texts: vec!["same text".to_string(); count],
            }
        }
    }

    impl PageSource for FakeSource {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_size(&self, page: usize) -> Option<(f32, f32)> {
            self.pages.get(page).map(|(w, h, _)| (*w as f32, *h as f32))
        }

        fn pixmap(&self, page: usize, scale: f32) -> Result<PixelBuffer> {
            let Some(&(w, h, mark)) = self.pages.get(page) else {
                return Ok(PixelBuffer::empty());
            };
            let (w, h) = ((w as f32 * scale) as u32, (h as f32 * scale) as u32);
            let mut buf = PixelBuffer::filled(w, h, [255, 255, 255]);
            if let Some((x, y, size)) = mark {
                for yy in y..y + size {
                    for xx in x..x + size {
                        buf.set_pixel(xx, yy, [0, 0, 0]);
                    }
                }
            }
            Ok(buf)
        }

        fn text(&self, page: usize) -> Result<String> {
            Ok(self.texts.get(page).cloned().unwrap_or_default())
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut session = ComparisonSession::default();
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(session.total_pages(), 0);

        session.load(Slot::B, "b.pdf", FakeSource::blank(4));
        assert_eq!(session.state(), SessionState::SingleLoaded);
        assert_eq!(session.total_pages(), 4);

        session.load(Slot::A, "a.pdf", FakeSource::blank(2));
        assert_eq!(session.state(), SessionState::BothLoaded);
        assert_eq!(session.total_pages(), 2);

        // Reloading replaces the slot's content
        session.load(Slot::A, "a2.pdf", FakeSource::blank(6));
        assert_eq!(session.total_pages(), 4);
        assert_eq!(session.path(Slot::A), Some(Path::new("a2.pdf")));

        session.unload(Slot::B);
        assert_eq!(session.state(), SessionState::SingleLoaded);
        assert_eq!(session.total_pages(), 6);
    }

    #[test]
    fn test_refresh_is_noop_until_both_loaded() {
        let mut session = ComparisonSession::default();
        assert_eq!(session.refresh(0).unwrap(), RefreshOutcome::Skipped);

        session.load(Slot::A, "a.pdf", FakeSource::blank(1));
        assert_eq!(session.refresh(0).unwrap(), RefreshOutcome::Skipped);
        assert!(session.is_dirty());
    }

    #[test]
    fn test_refresh_page_range() {
        let mut session = ComparisonSession::default();
        session.load(Slot::A, "a.pdf", FakeSource::blank(3));
        session.load(Slot::B, "b.pdf", FakeSource::blank(1));

        let err = session.refresh(1).unwrap_err();
        assert!(matches!(err, DiffError::PageRange { page: 1, total: 1 }));
    }

    #[test]
    fn test_refresh_visual_caches_regions() {
        let mut session = ComparisonSession::default();
        let mut marked = FakeSource::blank(1);
        marked.pages[0].2 = Some((10, 5, 5));
        session.load(Slot::A, "a.pdf", FakeSource::blank(1));
        session.load(Slot::B, "b.pdf", marked);
        assert!(session.is_dirty());

        let outcome = session.refresh(0).unwrap();
        let expected: RegionSet = [DiffRegion::new(10, 5, 5, 5)].into_iter().collect();
        assert_eq!(outcome, RefreshOutcome::Visual(Arc::new(expected.clone())));
        assert_eq!(*session.regions(), expected);
        assert_eq!(session.cached_page(), Some(0));
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_dimension_mismatch_degrades() {
        let mut session = ComparisonSession::default();
        let mut wide = FakeSource::blank(1);
        wide.pages[0] = (40, 20, None);
        session.load(Slot::A, "a.pdf", FakeSource::blank(1));
        session.load(Slot::B, "b.pdf", wide);

        assert_eq!(session.refresh(0).unwrap(), RefreshOutcome::Degraded);
        assert!(session.regions().is_empty());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_text_mode() {
        let mut session = ComparisonSession::default();
        let mut other = FakeSource::blank(1);
        other.texts[0] = "abd".into();
        let mut base = FakeSource::blank(1);
        base.texts[0] = "abc".into();
        session.load(Slot::A, "a.pdf", base);
        session.load(Slot::B, "b.pdf", other);
        session.set_mode(CompareMode::Text);

        let RefreshOutcome::Text(result) = session.refresh(0).unwrap() else {
            panic!("expected text outcome");
        };
        assert!((result.ratio - 2.0 / 3.0).abs() < 1e-9);
        assert!(!result.is_exact);
        assert_eq!(session.text_result(), Some(result));
        assert!(session.regions().is_empty());
    }

    #[test]
    fn test_navigation() {
        let mut session = ComparisonSession::default();
        session.load(Slot::A, "a.pdf", FakeSource::blank(3));
        session.load(Slot::B, "b.pdf", FakeSource::blank(3));
        assert_eq!(session.page_label(), "1 / 3");

        assert!(session.prev_page().unwrap().is_none());
        assert!(session.next_page().unwrap().is_some());
        assert!(session.next_page().unwrap().is_some());
        assert!(session.next_page().unwrap().is_none());
        assert_eq!(session.current_page(), 2);
        assert_eq!(session.page_label(), "3 / 3");
        assert_eq!(session.cached_page(), Some(2));

        assert!(matches!(
            session.go_to(3),
            Err(DiffError::PageRange { page: 3, total: 3 })
        ));
        assert_eq!(session.current_page(), 2);
    }

    #[test]
    fn test_load_resets_page() {
        let mut session = ComparisonSession::default();
        session.load(Slot::A, "a.pdf", FakeSource::blank(3));
        session.load(Slot::B, "b.pdf", FakeSource::blank(3));
        session.go_to(2).unwrap();

        session.load(Slot::B, "c.pdf", FakeSource::blank(3));
        assert_eq!(session.current_page(), 0);
        assert_eq!(session.cached_page(), None);
        assert!(session.is_dirty());
    }

    #[test]
    fn test_render_with_and_without_highlight() {
        let mut session = ComparisonSession::default();
        let mut marked = FakeSource::blank(1);
        marked.pages[0].2 = Some((0, 0, 5));
        session.load(Slot::A, "a.pdf", FakeSource::blank(1));
        session.load(Slot::B, "b.pdf", marked);
        session.set_opacity(100);
        session.refresh(0).unwrap();

        let plain = session.render(Slot::A, 1.0, false).unwrap().unwrap();
        assert_eq!(plain.get_pixel(0, 0).0, [255, 255, 255]);

        let lit = session.render(Slot::A, 2.0, true).unwrap().unwrap();
        assert_eq!(lit.dimensions(), (40, 40));
        assert_eq!(lit.get_pixel(9, 9).0, [255, 0, 0]);
        assert_eq!(lit.get_pixel(10, 10).0, [255, 255, 255]);
    }

    #[test]
    fn test_render_single_slot_and_empty_slot() {
        let mut session = ComparisonSession::default();
        assert!(session.render(Slot::A, 1.0, true).unwrap().is_none());

        session.load(Slot::B, "b.pdf", FakeSource::blank(1));
        assert!(session.render(Slot::A, 1.0, true).unwrap().is_none());
        assert!(session.render(Slot::B, 1.0, true).unwrap().is_some());
    }

    #[test]
    fn test_reference_page_size_falls_back() {
        let mut session = ComparisonSession::default();
        assert_eq!(session.reference_page_size(0), None);

        session.load(Slot::B, "b.pdf", FakeSource::blank(1));
        assert_eq!(session.reference_page_size(0), Some((20.0, 20.0)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(ComparisonSession::new(DiffConfig::default().with_grid_size(0)).is_err());

        let mut session = ComparisonSession::default();
        assert!(session.set_config(DiffConfig::default().with_opacity(200)).is_err());
        assert_eq!(session.config().opacity_percent, 30);
    }

    #[test]
    fn test_slot_other() {
        assert_eq!(Slot::A.other(), Slot::B);
        assert_eq!(Slot::B.other(), Slot::A);
        assert_eq!(Slot::ALL.len(), 2);
    }
}
