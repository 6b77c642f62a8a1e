//! LRU raster cache in front of a page source
//!
//! Zooming and flipping back and forth between pages re-requests the same
//! rasters. Rendering is by far the slowest step, so finished rasters are
//! kept in a bounded LRU keyed by page and scale.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use super::PageSource;
use crate::error::Result;
use crate::raster::PixelBuffer;

/// Default number of cached rasters
const DEFAULT_CAPACITY: usize = 16;

/// Cache key for a rendered page
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct RasterCacheKey {
    pub page: usize,
    /// Scale * 100 to avoid float hashing
    pub scale: u32,
}

impl RasterCacheKey {
    pub fn new(page: usize, scale: f32) -> Self {
        Self {
            page,
            scale: (scale * 100.0).round() as u32,
        }
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

struct CacheInner {
    rasters: LruCache<RasterCacheKey, PixelBuffer>,
    hits: u64,
    misses: u64,
}

/// Page source wrapper that memoizes `pixmap`
pub struct CachedSource<S> {
    inner: S,
    cache: Mutex<CacheInner>,
}

impl<S: PageSource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(CacheInner {
                rasters: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
        }
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.lock();
        CacheStats {
            hits: cache.hits,
            misses: cache.misses,
            entries: cache.rasters.len(),
            capacity: cache.rasters.cap().get(),
        }
    }

    pub fn clear(&self) {
        self.cache.lock().rasters.clear();
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: PageSource> PageSource for CachedSource<S> {
    fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    fn page_size(&self, page: usize) -> Option<(f32, f32)> {
        self.inner.page_size(page)
    }

    fn pixmap(&self, page: usize, scale: f32) -> Result<PixelBuffer> {
        let key = RasterCacheKey::new(page, scale);

        {
            let mut cache = self.cache.lock();
            if let Some(raster) = cache.rasters.get(&key).cloned() {
                cache.hits += 1;
                return Ok(raster);
            }
            cache.misses += 1;
        }

        // Render outside the lock; a concurrent miss on the same key only
        // costs a duplicate render.
        let raster = self.inner.pixmap(page, scale)?;
        if !raster.is_empty() {
            self.cache.lock().rasters.put(key, raster.clone());
        }
        Ok(raster)
    }

    fn text(&self, page: usize) -> Result<String> {
        self.inner.text(page)
    }
}
