//! Diff regions and the per-page region set

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One hot grid cell in page-pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiffRegion {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl DiffRegion {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Exclusive right edge, saturating at `u32::MAX`
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    /// Exclusive bottom edge, saturating at `u32::MAX`
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

/// Regions found on one page.
///
/// Kept in row-major scan order for drawing, but compared as a set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionSet {
    regions: Vec<DiffRegion>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_scan(regions: Vec<DiffRegion>) -> Self {
        Self { regions }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffRegion> {
        self.regions.iter()
    }

    pub fn contains(&self, region: &DiffRegion) -> bool {
        self.regions.contains(region)
    }

    /// Every region of `self` also appears in `other`
    pub fn is_subset(&self, other: &RegionSet) -> bool {
        let other: HashSet<&DiffRegion> = other.regions.iter().collect();
        self.regions.iter().all(|r| other.contains(r))
    }

    /// Smallest rectangle covering all regions
    pub fn bounding_box(&self) -> Option<DiffRegion> {
        let first = self.regions.first()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.right(), first.bottom());
        for r in &self.regions[1..] {
            x0 = x0.min(r.x);
            y0 = y0.min(r.y);
            x1 = x1.max(r.right());
            y1 = y1.max(r.bottom());
        }
        Some(DiffRegion::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Total highlighted area in page pixels
    pub fn covered_area(&self) -> u64 {
        self.regions.iter().map(DiffRegion::area).sum()
    }

    pub fn to_hash_set(&self) -> HashSet<DiffRegion> {
        self.regions.iter().copied().collect()
    }
}

impl PartialEq for RegionSet {
    fn eq(&self, other: &Self) -> bool {
        self.to_hash_set() == other.to_hash_set()
    }
}

impl Eq for RegionSet {}

impl<'a> IntoIterator for &'a RegionSet {
    type Item = &'a DiffRegion;
    type IntoIter = std::slice::Iter<'a, DiffRegion>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}

impl FromIterator<DiffRegion> for RegionSet {
    fn from_iter<I: IntoIterator<Item = DiffRegion>>(iter: I) -> Self {
        let mut regions = Vec::new();
        for region in iter {
            if !regions.contains(&region) {
                regions.push(region);
            }
        }
        Self { regions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_order() {
        let a: RegionSet = [DiffRegion::new(0, 0, 5, 5), DiffRegion::new(5, 0, 5, 5)]
            .into_iter()
            .collect();
        let b: RegionSet = [DiffRegion::new(5, 0, 5, 5), DiffRegion::new(0, 0, 5, 5)]
            .into_iter()
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_collect_drops_duplicates() {
        let set: RegionSet = [DiffRegion::new(0, 0, 5, 5), DiffRegion::new(0, 0, 5, 5)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_subset() {
        let small: RegionSet = [DiffRegion::new(5, 5, 5, 5)].into_iter().collect();
        let big: RegionSet = [DiffRegion::new(0, 0, 5, 5), DiffRegion::new(5, 5, 5, 5)]
            .into_iter()
            .collect();
        assert!(small.is_subset(&big));
        assert!(!big.is_subset(&small));
        assert!(RegionSet::new().is_subset(&small));
    }

    #[test]
    fn test_bounding_box() {
        let set: RegionSet = [DiffRegion::new(10, 20, 5, 5), DiffRegion::new(30, 5, 3, 5)]
            .into_iter()
            .collect();
        assert_eq!(set.bounding_box(), Some(DiffRegion::new(10, 5, 23, 20)));
        assert_eq!(set.covered_area(), 40);
        assert_eq!(RegionSet::new().bounding_box(), None);
    }

    #[test]
    fn test_edges_saturate() {
        let region = DiffRegion::new(u32::MAX - 1, 7, 5, 3);
        assert_eq!(region.right(), u32::MAX);
        assert_eq!(region.bottom(), 10);
    }
}
