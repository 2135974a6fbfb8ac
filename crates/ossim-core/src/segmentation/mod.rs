//! Segmented address space with hole merging and compaction.
//!
//! The space `[0, total_size)` is covered by an ordered list of regions, each
//! either a named segment or a free hole. The list is kept gap-free and
//! sorted by base, and no two free holes are ever adjacent: freeing a segment
//! coalesces it with its free neighbours straight away.
//!
//! ```text
//!  before free(b)       after free(b)        after compact()
//! ┌────┬────┬────┐     ┌────┬─────────┐     ┌────┬─────────┐
//! │ a  │ b  │free│     │ a  │  free   │     │ a  │  free   │
//! └────┴────┴────┘     └────┴─────────┘     └────┴─────────┘
//! ```

use ossim_common::utils::error::ensure_positive;
use ossim_common::{Error, Protection, Result};
use serde::Serialize;

use crate::memory::HoleStats;

/// Address-space size used by [`SegmentationManager::default`].
pub const DEFAULT_SPACE: u64 = 1024;

/// One entry of the address space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Region {
    /// An allocated segment.
    Segment {
        /// Segment name.
        name: String,
        /// First address.
        base: u64,
        /// Length in units.
        size: u64,
        /// Access rights.
        protection: Protection,
    },
    /// A free hole.
    Free {
        /// First address.
        base: u64,
        /// Length in units.
        size: u64,
    },
}

impl Region {
    /// Returns the first address of the region.
    #[must_use]
    pub fn base(&self) -> u64 {
        match self {
            Self::Segment { base, .. } | Self::Free { base, .. } => *base,
        }
    }

    /// Returns the length of the region.
    #[must_use]
    pub fn size(&self) -> u64 {
        match self {
            Self::Segment { size, .. } | Self::Free { size, .. } => *size,
        }
    }

    /// Returns the last address of the region (inclusive).
    #[must_use]
    pub fn end(&self) -> u64 {
        self.base() + self.size() - 1
    }

    /// Returns true for free holes.
    #[must_use]
    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free { .. })
    }

    /// Returns the segment name, `None` for holes.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Segment { name, .. } => Some(name),
            Self::Free { .. } => None,
        }
    }

    fn relocate(&mut self, new_base: u64) {
        match self {
            Self::Segment { base, .. } | Self::Free { base, .. } => *base = new_base,
        }
    }

    fn grow(&mut self, extra: u64) {
        match self {
            Self::Segment { size, .. } | Self::Free { size, .. } => *size += extra,
        }
    }
}

/// Row of a batch segment table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentTableRow {
    /// Requested segment name.
    pub segment: String,
    /// Base address, `None` if the request failed.
    pub base: Option<u64>,
    /// Requested size.
    pub limit: u64,
    /// Access rights of the placed segment.
    pub protection: Option<Protection>,
    /// Failure reason for unplaced segments.
    pub error: Option<String>,
}

/// Variable-partition address space.
#[derive(Debug, Clone)]
pub struct SegmentationManager {
    total_size: u64,
    regions: Vec<Region>,
}

impl Default for SegmentationManager {
    fn default() -> Self {
        Self {
            total_size: DEFAULT_SPACE,
            regions: vec![Region::Free {
                base: 0,
                size: DEFAULT_SPACE,
            }],
        }
    }
}

impl SegmentationManager {
    /// Creates a space of `total_size` units holding one free hole.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `total_size` is zero.
    pub fn new(total_size: u64) -> Result<Self> {
        ensure_positive("total size", total_size)?;
        Ok(Self {
            total_size,
            regions: vec![Region::Free {
                base: 0,
                size: total_size,
            }],
        })
    }

    /// Resets the space to one free hole `[0, total_size)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `total_size` is zero; state is kept then.
    pub fn initialize(&mut self, total_size: u64) -> Result<()> {
        *self = Self::new(total_size)?;
        Ok(())
    }

    /// Places a segment in the first hole large enough for it.
    ///
    /// Unspecified protection defaults to read/write. Returns the placed
    /// segment.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a zero size, an empty name, or a name already in use
    /// - `OutOfMemory` if no hole is large enough
    pub fn allocate(
        &mut self,
        name: impl Into<String>,
        size: u64,
        protection: Option<Protection>,
    ) -> Result<Region> {
        let name = name.into();
        ensure_positive("segment size", size)?;
        if name.trim().is_empty() {
            return Err(Error::invalid("segment name must not be empty"));
        }
        if self.find(&name).is_some() {
            return Err(Error::invalid(format!("segment '{name}' already exists")));
        }

        let index = self
            .regions
            .iter()
            .position(|r| r.is_free() && r.size() >= size)
            .ok_or_else(|| Error::OutOfMemory {
                requested: size,
                largest_free: self.fragmentation().largest_free,
            })?;

        let (base, hole_size) = (self.regions[index].base(), self.regions[index].size());
        let segment = Region::Segment {
            name,
            base,
            size,
            protection: protection.unwrap_or_default(),
        };

        if hole_size == size {
            self.regions[index] = segment.clone();
        } else {
            self.regions[index] = Region::Free {
                base: base + size,
                size: hole_size - size,
            };
            self.regions.insert(index, segment.clone());
        }

        Ok(segment)
    }

    /// Frees the named segment and merges it with adjacent holes.
    ///
    /// Returns the hole the segment ended up in.
    ///
    /// # Errors
    ///
    /// Returns `SegmentNotFound` if no segment has that name.
    pub fn deallocate(&mut self, name: &str) -> Result<Region> {
        let index = self
            .find(name)
            .ok_or_else(|| Error::SegmentNotFound(name.to_string()))?;

        let (freed_base, freed_size) = (self.regions[index].base(), self.regions[index].size());
        self.regions[index] = Region::Free {
            base: freed_base,
            size: freed_size,
        };
        self.merge_holes();

        let hole = self
            .regions
            .iter()
            .find(|r| r.base() <= freed_base && freed_base <= r.end())
            .cloned()
            .unwrap_or(Region::Free {
                base: freed_base,
                size: 0,
            });
        Ok(hole)
    }

    /// Coalesces every run of adjacent holes into one.
    fn merge_holes(&mut self) {
        let mut merged: Vec<Region> = Vec::with_capacity(self.regions.len());
        for region in std::mem::take(&mut self.regions) {
            if region.is_free() && merged.last().is_some_and(Region::is_free) {
                if let Some(last) = merged.last_mut() {
                    last.grow(region.size());
                }
            } else {
                merged.push(region);
            }
        }
        self.regions = merged;
    }

    /// Slides every segment down to base 0, keeping their order, and leaves
    /// all free space as one trailing hole.
    ///
    /// Returns the fragmentation after compacting.
    pub fn compact(&mut self) -> HoleStats {
        let mut next_base = 0;
        let mut compacted: Vec<Region> = std::mem::take(&mut self.regions)
            .into_iter()
            .filter(|r| !r.is_free())
            .map(|mut segment| {
                segment.relocate(next_base);
                next_base += segment.size();
                segment
            })
            .collect();

        if next_base < self.total_size {
            compacted.push(Region::Free {
                base: next_base,
                size: self.total_size - next_base,
            });
        }
        self.regions = compacted;
        self.fragmentation()
    }

    /// Computes external fragmentation of the current layout.
    #[must_use]
    pub fn fragmentation(&self) -> HoleStats {
        HoleStats::from_holes(self.regions.iter().filter(|r| r.is_free()).map(Region::size))
    }

    /// Re-initialises the space and places each `(name, size)` in turn.
    ///
    /// Requests that cannot be placed are reported in the table rather than
    /// aborting the batch.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `total_size` is zero.
    pub fn allocate_all<'a, I>(&mut self, total_size: u64, requests: I) -> Result<Vec<SegmentTableRow>>
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        self.initialize(total_size)?;

        let rows = requests
            .into_iter()
            .map(|(name, size)| match self.allocate(name, size, None) {
                Ok(segment) => SegmentTableRow {
                    segment: name.to_string(),
                    base: Some(segment.base()),
                    limit: size,
                    protection: match segment {
                        Region::Segment { protection, .. } => Some(protection),
                        Region::Free { .. } => None,
                    },
                    error: None,
                },
                Err(e) => SegmentTableRow {
                    segment: name.to_string(),
                    base: None,
                    limit: size,
                    protection: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();
        Ok(rows)
    }

    /// Returns the index of the named segment.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.regions.iter().position(|r| r.name() == Some(name))
    }

    /// Returns the regions in address order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Returns the segments in address order.
    pub fn segments(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(|r| !r.is_free())
    }

    /// Returns the size of the address space.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Returns the space taken by segments.
    #[must_use]
    pub fn used_size(&self) -> u64 {
        self.segments().map(Region::size).sum()
    }

    /// Checks the layout invariants: regions tile `[0, total_size)` in order
    /// and no two holes touch.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let tiles = self
            .regions
            .windows(2)
            .all(|w| w[0].base() + w[0].size() == w[1].base());
        let starts_at_zero = self.regions.first().is_some_and(|r| r.base() == 0);
        let covers = self.regions.iter().map(Region::size).sum::<u64>() == self.total_size;
        let merged = self
            .regions
            .windows(2)
            .all(|w| !(w[0].is_free() && w[1].is_free()));
        let non_empty = self.regions.iter().all(|r| r.size() > 0);
        tiles && starts_at_zero && covers && merged && non_empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(regions: &[Region]) -> Vec<(bool, u64, u64)> {
        regions
            .iter()
            .map(|r| (r.is_free(), r.base(), r.size()))
            .collect()
    }

    #[test]
    fn test_initialize() {
        let seg = SegmentationManager::new(1000).unwrap();
        assert_eq!(layout(seg.regions()), vec![(true, 0, 1000)]);
        assert!(SegmentationManager::new(0).is_err());
    }

    #[test]
    fn test_allocate_splits_hole() {
        let mut seg = SegmentationManager::new(1000).unwrap();
        let placed = seg.allocate("code", 300, None).unwrap();

        assert_eq!(placed.base(), 0);
        assert_eq!(
            layout(seg.regions()),
            vec![(false, 0, 300), (true, 300, 700)]
        );
        assert!(seg.is_well_formed());
    }

    #[test]
    fn test_allocate_exact_fit_in_place() {
        let mut seg = SegmentationManager::new(500).unwrap();
        seg.allocate("a", 500, None).unwrap();
        assert_eq!(layout(seg.regions()), vec![(false, 0, 500)]);
        assert_eq!(seg.fragmentation().total_free, 0);
    }

    #[test]
    fn test_first_fit_over_holes() {
        let mut seg = SegmentationManager::new(1000).unwrap();
        seg.allocate("a", 100, None).unwrap();
        seg.allocate("b", 200, None).unwrap();
        seg.allocate("c", 100, None).unwrap();
        seg.deallocate("a").unwrap();

        // The 100-unit hole at 0 is too small; the trailing hole is used.
        let placed = seg.allocate("d", 150, None).unwrap();
        assert_eq!(placed.base(), 400);

        let placed = seg.allocate("e", 80, None).unwrap();
        assert_eq!(placed.base(), 0);
        assert!(seg.is_well_formed());
    }

    #[test]
    fn test_out_of_memory() {
        let mut seg = SegmentationManager::new(300).unwrap();
        seg.allocate("a", 100, None).unwrap();
        seg.allocate("b", 100, None).unwrap();
        seg.deallocate("a").unwrap();

        let before = seg.regions().to_vec();
        let err = seg.allocate("c", 150, None).unwrap_err();
        assert_eq!(
            err,
            Error::OutOfMemory {
                requested: 150,
                largest_free: 100
            }
        );
        assert_eq!(seg.regions(), before.as_slice());
    }

    #[test]
    fn test_duplicate_and_empty_names() {
        let mut seg = SegmentationManager::new(300).unwrap();
        seg.allocate("a", 100, None).unwrap();
        assert_eq!(seg.allocate("a", 10, None).unwrap_err().code(), "INVALID_INPUT");
        assert_eq!(seg.allocate(" ", 10, None).unwrap_err().code(), "INVALID_INPUT");
        assert_eq!(seg.allocate("b", 0, None).unwrap_err().code(), "INVALID_INPUT");
    }

    #[test]
    fn test_protection() {
        let mut seg = SegmentationManager::new(300).unwrap();
        let code = seg
            .allocate("code", 100, Some(Protection::READ_EXECUTE))
            .unwrap();
        let data = seg.allocate("data", 100, None).unwrap();

        assert!(matches!(code, Region::Segment { protection, .. } if protection == Protection::READ_EXECUTE));
        assert!(matches!(data, Region::Segment { protection, .. } if protection == Protection::READ_WRITE));
    }

    #[test]
    fn test_deallocate_merges_both_sides() {
        let mut seg = SegmentationManager::new(400).unwrap();
        for name in ["a", "b", "c", "d"] {
            seg.allocate(name, 100, None).unwrap();
        }
        seg.deallocate("a").unwrap();
        seg.deallocate("c").unwrap();
        let hole = seg.deallocate("b").unwrap();

        assert_eq!(hole, Region::Free { base: 0, size: 300 });
        assert_eq!(
            layout(seg.regions()),
            vec![(true, 0, 300), (false, 300, 100)]
        );
        assert!(seg.is_well_formed());
    }

    #[test]
    fn test_deallocate_unknown() {
        let mut seg = SegmentationManager::new(400).unwrap();
        let err = seg.deallocate("heap").unwrap_err();
        assert_eq!(err, Error::SegmentNotFound("heap".to_string()));
    }

    #[test]
    fn test_compact() {
        let mut seg = SegmentationManager::new(1000).unwrap();
        seg.allocate("a", 100, None).unwrap();
        seg.allocate("b", 200, None).unwrap();
        seg.allocate("c", 300, None).unwrap();
        seg.deallocate("b").unwrap();

        let stats_before = seg.fragmentation();
        assert_eq!(stats_before.free_blocks, 2);
        // Holes of 200 and 400: a third of the free space is stranded.
        assert!((stats_before.external_fragmentation - 100.0 / 3.0).abs() < 1e-9);

        let stats = seg.compact();
        assert_eq!(
            layout(seg.regions()),
            vec![(false, 0, 100), (false, 100, 300), (true, 400, 600)]
        );
        assert_eq!(seg.regions()[1].name(), Some("c"));
        assert_eq!(stats.free_blocks, 1);
        assert_eq!(stats.external_fragmentation, 0.0);

        let once = seg.regions().to_vec();
        seg.compact();
        assert_eq!(seg.regions(), once.as_slice());
    }

    #[test]
    fn test_compact_full_space_has_no_hole() {
        let mut seg = SegmentationManager::new(200).unwrap();
        seg.allocate("a", 200, None).unwrap();
        seg.compact();
        assert_eq!(layout(seg.regions()), vec![(false, 0, 200)]);
    }

    #[test]
    fn test_allocate_all() {
        let mut seg = SegmentationManager::new(50).unwrap();
        let rows = seg
            .allocate_all(500, [("code", 200), ("data", 250), ("stack", 100)])
            .unwrap();

        assert_eq!(rows[0].base, Some(0));
        assert_eq!(rows[1].base, Some(200));
        assert_eq!(rows[2].base, None);
        assert!(rows[2].error.is_some());
        assert_eq!(seg.total_size(), 500);
        assert_eq!(seg.used_size(), 450);
    }

    #[test]
    fn test_region_end_and_serde() {
        let region = Region::Free { base: 100, size: 50 };
        assert_eq!(region.end(), 149);

        let json = serde_json::to_value(&region).unwrap();
        assert_eq!(json["type"], "free");
        assert_eq!(json["base"], 100);
    }
}
