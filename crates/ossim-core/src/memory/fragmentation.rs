//! Fragmentation analysis.
//!
//! Pure functions over block lists. Two views are provided:
//!
//! | View | Used by | Measures |
//! |------|---------|----------|
//! | [`FragmentationStats`] | contiguous allocator | absolute waste: unused tail of allocated blocks, free total |
//! | [`HoleStats`] | segmentation | how much free space is unusable as one chunk |

use serde::Serialize;

use super::contiguous::MemoryBlock;

/// Internal and external fragmentation of a fixed-block layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FragmentationStats {
    /// Unused space inside allocated blocks.
    pub internal: u64,
    /// Total size of free blocks.
    pub external: u64,
}

impl FragmentationStats {
    /// Computes fragmentation for a block list.
    #[must_use]
    pub fn of(blocks: &[MemoryBlock]) -> Self {
        blocks.iter().fold(Self::default(), |mut stats, block| {
            match block.allocation() {
                Some(_) => stats.internal += block.internal_fragmentation(),
                None => stats.external += block.size(),
            }
            stats
        })
    }

    /// Total wasted space.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.internal + self.external
    }
}

/// Free-hole statistics of a variable-partition layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HoleStats {
    /// Sum of all free hole sizes.
    pub total_free: u64,
    /// Number of free holes.
    pub free_blocks: usize,
    /// Size of the largest free hole, 0 if there is none.
    pub largest_free: u64,
    /// `(1 - largest_free / total_free) * 100`, or 0 with no free space.
    pub external_fragmentation: f64,
}

impl HoleStats {
    /// Computes hole statistics from the sizes of the free holes.
    pub fn from_holes<I>(holes: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        let (total_free, free_blocks, largest_free) = holes
            .into_iter()
            .fold((0u64, 0usize, 0u64), |(total, count, largest), size| {
                (total + size, count + 1, largest.max(size))
            });

        let external_fragmentation = if total_free > 0 {
            (1.0 - largest_free as f64 / total_free as f64) * 100.0
        } else {
            0.0
        };

        Self {
            total_free,
            free_blocks,
            largest_free,
            external_fragmentation,
        }
    }
}
