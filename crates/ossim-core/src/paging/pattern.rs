//! Reference-string generation and the static (non-demand) layout.

use ossim_common::utils::error::{ensure_positive, ensure_ratio, ensure_u32};
use ossim_common::{FrameId, PageId, Result};
use rand::Rng;
use serde::Serialize;

/// Generates a reference string with tunable locality.
///
/// The first page is drawn uniformly. After each access the next page is, with
/// probability `locality`, a neighbour of the current one (one step up or
/// down, wrapping around `page_count`), and otherwise a uniform jump.
///
/// # Errors
///
/// Returns `InvalidInput` if `page_count` is zero or `locality` lies outside
/// `[0, 1]`.
pub fn generate_access_pattern<R: Rng>(
    page_count: u32,
    access_count: usize,
    locality: f64,
    rng: &mut R,
) -> Result<Vec<PageId>> {
    ensure_positive("page count", u64::from(page_count))?;
    ensure_ratio("locality degree", locality)?;

    let mut pattern = Vec::with_capacity(access_count);
    let mut current = rng.gen_range(0..page_count);

    for _ in 0..access_count {
        pattern.push(PageId::new(current));

        current = if rng.gen_bool(locality) {
            if rng.gen_bool(0.5) {
                (current + 1) % page_count
            } else {
                current.checked_sub(1).unwrap_or(page_count - 1)
            }
        } else {
            rng.gen_range(0..page_count)
        };
    }

    Ok(pattern)
}

/// Page-to-frame mapping when a process is loaded up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticLayout {
    /// One entry per page: the frame it occupies, or `None` if memory ran out.
    pub mappings: Vec<(PageId, Option<FrameId>)>,
    /// Frames left over after every page was placed.
    pub unused_frames: Vec<FrameId>,
}

impl StaticLayout {
    /// Number of pages that did not fit.
    #[must_use]
    pub fn missing_pages(&self) -> usize {
        self.mappings.iter().filter(|(_, f)| f.is_none()).count()
    }
}

/// Loads page `i` into frame `i` for as long as frames last.
///
/// # Errors
///
/// Returns `InvalidInput` if any size is zero or a page or frame count does
/// not fit in a `u32`.
pub fn static_layout(process_size: u64, page_size: u64, memory_size: u64) -> Result<StaticLayout> {
    ensure_positive("process size", process_size)?;
    ensure_positive("page size", page_size)?;
    ensure_positive("memory size", memory_size)?;

    let pages = ensure_u32("page count", process_size.div_ceil(page_size))?;
    let frames = ensure_u32("frame count", memory_size / page_size)?;

    let mappings = (0..pages)
        .map(|i| (PageId::new(i), (i < frames).then(|| FrameId::new(i))))
        .collect();
    let unused_frames = (pages..frames).map(FrameId::new).collect();

    Ok(StaticLayout {
        mappings,
        unused_frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_pattern_length_and_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let pattern = generate_access_pattern(8, 200, 0.7, &mut rng).unwrap();
        assert_eq!(pattern.len(), 200);
        assert!(pattern.iter().all(|p| p.as_u32() < 8));
    }

    #[test]
    fn test_full_locality_moves_to_neighbours() {
        let mut rng = StdRng::seed_from_u64(42);
        let pattern = generate_access_pattern(10, 100, 1.0, &mut rng).unwrap();
        for pair in pattern.windows(2) {
            let (a, b) = (pair[0].as_u32(), pair[1].as_u32());
            assert!(b == (a + 1) % 10 || b == (a + 9) % 10, "{a} -> {b}");
        }
    }

    #[test]
    fn test_pattern_is_reproducible_with_seed() {
        let a = generate_access_pattern(16, 50, 0.5, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = generate_access_pattern(16, 50, 0.5, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_page_pattern() {
        let mut rng = StdRng::seed_from_u64(1);
        let pattern = generate_access_pattern(1, 5, 0.7, &mut rng).unwrap();
        assert!(pattern.iter().all(|p| p.as_u32() == 0));
    }

    #[test]
    fn test_pattern_rejects_bad_input() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate_access_pattern(0, 5, 0.7, &mut rng).is_err());
        assert!(generate_access_pattern(4, 5, 1.2, &mut rng).is_err());
        assert!(generate_access_pattern(4, 0, 0.7, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_static_layout_more_pages_than_frames() {
        let layout = static_layout(5000, 1000, 3000).unwrap();
        assert_eq!(layout.mappings.len(), 5);
        assert_eq!(layout.mappings[2], (PageId::new(2), Some(FrameId::new(2))));
        assert_eq!(layout.mappings[3], (PageId::new(3), None));
        assert_eq!(layout.missing_pages(), 2);
        assert!(layout.unused_frames.is_empty());
    }

    #[test]
    fn test_neighbour_steps_near_u32_max() {
        let mut rng = StdRng::seed_from_u64(9);
        let pattern = generate_access_pattern(u32::MAX, 200, 1.0, &mut rng).unwrap();
        assert_eq!(pattern.len(), 200);
        assert!(pattern.iter().all(|p| p.as_u32() < u32::MAX));
    }

    #[test]
    fn test_static_layout_rejects_oversized_counts() {
        let err = static_layout((1 << 32) + 2, 1, 8).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
        let err = static_layout(8, 1, 1 << 32).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_static_layout_spare_frames() {
        let layout = static_layout(1500, 1000, 4000).unwrap();
        assert_eq!(layout.mappings.len(), 2);
        assert_eq!(layout.unused_frames, vec![FrameId::new(2), FrameId::new(3)]);
    }
}
