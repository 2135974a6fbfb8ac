//! Simulator configuration.

use ossim_common::utils::error::{ensure_positive, ensure_ratio};
use ossim_common::{Error, FitStrategy, ReplacementPolicy, Result, Tick};
use ossim_core::paging::{DEFAULT_MEMORY_SIZE, DEFAULT_PAGE_SIZE};
use ossim_core::segmentation::DEFAULT_SPACE;
use serde::{Deserialize, Serialize};

/// Start-up parameters for a [`Simulator`](crate::Simulator).
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Strategy used when an allocation request names none.
    pub fit_strategy: FitStrategy,
    /// Initial page-replacement policy.
    pub replacement_policy: ReplacementPolicy,
    /// Physical memory size for paging.
    pub memory_size: u64,
    /// Page and frame size.
    pub page_size: u64,
    /// Size of the segmented address space.
    pub segment_space: u64,
    /// Fixed blocks handed to the contiguous allocator on start-up.
    pub initial_blocks: Vec<u64>,
    /// Round-robin quantum used when a run names none.
    pub quantum: Tick,
    /// Locality degree for generated reference strings.
    pub locality: f64,
    /// Write fraction for batch paging simulation.
    pub write_ratio: f64,
    /// RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fit_strategy: FitStrategy::default(),
            replacement_policy: ReplacementPolicy::default(),
            memory_size: DEFAULT_MEMORY_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            segment_space: DEFAULT_SPACE,
            initial_blocks: Vec::new(),
            quantum: 2,
            locality: 0.7,
            write_ratio: 0.3,
            seed: None,
        }
    }
}

impl Config {
    /// Sets the default fit strategy.
    #[must_use]
    pub fn with_fit_strategy(mut self, strategy: FitStrategy) -> Self {
        self.fit_strategy = strategy;
        self
    }

    /// Sets the initial replacement policy.
    #[must_use]
    pub fn with_replacement_policy(mut self, policy: ReplacementPolicy) -> Self {
        self.replacement_policy = policy;
        self
    }

    /// Sets physical memory geometry.
    #[must_use]
    pub fn with_memory(mut self, memory_size: u64, page_size: u64) -> Self {
        self.memory_size = memory_size;
        self.page_size = page_size;
        self
    }

    /// Sets the segmented address-space size.
    #[must_use]
    pub fn with_segment_space(mut self, size: u64) -> Self {
        self.segment_space = size;
        self
    }

    /// Sets the blocks the contiguous allocator starts with.
    #[must_use]
    pub fn with_blocks(mut self, sizes: impl Into<Vec<u64>>) -> Self {
        self.initial_blocks = sizes.into();
        self
    }

    /// Sets the default round-robin quantum.
    #[must_use]
    pub fn with_quantum(mut self, quantum: Tick) -> Self {
        self.quantum = quantum;
        self
    }

    /// Sets the default locality degree.
    #[must_use]
    pub fn with_locality(mut self, locality: f64) -> Self {
        self.locality = locality;
        self
    }

    /// Sets the default write ratio.
    #[must_use]
    pub fn with_write_ratio(mut self, ratio: f64) -> Self {
        self.write_ratio = ratio;
        self
    }

    /// Seeds the RNG for reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks that sizes are positive and ratios lie in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("memory size", self.memory_size)?;
        ensure_positive("page size", self.page_size)?;
        if self.memory_size < self.page_size {
            return Err(Error::invalid(format!(
                "memory size {} is smaller than page size {}",
                self.memory_size, self.page_size
            )));
        }
        ensure_positive("segment space", self.segment_space)?;
        ensure_positive("time quantum", self.quantum)?;
        for &size in &self.initial_blocks {
            ensure_positive("block size", size)?;
        }
        ensure_ratio("locality degree", self.locality)?;
        ensure_ratio("write ratio", self.write_ratio)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.memory_size / config.page_size, 4);
        assert_eq!(config.quantum, 2);
    }

    #[test]
    fn test_builder() {
        let config = Config::default()
            .with_fit_strategy(FitStrategy::BestFit)
            .with_replacement_policy(ReplacementPolicy::Lru)
            .with_memory(8192, 512)
            .with_blocks([100, 200, 50])
            .with_seed(9);

        assert_eq!(config.fit_strategy, FitStrategy::BestFit);
        assert_eq!(config.replacement_policy, ReplacementPolicy::Lru);
        assert_eq!(config.page_size, 512);
        assert_eq!(config.initial_blocks, vec![100, 200, 50]);
        assert_eq!(config.seed, Some(9));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects() {
        let bad = [
            Config::default().with_memory(0, 1024),
            Config::default().with_memory(512, 1024),
            Config::default().with_quantum(0),
            Config::default().with_segment_space(0),
            Config::default().with_blocks([10, 0]),
            Config::default().with_locality(1.5),
            Config::default().with_write_ratio(-0.1),
        ];
        for config in bad {
            assert_eq!(config.validate().unwrap_err().code(), "INVALID_INPUT", "{config:?}");
        }
    }

    #[test]
    fn test_partial_json() {
        let config: Config =
            serde_json::from_str(r#"{"replacement_policy": "LRU", "seed": 3}"#).unwrap();
        assert_eq!(config.replacement_policy, ReplacementPolicy::Lru);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.segment_space, 1024);
    }
}
