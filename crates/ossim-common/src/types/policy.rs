//! Policy selectors.
//!
//! Strategy names arriving from configuration files or the command line are
//! parsed into these closed enums at the boundary. Everything past the parser
//! works with the enum, so an unknown name can never reach the simulation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::error::Error;

/// Lowercases a policy name and strips separators, so that `"First-Fit"`,
/// `"first_fit"` and `"firstfit"` all compare equal.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Rule for choosing which free block satisfies a contiguous allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitStrategy {
    /// First free block large enough.
    #[default]
    FirstFit,
    /// Smallest free block large enough.
    BestFit,
    /// Largest free block.
    WorstFit,
}

impl FitStrategy {
    /// All strategies, in presentation order.
    pub const ALL: [Self; 3] = [Self::FirstFit, Self::BestFit, Self::WorstFit];

    /// Returns the canonical name of the strategy.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FirstFit => "first-fit",
            Self::BestFit => "best-fit",
            Self::WorstFit => "worst-fit",
        }
    }

    /// Picks a block for a request of `requested` units.
    ///
    /// `free_blocks` yields `(index, size)` pairs of the free blocks in
    /// physical order. Ties are broken by the earliest index. Returns the
    /// index of the chosen block, or `None` if no free block is large enough.
    pub fn select<I>(self, requested: u64, free_blocks: I) -> Option<usize>
    where
        I: IntoIterator<Item = (usize, u64)>,
    {
        let mut candidates = free_blocks
            .into_iter()
            .filter(|&(_, size)| size >= requested);

        match self {
            Self::FirstFit => candidates.next().map(|(index, _)| index),
            Self::BestFit => candidates
                .fold(None, |best: Option<(usize, u64)>, (index, size)| match best {
                    Some((_, best_size)) if best_size <= size => best,
                    _ => Some((index, size)),
                })
                .map(|(index, _)| index),
            Self::WorstFit => candidates
                .fold(None, |worst: Option<(usize, u64)>, (index, size)| match worst {
                    Some((_, worst_size)) if worst_size >= size => worst,
                    _ => Some((index, size)),
                })
                .map(|(index, _)| index),
        }
    }
}

impl fmt::Display for FitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FitStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "firstfit" | "first" => Ok(Self::FirstFit),
            "bestfit" | "best" => Ok(Self::BestFit),
            "worstfit" | "worst" => Ok(Self::WorstFit),
            _ => Err(Error::UnknownPolicy {
                name: s.to_string(),
                expected: "first-fit, best-fit, worst-fit",
            }),
        }
    }
}

/// Page-replacement policy used when a fault finds no empty frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReplacementPolicy {
    /// Evict the page that was loaded first.
    #[default]
    #[serde(rename = "FIFO", alias = "fifo")]
    Fifo,
    /// Evict the least recently used page.
    #[serde(rename = "LRU", alias = "lru")]
    Lru,
    /// Evict the page whose next use lies farthest in the future.
    #[serde(rename = "Optimal", alias = "optimal", alias = "OPT")]
    Optimal,
    /// Second-chance sweep over reference bits.
    #[serde(rename = "Clock", alias = "clock")]
    Clock,
}

impl ReplacementPolicy {
    /// All policies, in presentation order.
    pub const ALL: [Self; 4] = [Self::Fifo, Self::Lru, Self::Optimal, Self::Clock];

    /// Returns the canonical name of the policy.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fifo => "FIFO",
            Self::Lru => "LRU",
            Self::Optimal => "Optimal",
            Self::Clock => "Clock",
        }
    }

    /// Returns true if the policy needs the future reference string.
    #[must_use]
    pub fn requires_lookahead(&self) -> bool {
        matches!(self, Self::Optimal)
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReplacementPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "fifo" => Ok(Self::Fifo),
            "lru" => Ok(Self::Lru),
            "optimal" | "opt" => Ok(Self::Optimal),
            "clock" => Ok(Self::Clock),
            _ => Err(Error::UnknownPolicy {
                name: s.to_string(),
                expected: "FIFO, LRU, Optimal, Clock",
            }),
        }
    }
}
