//! Contiguous memory allocation.
//!
//! - [`contiguous`] - Fixed-origin blocks handed out whole under a fit strategy
//! - [`fragmentation`] - Internal/external fragmentation statistics
//!
//! Blocks never split or merge here. Freeing a block leaves it exactly where
//! it was, which is what makes the fragmentation figures interesting to watch.

pub mod contiguous;
pub mod fragmentation;

pub use contiguous::{Allocation, ContiguousAllocator, MemoryBlock, MemoryUsage, Placement};
pub use fragmentation::{FragmentationStats, HoleStats};
