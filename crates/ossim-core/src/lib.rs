//! # ossim-core
//!
//! Core layer for ossim: the resource-management state machines.
//!
//! This crate holds the four simulated components. None of them calls into
//! another; each owns one ordered collection and exposes operations that keep
//! that collection's invariants intact. It depends only on `ossim-common`.
//!
//! ## Modules
//!
//! - [`memory`] - Fixed-block contiguous allocation and fragmentation analysis
//! - [`paging`] - Demand paging with FIFO, LRU, Optimal, and Clock replacement
//! - [`segmentation`] - Variable-size segments with hole merging and compaction
//! - [`scheduling`] - FCFS, SJF, and Round-Robin CPU scheduling

pub mod memory;
pub mod paging;
pub mod scheduling;
pub mod segmentation;

// Re-export commonly used types
pub use memory::{ContiguousAllocator, FragmentationStats, MemoryBlock};
pub use paging::{AccessOutcome, PagingManager};
pub use scheduling::{Algorithm, CpuScheduler, ScheduleReport};
pub use segmentation::{Region, SegmentationManager};
