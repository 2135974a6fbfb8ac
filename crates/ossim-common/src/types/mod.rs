//! Core type definitions for ossim.
//!
//! This module contains the fundamental types used by every component:
//! - Identifier types ([`ProcessId`], [`PageId`], [`FrameId`])
//! - Policy selectors ([`FitStrategy`], [`ReplacementPolicy`])
//! - Segment protection flags ([`Protection`])
//! - Logical time ([`Tick`])

mod id;
mod policy;
mod protection;

pub use id::{FrameId, PageId, ProcessId};
pub use policy::{FitStrategy, ReplacementPolicy};
pub use protection::Protection;

/// Logical clock value.
///
/// Paging stamps load and use times with a counter that advances once per
/// access, so ordering between accesses is exact and reproducible.
pub type Tick = u64;
