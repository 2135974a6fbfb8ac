//! # ossim-common
//!
//! Foundation layer for ossim: identifiers, policy selectors, and errors.
//!
//! This crate provides the vocabulary shared by the simulation core, the
//! engine, and the command-line front end. It has no internal dependencies
//! and should be kept minimal.
//!
//! ## Modules
//!
//! - [`types`] - Identifier newtypes, policy enums, protection flags
//! - [`utils`] - Utility functions and helpers (errors)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod types;
pub mod utils;

// Re-export commonly used types at crate root
pub use types::{FitStrategy, FrameId, PageId, ProcessId, Protection, ReplacementPolicy, Tick};
pub use utils::error::{Error, Result};
