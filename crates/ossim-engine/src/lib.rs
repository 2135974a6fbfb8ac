//! # ossim-engine
//!
//! The entry point for ossim: a simulation session owning every component,
//! its configuration, and a scriptable command layer.
//!
//! ## Modules
//!
//! - [`simulator`] - Simulator struct and lifecycle
//! - [`config`] - Configuration options
//! - [`command`] - Serialisable commands and their outputs
//! - [`outcome`] - Success/failure envelope

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod command;
pub mod config;
pub mod outcome;
pub mod simulator;

pub use command::{Command, CommandOutput, Snapshot};
pub use config::Config;
pub use outcome::{ErrorInfo, Outcome};
pub use simulator::Simulator;
