//! modbuild - incremental module builder
//!
//! Syncs an ordered list of source modules from git, detects how each one
//! builds, and builds and installs them into a shared prefix. A module is
//! rebuilt only when its upstream revision changed since its last successful
//! build, or when a module before it in the list was rebuilt.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Orchestration, state and build logic
//! - [`infra`] - Infrastructure layer (filesystem, processes, git, host packages)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
