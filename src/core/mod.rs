//! Core business logic module
//!
//! Side effects go through the collaborators in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`manifest`] - Manifest (modbuild.toml) parsing, validation and path layout
//! - [`module`] - Module definition
//! - [`sync`] - Repository sync
//! - [`detect`] - Build-system detection
//! - [`executor`] - Build execution
//! - [`build_env`] - Build environment setup
//! - [`state`] - Build-state store
//! - [`orchestrator`] - Incremental build orchestration
//! - [`clean`] - Clean build outputs

pub mod build_env;
pub mod clean;
pub mod detect;
pub mod executor;
pub mod manifest;
pub mod module;
pub mod orchestrator;
pub mod state;
pub mod sync;
