//! Infrastructure layer
//!
//! Handles all I/O operations: filesystem, external processes, version
//! control and the host system.

pub mod command;
pub mod dirs;
pub mod distro;
pub mod filesystem;
pub mod git;
pub mod package_manager;
