//! I/O helpers for stepflow commands.

pub mod config;
pub mod paths;
pub mod registry_store;
