//! Step-flow governance for autonomous coding agents.
//!
//! An agent works through a registry of prompt steps. This crate decides
//! which steps exist, which may end the workflow, and which tools each step
//! may use. The layout keeps pure decisions apart from the filesystem:
//!
//! - **[`core`]**: Registry types, structural checks, intent gates and the
//!   tool policy. No I/O, fully testable in isolation.
//! - **[`schema`]**: Loads JSON Schema files and resolves `$ref`/`allOf`
//!   into self-contained schemas.
//! - **[`io`]**: Config, canonical paths and registry persistence.
//!
//! [`validate`] composes the three registry validators for CI and the CLI.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod schema;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod validate;
