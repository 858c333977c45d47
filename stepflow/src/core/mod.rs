//! Deterministic, pure logic for step registries and tool permissions.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod gate;
pub mod policy;
pub mod registry;
pub mod structure;
pub mod types;
