//! Typed errors for registry loading, validation, and schema resolution.
//!
//! Permission denials are not errors; see [`crate::core::types::PermissionResult`].

use std::path::PathBuf;

use thiserror::Error;

/// Pointer shown in [`SchemaError::PointerNotFound`] as a known-good shape.
pub const EXAMPLE_POINTER: &str = "#/definitions/initial.issue";

/// Failures raised while loading or validating a step registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("agent id mismatch: requested '{requested}' but registry declares '{loaded}'")]
    AgentIdMismatch { requested: String, loaded: String },

    #[error("read registry {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse registry {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("step '{step_id}' already exists in registry")]
    DuplicateStep { step_id: String },

    #[error("step registry validation failed:\n- {}", .errors.join("\n- "))]
    Invalid { errors: Vec<String> },

    #[error("structured gate validation failed:\n- {}", .errors.join("\n- "))]
    InvalidGate { errors: Vec<String> },

    #[error("intent enum validation failed:\n- {}", .errors.join("\n- "))]
    IntentEnumMismatch { errors: Vec<String> },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Failures raised by [`crate::schema::SchemaResolver`].
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("schema file '{file}' escapes the schema base directory")]
    OutsideBaseDir { file: String },

    #[error("read schema {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse schema {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid schema pointer '{pointer}': expected '#/...' (JSON Pointer)")]
    InvalidPointer { pointer: String },

    #[error(
        "schema pointer '{pointer}' not found in {file}; \
         check that the definition exists under \"definitions\" or \"$defs\" (e.g. \"{example}\")",
        example = EXAMPLE_POINTER
    )]
    PointerNotFound { pointer: String, file: String },

    #[error("circular $ref: {}", .chain.join(" -> "))]
    CircularRef { chain: Vec<String> },

    #[error("invalid output schema: {message}")]
    InvalidSchema { message: String },
}

/// Failures raised when a step's structured output violates its gate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("step '{step_id}' has no structured gate")]
    NoGate { step_id: String },

    #[error("step '{step_id}': intent field '{field}' missing or not a string")]
    MissingIntent { step_id: String, field: String },

    #[error("step '{step_id}': intent '{intent}' not in allowedIntents [{}]", .allowed.join(", "))]
    IntentNotAllowed {
        step_id: String,
        intent: String,
        allowed: Vec<String>,
    },

    #[error("step '{step_id}' is a {kind} step and cannot declare '{intent}'; only closure steps may complete")]
    CompletionOutsideClosure {
        step_id: String,
        kind: String,
        intent: String,
    },
}
