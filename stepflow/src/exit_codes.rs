//! Stable exit codes for stepflow CLI commands.

/// Command succeeded, or the tool/command is permitted.
pub const OK: i32 = 0;
/// Invalid config, registry or schema, or any other error.
pub const INVALID: i32 = 1;
/// `check-tool` or `check-bash` denied the request.
pub const DENIED: i32 = 2;
