//! Registry document load/save.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::types::StepRegistry;
use crate::error::RegistryError;

/// Load the registry at `path` and check it belongs to `agent_id`.
///
/// Only identity is checked here; structural validation is separate so a
/// partially authored registry can still be inspected.
#[instrument(skip_all, fields(agent_id = %agent_id, path = %path.display()))]
pub fn load_registry(agent_id: &str, path: &Path) -> Result<StepRegistry, RegistryError> {
    if !path.is_file() {
        return Err(RegistryError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = fs::read_to_string(path).map_err(|source| RegistryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let registry: StepRegistry =
        serde_json::from_str(&contents).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    if registry.agent_id != agent_id {
        return Err(RegistryError::AgentIdMismatch {
            requested: agent_id.to_string(),
            loaded: registry.agent_id,
        });
    }
    debug!(
        steps = registry.steps.len(),
        flows = registry.flows.len(),
        "registry loaded"
    );
    Ok(registry)
}

/// Serialize a registry as pretty JSON with a trailing newline.
pub fn render_registry(registry: &StepRegistry) -> Result<String> {
    let mut buf = serde_json::to_string_pretty(registry).context("serialize registry")?;
    buf.push('\n');
    Ok(buf)
}

/// Atomically write a registry to disk (temp file + rename).
pub fn write_registry(path: &Path, registry: &StepRegistry) -> Result<()> {
    debug!(path = %path.display(), agent_id = %registry.agent_id, "writing registry");
    let buf = render_registry(registry)?;
    let parent = path
        .parent()
        .with_context(|| format!("registry path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp registry {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace registry {}", path.display()))?;
    Ok(())
}
