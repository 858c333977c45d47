//! Project configuration stored in `stepflow.toml` at the project root.

use std::fs;
use std::path::{Component, Path};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Conventional config file name at the project root.
pub const CONFIG_FILE: &str = "stepflow.toml";

/// Where agent registries and schemas live (TOML).
///
/// All paths are relative to the project root. Missing fields default to the
/// `.agent/<agent_id>/` layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StepflowConfig {
    /// Directory holding one folder per agent.
    pub agent_dir: String,

    /// Registry file name inside `<agent_dir>/<agent_id>/`.
    pub registry_file: String,

    /// Schema base directory inside `<agent_dir>/<agent_id>/`.
    pub schema_dir: String,
}

impl Default for StepflowConfig {
    fn default() -> Self {
        Self {
            agent_dir: ".agent".to_string(),
            registry_file: "steps_registry.json".to_string(),
            schema_dir: "schemas".to_string(),
        }
    }
}

impl StepflowConfig {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("agent_dir", &self.agent_dir),
            ("registry_file", &self.registry_file),
            ("schema_dir", &self.schema_dir),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("{field} must be non-empty"));
            }
            let escapes = Path::new(value)
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
            if escapes {
                return Err(anyhow!(
                    "{field} must be a relative path without '..' (got '{value}')"
                ));
            }
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `StepflowConfig::default()`.
pub fn load_config(path: &Path) -> Result<StepflowConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = StepflowConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: StepflowConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &StepflowConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
