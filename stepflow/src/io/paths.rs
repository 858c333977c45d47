//! Canonical on-disk locations for one agent.

use std::path::PathBuf;

use crate::io::config::{CONFIG_FILE, StepflowConfig};

/// All canonical paths for an agent under a project root.
#[derive(Debug, Clone)]
pub struct AgentPaths {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub agent_dir: PathBuf,
    pub registry_path: PathBuf,
    pub schema_dir: PathBuf,
}

impl AgentPaths {
    pub fn new(root: impl Into<PathBuf>, agent_id: &str, config: &StepflowConfig) -> Self {
        let root = root.into();
        let agent_dir = root.join(&config.agent_dir).join(agent_id);
        Self {
            config_path: root.join(CONFIG_FILE),
            registry_path: agent_dir.join(&config.registry_file),
            schema_dir: agent_dir.join(&config.schema_dir),
            agent_dir,
            root,
        }
    }
}
