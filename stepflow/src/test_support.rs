//! Test-only helpers for building registries and on-disk agent fixtures.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::core::types::{OutputSchemaRef, StepDefinition, StepKind, StepRegistry, StructuredGate};
use crate::io::config::StepflowConfig;
use crate::io::paths::AgentPaths;
use crate::io::registry_store::write_registry;

/// Schema file written by [`TestAgent::with_issue_schema`].
pub const ISSUE_SCHEMA_FILE: &str = "issue.schema.json";
/// Intent pointer matching [`issue_schema`].
pub const ISSUE_INTENT_REF: &str = "#/properties/next_action/properties/action";

/// Create a deterministic step with every required scalar populated.
pub fn step(id: &str, kind: StepKind) -> StepDefinition {
    let (action, target) = id.split_once('.').unwrap_or((id, "default"));
    StepDefinition {
        step_id: id.to_string(),
        name: format!("{id} step"),
        kind,
        domain: "steps".to_string(),
        action: action.to_string(),
        target: target.to_string(),
        edition: "default".to_string(),
        adaptation: None,
        fallback_key: id.replace('.', "_"),
        variables: Vec::new(),
        uses_stdin: false,
        output_schema_ref: None,
        structured_gate: None,
    }
}

/// Create a step gated on `intents`, pointing at `#/definitions/<id>` in the issue schema.
pub fn gated_step(id: &str, kind: StepKind, intents: &[&str]) -> StepDefinition {
    StepDefinition {
        output_schema_ref: Some(OutputSchemaRef {
            file: ISSUE_SCHEMA_FILE.to_string(),
            pointer: format!("#/definitions/{id}"),
        }),
        structured_gate: Some(StructuredGate {
            allowed_intents: intents.iter().map(|s| s.to_string()).collect(),
            intent_field: Some("next_action.action".to_string()),
            intent_schema_ref: Some(ISSUE_INTENT_REF.to_string()),
        }),
        ..step(id, kind)
    }
}

/// Build a registry for `agent_id` from `steps`, keyed by their own ids.
pub fn registry_with(agent_id: &str, steps: Vec<StepDefinition>) -> StepRegistry {
    StepRegistry {
        agent_id: agent_id.to_string(),
        version: "1.0.0".to_string(),
        base_path: "prompts".to_string(),
        entry_step: None,
        steps: steps
            .into_iter()
            .map(|step| (step.step_id.clone(), step))
            .collect(),
        flows: Default::default(),
    }
}

/// Issue schema whose step definitions (one per `step_ids`) share a `next_action`
/// definition with `enum: intents`.
pub fn issue_schema(step_ids: &[&str], intents: &[&str]) -> Value {
    let mut definitions = serde_json::Map::new();
    definitions.insert(
        "next_action".to_string(),
        json!({
            "type": "object",
            "properties": {
                "action": { "type": "string", "enum": intents },
                "reason": { "type": "string" }
            },
            "required": ["action"]
        }),
    );
    for id in step_ids {
        definitions.insert(
            (*id).to_string(),
            json!({
                "type": "object",
                "properties": {
                    "summary": { "type": "string" },
                    "next_action": { "$ref": "#/definitions/next_action" }
                },
                "required": ["summary", "next_action"]
            }),
        );
    }
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "definitions": Value::Object(definitions)
    })
}

/// Temporary project with an agent directory laid out per [`AgentPaths`].
pub struct TestAgent {
    temp: TempDir,
    agent_id: String,
}

impl TestAgent {
    pub fn new(agent_id: &str) -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let agent = Self {
            temp,
            agent_id: agent_id.to_string(),
        };
        fs::create_dir_all(&agent.paths().schema_dir).context("create schema dir")?;
        Ok(agent)
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn paths(&self) -> AgentPaths {
        AgentPaths::new(self.root(), &self.agent_id, &StepflowConfig::default())
    }

    pub fn write_registry(&self, registry: &StepRegistry) -> Result<()> {
        write_registry(&self.paths().registry_path, registry)
    }

    pub fn write_schema(&self, file: &str, schema: &Value) -> Result<()> {
        let path = self.paths().schema_dir.join(file);
        let mut buf = serde_json::to_string_pretty(schema)?;
        buf.push('\n');
        fs::write(&path, buf).with_context(|| format!("write schema {}", path.display()))
    }

    /// Write [`issue_schema`] for every gated step in `registry`.
    pub fn with_issue_schema(&self, registry: &StepRegistry, intents: &[&str]) -> Result<()> {
        let ids: Vec<&str> = registry
            .steps
            .values()
            .filter(|step| step.output_schema_ref.is_some())
            .map(|step| step.step_id.as_str())
            .collect();
        self.write_schema(ISSUE_SCHEMA_FILE, &issue_schema(&ids, intents))
    }
}
