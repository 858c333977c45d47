//! Step registry data model.
//!
//! These types mirror the registry document one-to-one. They hold no behavior
//! beyond small accessors; lookups live in [`crate::core::registry`] and checks
//! in the validator modules.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Intent value that declares the task complete.
pub const CLOSING_INTENT: &str = "closing";

/// Closed set of step kinds. Tool permissions are derived from this alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Produces output; cannot declare completion.
    Work,
    /// Checks prior output; cannot declare completion.
    Verification,
    /// The only kind allowed to complete the task and take boundary actions.
    Closure,
}

impl StepKind {
    pub const ALL: [StepKind; 3] = [StepKind::Work, StepKind::Verification, StepKind::Closure];

    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Work => "work",
            StepKind::Verification => "verification",
            StepKind::Closure => "closure",
        }
    }

    pub fn can_declare_completion(self) -> bool {
        self == StepKind::Closure
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(StepKind::Work),
            "verification" => Ok(StepKind::Verification),
            "closure" => Ok(StepKind::Closure),
            other => Err(format!(
                "unknown step kind '{other}' (expected work, verification, or closure)"
            )),
        }
    }
}

/// Location of a step's structured output schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSchemaRef {
    /// Schema file, relative to the agent's schema directory.
    #[serde(default)]
    pub file: String,
    /// Pointer into `file`, e.g. `#/definitions/initial.issue`.
    #[serde(default)]
    pub pointer: String,
}

/// Contract on the intent a step may declare in its structured output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredGate {
    #[serde(default)]
    pub allowed_intents: Vec<String>,
    /// Dot-path into the structured output, e.g. `next_action.action`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_field: Option<String>,
    /// Internal pointer (`#/...`) into the resolved output schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_schema_ref: Option<String>,
}

/// One registered step.
///
/// Scalar fields default to empty on load so structural validation can report
/// every missing field at once; `kind` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    #[serde(default)]
    pub step_id: String,
    #[serde(default)]
    pub name: String,
    pub kind: StepKind,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub edition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adaptation: Option<String>,
    #[serde(default)]
    pub fallback_key: String,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub uses_stdin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema_ref: Option<OutputSchemaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_gate: Option<StructuredGate>,
}

impl StepDefinition {
    /// Conventional prompt location: `<base>/<domain>/<action>/<target>/f_<edition>[_<adaptation>].md`.
    pub fn prompt_path(&self, base: &Path) -> PathBuf {
        let file = match self.adaptation.as_deref().filter(|a| !a.is_empty()) {
            Some(adaptation) => format!("f_{}_{}.md", self.edition, adaptation),
            None => format!("f_{}.md", self.edition),
        };
        base.join(&self.domain)
            .join(&self.action)
            .join(&self.target)
            .join(file)
    }
}

/// Aggregate root: every step and flow for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRegistry {
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub version: String,
    /// Base directory for externally stored prompt content.
    #[serde(default)]
    pub base_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_step: Option<String>,
    #[serde(default)]
    pub steps: BTreeMap<String, StepDefinition>,
    /// Flow name to ordered step ids.
    #[serde(default)]
    pub flows: BTreeMap<String, Vec<String>>,
}

/// Allow/deny lists for one step kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSet {
    pub allowed: &'static [&'static str],
    pub denied: &'static [&'static str],
    /// Whether shell commands are screened for boundary patterns.
    pub block_boundary_bash: bool,
}

/// Outcome of a permission check. A denial is a normal value, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionResult {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PermissionResult {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}
