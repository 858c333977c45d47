//! Registry validators and the `stepflow validate` orchestration.
//!
//! Three validators compose, each usable on its own:
//! 1. [`validate_step_registry`]: required fields and key/id agreement.
//! 2. [`validate_intent_schema_ref`]: gate well-formedness.
//! 3. [`validate_intent_schema_enums`]: gate intents equal the schema enum.
//!
//! All three run at build/CI time, before any agent step executes.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::core::gate::{enum_errors, intent_ref_errors, schema_enum_values};
use crate::core::structure::{flow_warnings, structural_errors};
use crate::core::types::StepRegistry;
use crate::error::{RegistryError, SchemaError};
use crate::io::config::{CONFIG_FILE, load_config};
use crate::io::paths::AgentPaths;
use crate::io::registry_store::load_registry;
use crate::schema::SchemaResolver;
use crate::schema::pointer::normalize_pointer;

/// Summary of a successful `validate_agent` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOutcome {
    pub agent_id: String,
    pub steps: usize,
    pub flows: usize,
    pub gated_steps: usize,
    /// Dangling flow/entry references (not fatal).
    pub warnings: Vec<String>,
}

/// Structural validation. Reports every violation at once.
pub fn validate_step_registry(registry: &StepRegistry) -> Result<(), RegistryError> {
    for warning in flow_warnings(registry) {
        warn!(agent_id = %registry.agent_id, "{warning}");
    }
    let errors = structural_errors(registry);
    if errors.is_empty() {
        return Ok(());
    }
    Err(RegistryError::Invalid { errors })
}

/// Gate well-formedness: every gated step has an `intentField` and an internal
/// `intentSchemaRef`.
pub fn validate_intent_schema_ref(registry: &StepRegistry) -> Result<(), RegistryError> {
    let errors = intent_ref_errors(registry);
    if errors.is_empty() {
        return Ok(());
    }
    Err(RegistryError::InvalidGate { errors })
}

/// Check each gate's `allowedIntents` against its schema enum, resolving
/// schemas under `base_dir`.
pub fn validate_intent_schema_enums(
    registry: &StepRegistry,
    base_dir: &Path,
) -> Result<(), RegistryError> {
    let mut resolver = SchemaResolver::new(base_dir);
    validate_intent_schema_enums_with(registry, &mut resolver)
}

/// [`validate_intent_schema_enums`] with a caller-owned resolver.
///
/// Steps need both `structuredGate` and `outputSchemaRef` to be checked. A
/// pointer that does not resolve fails immediately with the resolver's
/// error; enum disagreements are collected across all steps.
#[instrument(skip_all, fields(agent_id = %registry.agent_id))]
pub fn validate_intent_schema_enums_with(
    registry: &StepRegistry,
    resolver: &mut SchemaResolver,
) -> Result<(), RegistryError> {
    let mut errors = Vec::new();
    for (key, step) in &registry.steps {
        let (Some(gate), Some(schema_ref)) = (&step.structured_gate, &step.output_schema_ref)
        else {
            continue;
        };

        let intent_ref = match gate.intent_schema_ref.as_deref() {
            Some(pointer) if pointer.starts_with("#/") => pointer,
            other => {
                errors.push(format!(
                    "step '{key}': intentSchemaRef {} is not an internal pointer",
                    other.map_or_else(|| "<missing>".to_string(), |p| format!("'{p}'"))
                ));
                continue;
            }
        };

        let schema = resolver.resolve(&schema_ref.file, &schema_ref.pointer)?;
        let node = schema
            .pointer(&normalize_pointer(intent_ref)?)
            .ok_or_else(|| SchemaError::PointerNotFound {
                pointer: intent_ref.to_string(),
                file: format!("{} (at {})", schema_ref.file, schema_ref.pointer),
            })?;

        match schema_enum_values(node) {
            Some(values) => errors.extend(enum_errors(key, &gate.allowed_intents, &values)),
            None => errors.push(format!(
                "step '{key}': schema node '{intent_ref}' in {} has no enum",
                schema_ref.file
            )),
        }
    }

    if errors.is_empty() {
        return Ok(());
    }
    Err(RegistryError::IntentEnumMismatch { errors })
}

/// Load an agent's registry under `root` and run every validator in order.
#[instrument(skip_all, fields(root = %root.display(), agent_id = %agent_id))]
pub fn validate_agent(root: &Path, agent_id: &str) -> Result<ValidateOutcome> {
    let cfg = load_config(&root.join(CONFIG_FILE))?;
    let paths = AgentPaths::new(root, agent_id, &cfg);

    let registry = load_registry(agent_id, &paths.registry_path)?;
    validate_step_registry(&registry)?;
    validate_intent_schema_ref(&registry)?;
    validate_intent_schema_enums(&registry, &paths.schema_dir)
        .with_context(|| format!("check intent enums under {}", paths.schema_dir.display()))?;

    let outcome = ValidateOutcome {
        agent_id: registry.agent_id.clone(),
        steps: registry.steps.len(),
        flows: registry.flows.len(),
        gated_steps: registry
            .steps
            .values()
            .filter(|step| step.structured_gate.is_some())
            .count(),
        warnings: flow_warnings(&registry),
    };
    info!(
        steps = outcome.steps,
        flows = outcome.flows,
        gated = outcome.gated_steps,
        "registry valid"
    );
    Ok(outcome)
}
