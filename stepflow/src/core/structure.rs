//! Structural checks on a registry: required fields and key/id agreement.

use crate::core::types::{StepDefinition, StepRegistry};

/// Collect every structural violation in `registry`.
///
/// Checks:
/// - `agentId` is non-empty
/// - each map key equals its definition's `stepId`
/// - each step's required scalars are non-empty
/// - `outputSchemaRef`, when present, names both a file and a pointer
///
/// Returns stable error messages in step-key order (empty on success).
pub fn structural_errors(registry: &StepRegistry) -> Vec<String> {
    let mut errors = Vec::new();

    if registry.agent_id.trim().is_empty() {
        errors.push("registry: agentId is required".to_string());
    }

    for (key, step) in &registry.steps {
        check_step(key, step, &mut errors);
    }

    errors
}

/// Flow and entry references that point at unregistered steps.
///
/// These are tolerated at traversal time, so they are reported as warnings.
pub fn flow_warnings(registry: &StepRegistry) -> Vec<String> {
    let mut warnings = Vec::new();
    for (flow, ids) in &registry.flows {
        for id in ids {
            if !registry.steps.contains_key(id) {
                warnings.push(format!("flow '{flow}' references unknown step '{id}'"));
            }
        }
    }
    if let Some(entry) = registry.entry_step.as_deref()
        && !registry.steps.contains_key(entry)
    {
        warnings.push(format!("entryStep '{entry}' is not registered"));
    }
    warnings
}

fn check_step(key: &str, step: &StepDefinition, errors: &mut Vec<String>) {
    if step.step_id.trim().is_empty() {
        errors.push(format!("steps['{key}']: stepId is required"));
    } else if step.step_id != key {
        errors.push(format!(
            "steps['{key}']: stepId '{}' does not match its key",
            step.step_id
        ));
    }

    let required = [
        ("name", &step.name),
        ("domain", &step.domain),
        ("action", &step.action),
        ("target", &step.target),
        ("edition", &step.edition),
        ("fallbackKey", &step.fallback_key),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(format!("steps['{key}']: {field} is required"));
        }
    }

    if let Some(schema_ref) = &step.output_schema_ref {
        if schema_ref.file.trim().is_empty() {
            errors.push(format!("steps['{key}']: outputSchemaRef.file is required"));
        }
        if schema_ref.pointer.trim().is_empty() {
            errors.push(format!("steps['{key}']: outputSchemaRef.pointer is required"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{OutputSchemaRef, StepKind};
    use crate::test_support::{registry_with, step};

    #[test]
    fn complete_registry_has_no_errors() {
        let registry = registry_with(
            "iterator",
            vec![step("initial.issue", StepKind::Work), step("closure.issue", StepKind::Closure)],
        );
        assert!(structural_errors(&registry).is_empty());
    }

    /// Every violation is reported in one pass, across steps.
    #[test]
    fn accumulates_all_violations() {
        let mut broken = step("initial.issue", StepKind::Work);
        broken.name.clear();
        broken.fallback_key = "  ".to_string();
        let mut other = step("verify.issue", StepKind::Verification);
        other.edition.clear();
        let registry = registry_with("iterator", vec![broken, other]);

        let errors = structural_errors(&registry);
        assert_eq!(
            errors,
            vec![
                "steps['initial.issue']: name is required".to_string(),
                "steps['initial.issue']: fallbackKey is required".to_string(),
                "steps['verify.issue']: edition is required".to_string(),
            ]
        );
    }

    #[test]
    fn empty_version_is_not_a_violation() {
        let mut registry = registry_with("iterator", vec![step("a.step", StepKind::Work)]);
        registry.version.clear();
        assert!(structural_errors(&registry).is_empty());
    }

    #[test]
    fn reports_key_id_mismatch() {
        let mut registry = registry_with("iterator", vec![step("initial.issue", StepKind::Work)]);
        registry
            .steps
            .insert("alias".to_string(), step("initial.issue", StepKind::Work));
        let errors = structural_errors(&registry);
        assert_eq!(
            errors,
            vec!["steps['alias']: stepId 'initial.issue' does not match its key".to_string()]
        );
    }

    #[test]
    fn reports_empty_agent_id_and_schema_ref_parts() {
        let mut gated = step("initial.issue", StepKind::Work);
        gated.output_schema_ref = Some(OutputSchemaRef {
            file: String::new(),
            pointer: "#/definitions/initial.issue".to_string(),
        });
        let registry = registry_with("", vec![gated]);
        let errors = structural_errors(&registry);
        assert!(errors.contains(&"registry: agentId is required".to_string()));
        assert!(errors.contains(&"steps['initial.issue']: outputSchemaRef.file is required".to_string()));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn dangling_flow_references_are_warnings_only() {
        let mut registry = registry_with("iterator", vec![step("initial.issue", StepKind::Work)]);
        registry.flows.insert(
            "issue".to_string(),
            vec!["initial.issue".to_string(), "closure.issue".to_string()],
        );
        registry.entry_step = Some("start".to_string());

        assert!(structural_errors(&registry).is_empty());
        assert_eq!(
            flow_warnings(&registry),
            vec![
                "flow 'issue' references unknown step 'closure.issue'".to_string(),
                "entryStep 'start' is not registered".to_string(),
            ]
        );
    }
}
