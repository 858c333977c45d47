//! Structured gate checks.
//!
//! A gate ties the intent a step may declare to an enumeration in the step's
//! output schema. Load-time checks make sure the two agree exactly; the
//! runtime check makes sure a concrete output stays inside the gate.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::core::types::{CLOSING_INTENT, StepDefinition, StepRegistry};
use crate::error::GateError;

/// Collect gate well-formedness violations for every gated step.
///
/// Each gate needs a non-empty `allowedIntents`, an `intentField`, and an
/// `intentSchemaRef` that is an internal pointer (`#/...`) into the step's own
/// output schema.
pub fn intent_ref_errors(registry: &StepRegistry) -> Vec<String> {
    let mut errors = Vec::new();
    for (key, step) in &registry.steps {
        let Some(gate) = &step.structured_gate else {
            continue;
        };

        if gate.allowed_intents.is_empty() {
            errors.push(format!(
                "step '{key}': structuredGate.allowedIntents must not be empty"
            ));
        }
        if gate.intent_field.as_deref().is_none_or(|f| f.trim().is_empty()) {
            errors.push(format!("step '{key}': structuredGate.intentField is required"));
        }
        match gate.intent_schema_ref.as_deref() {
            None | Some("") => errors.push(format!(
                "step '{key}': structuredGate.intentSchemaRef is required"
            )),
            Some(pointer) if !pointer.starts_with("#/") => errors.push(format!(
                "step '{key}': intentSchemaRef '{pointer}' must be an internal pointer starting with '#/' (external file references are not allowed)"
            )),
            Some(_) => {}
        }
    }
    errors
}

/// Compare a gate's `allowedIntents` with the schema enumeration as sets.
///
/// Comparison is case-sensitive. A schema enum that is a strict superset is a
/// violation too: an enum value with no gate entry is an unrouted intent.
pub fn enum_errors(step_id: &str, allowed: &[String], schema_enum: &[String]) -> Vec<String> {
    let allowed_set: BTreeSet<&str> = allowed.iter().map(String::as_str).collect();
    let enum_set: BTreeSet<&str> = schema_enum.iter().map(String::as_str).collect();

    let missing: Vec<&str> = allowed_set.difference(&enum_set).copied().collect();
    let extra: Vec<&str> = enum_set.difference(&allowed_set).copied().collect();

    let mut errors = Vec::new();
    if !missing.is_empty() {
        let mut message = format!(
            "step '{step_id}': enum mismatch: allowedIntents [{}] missing from schema enum [{}]",
            missing.join(", "),
            schema_enum.join(", ")
        );
        let case_hints: Vec<String> = missing
            .iter()
            .filter_map(|m| {
                enum_set
                    .iter()
                    .find(|e| e.eq_ignore_ascii_case(m))
                    .map(|e| format!("'{m}' vs '{e}'"))
            })
            .collect();
        if !case_hints.is_empty() {
            message.push_str(&format!(" (case differs: {})", case_hints.join(", ")));
        }
        errors.push(message);
    }
    if !extra.is_empty() {
        errors.push(format!(
            "step '{step_id}': schema has extra [{}] not in allowedIntents",
            extra.join(", ")
        ));
    }
    errors
}

/// String values of `node.enum`, or `None` when the node has no enum array.
pub fn schema_enum_values(node: &Value) -> Option<Vec<String>> {
    let values = node.get("enum")?.as_array()?;
    Some(
        values
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
    )
}

/// Read the string at dot-path `field` in `output`.
pub fn declared_intent<'a>(output: &'a Value, field: &str) -> Option<&'a str> {
    field
        .split('.')
        .try_fold(output, |node, segment| node.get(segment))?
        .as_str()
}

/// Check a step's structured output against its gate and kind.
///
/// Returns the declared intent when it is allowed.
pub fn check_declared_intent(step: &StepDefinition, output: &Value) -> Result<String, GateError> {
    let gate = step
        .structured_gate
        .as_ref()
        .ok_or_else(|| GateError::NoGate {
            step_id: step.step_id.clone(),
        })?;
    let field = gate.intent_field.clone().unwrap_or_default();
    let intent = declared_intent(output, &field).ok_or_else(|| GateError::MissingIntent {
        step_id: step.step_id.clone(),
        field: field.clone(),
    })?;

    if !gate.allowed_intents.iter().any(|allowed| allowed == intent) {
        return Err(GateError::IntentNotAllowed {
            step_id: step.step_id.clone(),
            intent: intent.to_string(),
            allowed: gate.allowed_intents.clone(),
        });
    }
    if intent == CLOSING_INTENT && !step.kind.can_declare_completion() {
        return Err(GateError::CompletionOutsideClosure {
            step_id: step.step_id.clone(),
            kind: step.kind.to_string(),
            intent: intent.to_string(),
        });
    }
    Ok(intent.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::StepKind;
    use crate::test_support::{gated_step, registry_with, step};
    use serde_json::json;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn well_formed_gates_pass() {
        let registry = registry_with(
            "iterator",
            vec![
                gated_step("initial.issue", StepKind::Work, &["next", "repeat"]),
                step("plain", StepKind::Work),
            ],
        );
        assert!(intent_ref_errors(&registry).is_empty());
    }

    #[test]
    fn rejects_missing_and_external_refs_for_every_step() {
        let mut missing = gated_step("a.step", StepKind::Work, &["next"]);
        if let Some(gate) = missing.structured_gate.as_mut() {
            gate.intent_schema_ref = None;
        }
        let mut external = gated_step("b.step", StepKind::Work, &["next"]);
        if let Some(gate) = external.structured_gate.as_mut() {
            gate.intent_schema_ref =
                Some("common.schema.json#/definitions/action".to_string());
        }
        let mut no_field = gated_step("c.step", StepKind::Closure, &["closing"]);
        if let Some(gate) = no_field.structured_gate.as_mut() {
            gate.intent_field = None;
        }
        let registry = registry_with("iterator", vec![missing, external, no_field]);

        let errors = intent_ref_errors(&registry);
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("step 'a.step'"));
        assert!(errors[0].contains("intentSchemaRef is required"));
        assert!(errors[1].starts_with("step 'b.step'"));
        assert!(errors[1].contains("must be an internal pointer"));
        assert!(errors[2].contains("intentField is required"));
    }

    #[test]
    fn bare_fragment_without_slash_is_rejected() {
        let mut step = gated_step("a.step", StepKind::Work, &["next"]);
        if let Some(gate) = step.structured_gate.as_mut() {
            gate.intent_schema_ref = Some("#definitions/action".to_string());
        }
        let errors = intent_ref_errors(&registry_with("iterator", vec![step]));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn enum_equality_passes() {
        let errors = enum_errors(
            "s",
            &strings(&["next", "repeat"]),
            &strings(&["repeat", "next"]),
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn enum_superset_reports_extras() {
        let errors = enum_errors(
            "s",
            &strings(&["next"]),
            &strings(&["next", "closing"]),
        );
        assert_eq!(
            errors,
            vec!["step 's': schema has extra [closing] not in allowedIntents".to_string()]
        );
    }

    #[test]
    fn enum_subset_reports_mismatch() {
        let errors = enum_errors(
            "s",
            &strings(&["next", "jump"]),
            &strings(&["next"]),
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("enum mismatch"));
        assert!(errors[0].contains("[jump]"));
    }

    #[test]
    fn enum_case_difference_is_a_mismatch() {
        let errors = enum_errors("s", &strings(&["Next"]), &strings(&["next"]));
        assert!(errors[0].contains("enum mismatch"));
        assert!(errors[0].contains("case differs: 'Next' vs 'next'"));
    }

    #[test]
    fn schema_enum_values_reads_enum_array() {
        let node = json!({"type": "string", "enum": ["next", "repeat"]});
        assert_eq!(schema_enum_values(&node), Some(strings(&["next", "repeat"])));
        assert_eq!(schema_enum_values(&json!({"type": "string"})), None);
    }

    #[test]
    fn declared_intent_follows_dot_path() {
        let output = json!({"next_action": {"action": "repeat"}});
        assert_eq!(declared_intent(&output, "next_action.action"), Some("repeat"));
        assert_eq!(declared_intent(&output, "next_action.reason"), None);
        assert_eq!(declared_intent(&json!({"next_action": {"action": 3}}), "next_action.action"), None);
    }

    #[test]
    fn check_declared_intent_accepts_allowed_intent() {
        let step = gated_step("initial.issue", StepKind::Work, &["next", "repeat"]);
        let output = json!({"summary": "ok", "next_action": {"action": "next"}});
        assert_eq!(check_declared_intent(&step, &output), Ok("next".to_string()));
    }

    #[test]
    fn check_declared_intent_rejects_unlisted_intent() {
        let step = gated_step("initial.issue", StepKind::Work, &["next"]);
        let output = json!({"next_action": {"action": "jump"}});
        let err = check_declared_intent(&step, &output).expect_err("not allowed");
        assert!(matches!(err, GateError::IntentNotAllowed { ref intent, .. } if intent == "jump"));
    }

    /// Even a misconfigured gate cannot let a work step complete the task.
    #[test]
    fn check_declared_intent_rejects_closing_outside_closure() {
        let step = gated_step("verify.issue", StepKind::Verification, &["next", "closing"]);
        let output = json!({"next_action": {"action": "closing"}});
        let err = check_declared_intent(&step, &output).expect_err("closing");
        assert!(matches!(err, GateError::CompletionOutsideClosure { .. }));

        let closure = gated_step("closure.issue", StepKind::Closure, &["closing", "repeat"]);
        assert_eq!(
            check_declared_intent(&closure, &output),
            Ok("closing".to_string())
        );
    }

    #[test]
    fn check_declared_intent_reports_missing_field_and_gate() {
        let gated = gated_step("initial.issue", StepKind::Work, &["next"]);
        let err = check_declared_intent(&gated, &json!({})).expect_err("missing");
        assert!(matches!(err, GateError::MissingIntent { .. }));

        let plain = step("plain", StepKind::Work);
        let err = check_declared_intent(&plain, &json!({})).expect_err("no gate");
        assert_eq!(
            err,
            GateError::NoGate {
                step_id: "plain".to_string()
            }
        );
    }
}
