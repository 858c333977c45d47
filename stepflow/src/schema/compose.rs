//! Schema composition: `allOf` merging and closed-object injection.

use serde_json::{Map, Value};

/// Merge `branch` onto `base` the way `allOf` branches combine.
///
/// `properties` are unioned (the later branch wins per property), `required`
/// is unioned in first-seen order, and any other keyword from the later
/// branch overrides the earlier one.
pub fn merge_schemas(base: Value, branch: Value) -> Value {
    let Value::Object(mut merged) = base else {
        return branch;
    };
    let Value::Object(branch) = branch else {
        return Value::Object(merged);
    };
    for (key, value) in branch {
        let earlier = merged.remove(&key);
        let combined = match (key.as_str(), earlier, value) {
            ("properties", Some(Value::Object(mut existing)), Value::Object(incoming)) => {
                existing.extend(incoming);
                Value::Object(existing)
            }
            ("required", Some(Value::Array(mut existing)), Value::Array(incoming)) => {
                for name in incoming {
                    if !existing.contains(&name) {
                        existing.push(name);
                    }
                }
                Value::Array(existing)
            }
            (_, _, value) => value,
        };
        merged.insert(key, combined);
    }
    Value::Object(merged)
}

/// Add `additionalProperties: false` to every object-typed schema node that
/// does not declare it, including nested ones.
pub fn close_objects(schema: &mut Value) {
    let Value::Object(map) = schema else {
        return;
    };
    if is_object_schema(map) && !map.contains_key("additionalProperties") {
        map.insert("additionalProperties".to_string(), Value::Bool(false));
    }
    for (key, child) in map.iter_mut() {
        match key.as_str() {
            "properties" | "patternProperties" | "definitions" | "$defs" | "dependentSchemas" => {
                if let Value::Object(children) = child {
                    children.values_mut().for_each(close_objects);
                }
            }
            "items" | "additionalItems" | "additionalProperties" | "unevaluatedProperties"
            | "propertyNames" | "contains" | "not" | "if" | "then" | "else" | "allOf" | "anyOf"
            | "oneOf" | "prefixItems" => close_subschemas(child),
            _ => {}
        }
    }
}

fn close_subschemas(value: &mut Value) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(close_objects),
        other => close_objects(other),
    }
}

fn is_object_schema(map: &Map<String, Value>) -> bool {
    match map.get("type") {
        Some(Value::String(ty)) => ty == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t == "object"),
        Some(_) => false,
        None => map.contains_key("properties"),
    }
}
