//! Canonical type names for schema shapes
//!
//! Socket labels and interface-type interning both need a stable
//! human-readable name per schema shape. The derivation ladder, in priority
//! order: boolean top/bottom, explicit `title`, `$ref` target, `list[T]`,
//! `stringDict[T]`, union / intersection / negation composites, the
//! unconstrained schema, and finally a bare primitive `type`. Schemas that
//! fall through every rung (including bare generic markers) have no
//! derivable name and the caller picks the fallback.

use serde_json::Value;

use super::is_unconstrained;

/// Derives the canonical name of a schema shape, if one exists.
pub fn type_name_of(schema: &Value) -> Option<String> {
    match schema {
        Value::Bool(true) => return Some("unknown".to_string()),
        Value::Bool(false) => return Some("never".to_string()),
        _ => {}
    }
    let fields = schema.as_object()?;

    if let Some(title) = fields.get("title").and_then(Value::as_str) {
        return Some(title.to_string());
    }
    // `$ref` targets are opaque leaves; the last path segment is the
    // definition's name. Resolving the target is the caller's business.
    if let Some(target) = fields.get("$ref").and_then(Value::as_str) {
        let name = target.rsplit('/').next().unwrap_or(target);
        return Some(name.to_string());
    }

    let type_tag = fields.get("type").and_then(Value::as_str);
    if type_tag == Some("array") {
        if let Some(items) = fields.get("items") {
            if !items.is_array() {
                return Some(format!("list[{}]", name_or_unknown(items)));
            }
        }
    }
    if type_tag == Some("object") {
        let has_fixed_properties = fields
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|p| !p.is_empty());
        if !has_fixed_properties {
            if let Some(values) = fields.get("additionalProperties") {
                return Some(format!("stringDict[{}]", name_or_unknown(values)));
            }
        }
    }

    for combinator in ["anyOf", "oneOf"] {
        if let Some(members) = fields.get(combinator).and_then(Value::as_array) {
            return Some(join_names(members, " | "));
        }
    }
    if let Some(members) = fields.get("allOf").and_then(Value::as_array) {
        return Some(join_names(members, " & "));
    }
    if let Some(negated) = fields.get("not") {
        if let Some(inner) = type_name_of(negated) {
            return Some(format!("not {inner}"));
        }
    }

    if is_unconstrained(schema) {
        return Some("unknown".to_string());
    }
    match type_tag {
        Some(primitive) if primitive != "object" && primitive != "array" => {
            Some(primitive.to_string())
        }
        _ => None,
    }
}

fn name_or_unknown(schema: &Value) -> String {
    type_name_of(schema).unwrap_or_else(|| "unknown".to_string())
}

fn join_names(members: &[Value], separator: &str) -> String {
    members
        .iter()
        .map(|member| name_or_unknown(member))
        .collect::<Vec<_>>()
        .join(separator)
}
