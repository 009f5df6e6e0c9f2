//! JSON Schema structural utilities
//!
//! Schemas are handled as raw `serde_json::Value` trees rather than a typed
//! AST: tool servers send arbitrary draft-07-style schemas and we must
//! round-trip fields we do not interpret. A schema is either a boolean
//! (`true` matches anything, `false` matches nothing) or an object with an
//! optional `type` discriminant plus combinators (`oneOf`, `anyOf`, `allOf`,
//! `not`) and shape fields (`properties`, `additionalProperties`, `items`,
//! `additionalItems`).
//!
//! Open type parameters are marked inline with the `x-generic` field, whose
//! value is the parameter name. Resolution of those markers lives in
//! [`generics`]; the traversal primitives it is built on live in [`walk`] and
//! [`transform`].

pub mod generics;
pub mod name;
pub mod transform;
pub mod walk;

use serde_json::Value;

/// Field marking a schema node as an open generic parameter.
pub const GENERIC_MARKER: &str = "x-generic";

/// Returns the generic parameter name carried by this node, if any.
pub fn generic_param(schema: &Value) -> Option<&str> {
    schema.get(GENERIC_MARKER).and_then(Value::as_str)
}

/// Schema fields that constrain the matched value. An object schema carrying
/// none of these matches anything, the same as `true` or `{}`.
pub(crate) const CONSTRAINING_FIELDS: [&str; 13] = [
    "type",
    "properties",
    "additionalProperties",
    "items",
    "additionalItems",
    "oneOf",
    "anyOf",
    "allOf",
    "not",
    "enum",
    "const",
    "$ref",
    GENERIC_MARKER,
];

/// True if the schema places no constraint on the matched value.
pub fn is_unconstrained(schema: &Value) -> bool {
    match schema {
        Value::Bool(accept) => *accept,
        Value::Object(fields) => CONSTRAINING_FIELDS
            .iter()
            .all(|field| !fields.contains_key(*field)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generic_param_reads_marker() {
        assert_eq!(generic_param(&json!({ "x-generic": "T" })), Some("T"));
        assert_eq!(generic_param(&json!({ "type": "string" })), None);
        assert_eq!(generic_param(&json!(true)), None);
    }

    #[test]
    fn unconstrained_schemas() {
        assert!(is_unconstrained(&json!({})));
        assert!(is_unconstrained(&json!(true)));
        assert!(is_unconstrained(&json!({ "description": "anything" })));
        assert!(!is_unconstrained(&json!(false)));
        assert!(!is_unconstrained(&json!({ "type": "string" })));
        assert!(!is_unconstrained(&json!({ "x-generic": "T" })));
    }
}
