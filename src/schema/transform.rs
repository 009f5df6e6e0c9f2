//! Copy-on-write schema rewriting
//!
//! [`transform_schema`] applies a replacement callback bottom-up and only
//! reallocates the spine from the root to each changed node. Tool-declared
//! schemas are shared across every placed node instance, so substitution must
//! never mutate its input, and untouched subtrees should not be copied on
//! every graph edit either.

use std::borrow::Cow;

use serde_json::{Map, Value};

/// Rewrites a schema tree bottom-up.
///
/// `replace` is called on every node after its children have been
/// transformed; returning `None` keeps the node, returning `Some` swaps it
/// out. The result borrows the input wherever nothing underneath changed.
/// Boolean schemas go straight to the callback with no recursion.
pub fn transform_schema<'a, F>(schema: &'a Value, replace: &mut F) -> Cow<'a, Value>
where
    F: FnMut(&Value) -> Option<Value>,
{
    let fields = match schema.as_object() {
        Some(fields) => fields,
        None => {
            return match replace(schema) {
                Some(replacement) => Cow::Owned(replacement),
                None => Cow::Borrowed(schema),
            }
        }
    };

    let type_tag = fields.get("type").and_then(Value::as_str);
    let mut rebuilt: Option<Map<String, Value>> = None;
    for (key, child) in fields {
        let transformed = match key.as_str() {
            "additionalItems" | "additionalProperties" | "not" => {
                transform_child(child, replace)
            }
            "oneOf" | "anyOf" | "allOf" => transform_members(child, replace),
            "items" if type_tag == Some("array") => match child {
                Value::Array(_) => transform_members(child, replace),
                _ => transform_child(child, replace),
            },
            "properties" if type_tag == Some("object") => transform_properties(child, replace),
            _ => None,
        };
        if let Some(changed) = transformed {
            rebuilt
                .get_or_insert_with(|| fields.clone())
                .insert(key.clone(), changed);
        }
    }

    let node = match rebuilt {
        Some(map) => Cow::Owned(Value::Object(map)),
        None => Cow::Borrowed(schema),
    };
    match replace(node.as_ref()) {
        Some(replacement) => Cow::Owned(replacement),
        None => node,
    }
}

fn transform_child<F>(child: &Value, replace: &mut F) -> Option<Value>
where
    F: FnMut(&Value) -> Option<Value>,
{
    match transform_schema(child, replace) {
        Cow::Owned(changed) => Some(changed),
        Cow::Borrowed(_) => None,
    }
}

fn transform_members<F>(members: &Value, replace: &mut F) -> Option<Value>
where
    F: FnMut(&Value) -> Option<Value>,
{
    let list = members.as_array()?;
    let mut rebuilt: Option<Vec<Value>> = None;
    for (position, member) in list.iter().enumerate() {
        if let Cow::Owned(changed) = transform_schema(member, replace) {
            rebuilt.get_or_insert_with(|| list.clone())[position] = changed;
        }
    }
    rebuilt.map(Value::Array)
}

fn transform_properties<F>(properties: &Value, replace: &mut F) -> Option<Value>
where
    F: FnMut(&Value) -> Option<Value>,
{
    let map = properties.as_object()?;
    let mut rebuilt: Option<Map<String, Value>> = None;
    for (name, property) in map {
        if let Cow::Owned(changed) = transform_schema(property, replace) {
            rebuilt
                .get_or_insert_with(|| map.clone())
                .insert(name.clone(), changed);
        }
    }
    rebuilt.map(Value::Object)
}
