//! Recursive schema traversal
//!
//! Two walkers share the same visiting discipline: pre-order, with the
//! visitor choosing per node whether to descend, skip the node's children, or
//! abort the whole walk. [`walk_schema`] visits a single tree;
//! [`walk_schemas_in_sync`] visits a reference tree while aligning each
//! position with its counterpart in a second, concrete tree.

use serde_json::Value;

/// Visitor verdict for a single schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    /// Descend into this node's children.
    Continue,
    /// Do not descend, but keep walking siblings.
    Skip,
    /// Abort the entire walk immediately.
    Stop,
}

/// Visits `schema` and every reachable subschema in pre-order.
///
/// Children are reached through `additionalItems`, `additionalProperties`,
/// `oneOf`, `anyOf`, `allOf`, `not`, array `items` (single schema or tuple)
/// and object `properties`. Boolean schemas have no children. Returns
/// [`WalkControl::Stop`] if the visitor aborted, [`WalkControl::Continue`]
/// otherwise.
pub fn walk_schema<F>(schema: &Value, visit: &mut F) -> WalkControl
where
    F: FnMut(&Value) -> WalkControl,
{
    match visit(schema) {
        WalkControl::Stop => return WalkControl::Stop,
        WalkControl::Skip => return WalkControl::Continue,
        WalkControl::Continue => {}
    }
    let fields = match schema.as_object() {
        Some(fields) => fields,
        None => return WalkControl::Continue,
    };

    for key in ["additionalItems", "additionalProperties"] {
        if let Some(child) = fields.get(key) {
            if walk_schema(child, visit) == WalkControl::Stop {
                return WalkControl::Stop;
            }
        }
    }
    for key in ["oneOf", "anyOf", "allOf"] {
        if let Some(members) = fields.get(key).and_then(Value::as_array) {
            for member in members {
                if walk_schema(member, visit) == WalkControl::Stop {
                    return WalkControl::Stop;
                }
            }
        }
    }
    if let Some(negated) = fields.get("not") {
        if walk_schema(negated, visit) == WalkControl::Stop {
            return WalkControl::Stop;
        }
    }

    match fields.get("type").and_then(Value::as_str) {
        Some("array") => match fields.get("items") {
            Some(Value::Array(tuple)) => {
                for item in tuple {
                    if walk_schema(item, visit) == WalkControl::Stop {
                        return WalkControl::Stop;
                    }
                }
            }
            Some(items) => {
                if walk_schema(items, visit) == WalkControl::Stop {
                    return WalkControl::Stop;
                }
            }
            None => {}
        },
        Some("object") => {
            if let Some(properties) = fields.get("properties").and_then(Value::as_object) {
                for property in properties.values() {
                    if walk_schema(property, visit) == WalkControl::Stop {
                        return WalkControl::Stop;
                    }
                }
            }
        }
        _ => {}
    }
    WalkControl::Continue
}

/// True iff any node in the schema satisfies the predicate.
pub fn schema_contains<P>(schema: &Value, mut predicate: P) -> bool
where
    P: FnMut(&Value) -> bool,
{
    walk_schema(schema, &mut |node| {
        if predicate(node) {
            WalkControl::Stop
        } else {
            WalkControl::Continue
        }
    }) == WalkControl::Stop
}

/// True iff the schema carries a generic parameter marker anywhere.
pub fn contains_generic(schema: &Value) -> bool {
    schema_contains(schema, |node| super::generic_param(node).is_some())
}

/// Walks a reference schema while aligning each visited position with its
/// counterpart in a concrete schema.
///
/// The reference side drives the traversal shape; the concrete side may be
/// missing, boolean, or structurally looser, in which case children are
/// visited with no counterpart. Alignment rules:
///
/// - `additionalItems`, `additionalProperties`, `not`: same-named field of
///   the concrete node.
/// - `allOf`: intersection semantics, so every member is checked against the
///   *same* concrete node, not a slice of it.
/// - `oneOf` / `anyOf`: members have no positional counterpart, so alignment
///   is by the primitive `type` tag — a member pairs with the single
///   same-typed member of the concrete union under the same combinator, or
///   with the concrete node itself when its `type` matches. Ambiguous or
///   untyped members are visited with no counterpart. There is no principled
///   way to match union members without full assignability checking; this
///   tag-based pairing is a deliberate approximation.
/// - Tuple `items`: paired positionally when the concrete side is also a
///   tuple, falling back to the concrete `additionalItems` for positions the
///   concrete tuple does not cover. A non-tuple reference `items` facing a
///   concrete tuple aligns with the concrete `additionalItems` as well.
/// - `properties`: the concrete same-named property, else the concrete
///   `additionalProperties`.
pub fn walk_schemas_in_sync<F>(reference: &Value, concrete: Option<&Value>, visit: &mut F) -> WalkControl
where
    F: FnMut(&Value, Option<&Value>) -> WalkControl,
{
    match visit(reference, concrete) {
        WalkControl::Stop => return WalkControl::Stop,
        WalkControl::Skip => return WalkControl::Continue,
        WalkControl::Continue => {}
    }
    let fields = match reference.as_object() {
        Some(fields) => fields,
        None => return WalkControl::Continue,
    };
    // A boolean concrete schema constrains nothing, so its "children" are all
    // absent; treating it like an empty object gives exactly that.
    let concrete_fields = concrete.and_then(Value::as_object);

    for key in ["additionalItems", "additionalProperties"] {
        if let Some(child) = fields.get(key) {
            let counterpart = concrete_fields.and_then(|c| c.get(key));
            if walk_schemas_in_sync(child, counterpart, visit) == WalkControl::Stop {
                return WalkControl::Stop;
            }
        }
    }
    for key in ["oneOf", "anyOf"] {
        if let Some(members) = fields.get(key).and_then(Value::as_array) {
            for member in members {
                let counterpart = align_union_member(member, concrete, key);
                if walk_schemas_in_sync(member, counterpart, visit) == WalkControl::Stop {
                    return WalkControl::Stop;
                }
            }
        }
    }
    if let Some(members) = fields.get("allOf").and_then(Value::as_array) {
        for member in members {
            if walk_schemas_in_sync(member, concrete, visit) == WalkControl::Stop {
                return WalkControl::Stop;
            }
        }
    }
    if let Some(negated) = fields.get("not") {
        let counterpart = concrete_fields.and_then(|c| c.get("not"));
        if walk_schemas_in_sync(negated, counterpart, visit) == WalkControl::Stop {
            return WalkControl::Stop;
        }
    }

    match fields.get("type").and_then(Value::as_str) {
        Some("array") => {
            let concrete_items = concrete_fields.and_then(|c| c.get("items"));
            let concrete_rest = concrete_fields.and_then(|c| c.get("additionalItems"));
            match fields.get("items") {
                Some(Value::Array(tuple)) => {
                    for (position, item) in tuple.iter().enumerate() {
                        let counterpart = match concrete_items.and_then(Value::as_array) {
                            Some(concrete_tuple) => {
                                concrete_tuple.get(position).or(concrete_rest)
                            }
                            None => concrete_items,
                        };
                        if walk_schemas_in_sync(item, counterpart, visit) == WalkControl::Stop {
                            return WalkControl::Stop;
                        }
                    }
                }
                Some(items) => {
                    let counterpart = match concrete_items {
                        Some(Value::Array(_)) => concrete_rest,
                        other => other,
                    };
                    if walk_schemas_in_sync(items, counterpart, visit) == WalkControl::Stop {
                        return WalkControl::Stop;
                    }
                }
                None => {}
            }
        }
        Some("object") => {
            if let Some(properties) = fields.get("properties").and_then(Value::as_object) {
                let concrete_props = concrete_fields
                    .and_then(|c| c.get("properties"))
                    .and_then(Value::as_object);
                let concrete_rest = concrete_fields.and_then(|c| c.get("additionalProperties"));
                for (name, property) in properties {
                    let counterpart = concrete_props
                        .and_then(|p| p.get(name))
                        .or(concrete_rest);
                    if walk_schemas_in_sync(property, counterpart, visit) == WalkControl::Stop {
                        return WalkControl::Stop;
                    }
                }
            }
        }
        _ => {}
    }
    WalkControl::Continue
}

fn align_union_member<'a>(
    member: &Value,
    concrete: Option<&'a Value>,
    combinator: &str,
) -> Option<&'a Value> {
    let member_type = member.get("type").and_then(Value::as_str)?;
    let concrete = concrete?;
    let concrete_fields = concrete.as_object()?;
    if let Some(candidates) = concrete_fields.get(combinator).and_then(Value::as_array) {
        let mut same_typed = candidates
            .iter()
            .filter(|c| c.get("type").and_then(Value::as_str) == Some(member_type));
        let first = same_typed.next()?;
        return if same_typed.next().is_none() {
            Some(first)
        } else {
            None
        };
    }
    if concrete_fields.get("type").and_then(Value::as_str) == Some(member_type) {
        return Some(concrete);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collect_preorder(schema: &Value) -> Vec<Value> {
        let mut visited = Vec::new();
        walk_schema(schema, &mut |node| {
            visited.push(node.clone());
            WalkControl::Continue
        });
        visited
    }

    #[test]
    fn visits_every_node_once_parent_first() {
        let schema = json!({
            "type": "object",
            "properties": {
                "tags": { "type": "array", "items": { "type": "string" } },
                "count": { "type": "integer" }
            },
            "additionalProperties": false
        });
        let visited = collect_preorder(&schema);
        assert_eq!(visited.len(), 5);
        assert_eq!(visited[0], schema);
        assert_eq!(visited[1], json!(false));
        assert!(visited.contains(&json!({ "type": "string" })));
        assert!(visited.contains(&json!({ "type": "integer" })));
        let array = visited
            .iter()
            .position(|v| v.get("type") == Some(&json!("array")))
            .unwrap();
        let string = visited
            .iter()
            .position(|v| v == &json!({ "type": "string" }))
            .unwrap();
        assert!(array < string, "parent must precede its child");
    }

    #[test]
    fn skip_prunes_children_but_not_siblings() {
        let schema = json!({
            "anyOf": [
                { "type": "array", "items": { "type": "string" } },
                { "type": "boolean" }
            ]
        });
        let mut visited = Vec::new();
        walk_schema(&schema, &mut |node| {
            visited.push(node.clone());
            if node.get("type") == Some(&json!("array")) {
                WalkControl::Skip
            } else {
                WalkControl::Continue
            }
        });
        assert!(!visited.contains(&json!({ "type": "string" })));
        assert!(visited.contains(&json!({ "type": "boolean" })));
    }

    #[test]
    fn stop_aborts_and_propagates() {
        let schema = json!({
            "allOf": [
                { "type": "string" },
                { "type": "number" },
                { "type": "boolean" }
            ]
        });
        let mut visited = Vec::new();
        let outcome = walk_schema(&schema, &mut |node| {
            visited.push(node.clone());
            if node.get("type") == Some(&json!("number")) {
                WalkControl::Stop
            } else {
                WalkControl::Continue
            }
        });
        assert_eq!(outcome, WalkControl::Stop);
        assert!(!visited.contains(&json!({ "type": "boolean" })));
    }

    #[test]
    fn detects_generic_markers_at_depth() {
        let generic = json!({
            "type": "object",
            "properties": {
                "rows": { "type": "array", "items": { "x-generic": "ROW" } }
            }
        });
        assert!(contains_generic(&generic));
        assert!(!contains_generic(&json!({ "type": "string" })));
    }

    #[test]
    fn sync_walk_pairs_properties_with_fallback() {
        let reference = json!({
            "type": "object",
            "properties": {
                "a": { "x-generic": "T" },
                "b": { "x-generic": "U" }
            }
        });
        let concrete = json!({
            "type": "object",
            "properties": { "a": { "type": "string" } },
            "additionalProperties": { "type": "number" }
        });
        let mut pairs = Vec::new();
        walk_schemas_in_sync(&reference, Some(&concrete), &mut |node, counterpart| {
            if let Some(param) = crate::schema::generic_param(node) {
                pairs.push((param.to_string(), counterpart.cloned()));
            }
            WalkControl::Continue
        });
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            pairs,
            vec![
                ("T".to_string(), Some(json!({ "type": "string" }))),
                ("U".to_string(), Some(json!({ "type": "number" }))),
            ]
        );
    }

    #[test]
    fn sync_walk_all_of_reuses_concrete_node() {
        let reference = json!({
            "allOf": [{ "x-generic": "A" }, { "x-generic": "B" }]
        });
        let concrete = json!({ "type": "integer" });
        let mut counterparts = Vec::new();
        walk_schemas_in_sync(&reference, Some(&concrete), &mut |node, counterpart| {
            if crate::schema::generic_param(node).is_some() {
                counterparts.push(counterpart.cloned());
            }
            WalkControl::Continue
        });
        assert_eq!(counterparts, vec![Some(concrete.clone()), Some(concrete)]);
    }

    #[test]
    fn sync_walk_tuple_positions_fall_back_to_additional_items() {
        let reference = json!({
            "type": "array",
            "items": [{ "x-generic": "X" }, { "x-generic": "Y" }, { "x-generic": "Z" }]
        });
        let concrete = json!({
            "type": "array",
            "items": [{ "type": "string" }],
            "additionalItems": { "type": "null" }
        });
        let mut pairs = Vec::new();
        walk_schemas_in_sync(&reference, Some(&concrete), &mut |node, counterpart| {
            if let Some(param) = crate::schema::generic_param(node) {
                pairs.push((param.to_string(), counterpart.cloned()));
            }
            WalkControl::Continue
        });
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            pairs,
            vec![
                ("X".to_string(), Some(json!({ "type": "string" }))),
                ("Y".to_string(), Some(json!({ "type": "null" }))),
                ("Z".to_string(), Some(json!({ "type": "null" }))),
            ]
        );
    }

    #[test]
    fn sync_walk_single_items_facing_tuple_uses_additional_items() {
        let reference = json!({ "type": "array", "items": { "x-generic": "E" } });
        let concrete = json!({
            "type": "array",
            "items": [{ "type": "string" }],
            "additionalItems": { "type": "integer" }
        });
        let mut counterpart = None;
        walk_schemas_in_sync(&reference, Some(&concrete), &mut |node, c| {
            if crate::schema::generic_param(node).is_some() {
                counterpart = c.cloned();
            }
            WalkControl::Continue
        });
        assert_eq!(counterpart, Some(json!({ "type": "integer" })));
    }

    #[test]
    fn sync_walk_boolean_concrete_descends_without_counterparts() {
        let reference = json!({
            "type": "object",
            "properties": { "x": { "x-generic": "T" } }
        });
        let mut seen = Vec::new();
        walk_schemas_in_sync(&reference, Some(&json!(true)), &mut |node, counterpart| {
            if crate::schema::generic_param(node).is_some() {
                seen.push(counterpart.cloned());
            }
            WalkControl::Continue
        });
        assert_eq!(seen, vec![None]);
    }

    #[test]
    fn sync_walk_union_member_aligns_by_type_tag() {
        let reference = json!({
            "anyOf": [
                { "type": "string", "x-generic": "S" },
                { "type": "number", "x-generic": "N" }
            ]
        });
        let concrete = json!({
            "anyOf": [
                { "type": "number", "minimum": 0 },
                { "type": "string", "maxLength": 8 }
            ]
        });
        let mut pairs = Vec::new();
        walk_schemas_in_sync(&reference, Some(&concrete), &mut |node, counterpart| {
            if let Some(param) = crate::schema::generic_param(node) {
                pairs.push((param.to_string(), counterpart.cloned()));
            }
            WalkControl::Continue
        });
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            pairs,
            vec![
                ("N".to_string(), Some(json!({ "type": "number", "minimum": 0 }))),
                ("S".to_string(), Some(json!({ "type": "string", "maxLength": 8 }))),
            ]
        );
    }

    #[test]
    fn sync_walk_ambiguous_union_member_gets_no_counterpart() {
        let reference = json!({ "anyOf": [{ "type": "string", "x-generic": "S" }] });
        let concrete = json!({
            "anyOf": [
                { "type": "string", "maxLength": 1 },
                { "type": "string", "maxLength": 2 }
            ]
        });
        let mut counterpart = Some(json!("sentinel"));
        walk_schemas_in_sync(&reference, Some(&concrete), &mut |node, c| {
            if crate::schema::generic_param(node).is_some() {
                counterpart = c.cloned();
            }
            WalkControl::Continue
        });
        assert_eq!(counterpart, None);
    }
}
