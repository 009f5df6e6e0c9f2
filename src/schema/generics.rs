//! Generic parameter extraction and substitution
//!
//! A tool's declared schema may mark positions as open parameters (see
//! [`GENERIC_MARKER`](super::GENERIC_MARKER)). Given a concrete schema
//! observed from the graph's connections, [`extract_generic_bindings`]
//! unifies the two and collects the parameters' concrete assignments;
//! [`substitute_generic_bindings`] writes those assignments back into the
//! declared schema.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use super::transform::transform_schema;
use super::walk::{contains_generic, walk_schemas_in_sync, WalkControl};

/// Resolved assignments from generic parameter name to concrete schema.
pub type GenericBindings = BTreeMap<String, Value>;

/// Collects generic bindings by walking `reference` and `concrete` in sync.
///
/// Wherever the reference side carries a generic marker and an aligned
/// concrete counterpart exists, the parameter is bound to that counterpart.
/// Within one call, a later site for the same parameter overwrites an
/// earlier one. Bindings already present in `bindings` when the call starts
/// are never overwritten: callers extract from a tool's output schema first
/// and feed the result into a second pass over the input schema, so
/// output-derived assignments keep priority over input-derived ones.
///
/// Counterparts that themselves still contain generic markers are ignored.
/// Unconnected sockets fall back to their declared (generic) schema when the
/// synthetic concrete schema is assembled, and binding a parameter to its own
/// marker would poison substitution.
pub fn extract_generic_bindings(
    reference: &Value,
    concrete: Option<&Value>,
    mut bindings: GenericBindings,
) -> GenericBindings {
    let locked: BTreeSet<String> = bindings.keys().cloned().collect();
    walk_schemas_in_sync(reference, concrete, &mut |node, counterpart| {
        if let (Some(param), Some(observed)) = (super::generic_param(node), counterpart) {
            if !locked.contains(param) && !contains_generic(observed) {
                bindings.insert(param.to_string(), observed.clone());
            }
        }
        WalkControl::Continue
    });
    bindings
}

/// Replaces every generic marker in `schema` with its binding, if one exists.
///
/// Unbound markers are left in place; callers treat a surviving marker as
/// "still unresolved" and keep the affected socket at its previous type. The
/// input is never mutated.
pub fn substitute_generic_bindings(schema: &Value, bindings: &GenericBindings) -> Value {
    transform_schema(schema, &mut |node| {
        super::generic_param(node).and_then(|param| bindings.get(param).cloned())
    })
    .into_owned()
}
