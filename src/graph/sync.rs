//! Node socket synchronization
//!
//! Keeps a generic node's live sockets consistent with the types currently
//! inferred from its connections. One pass gathers the concrete schema
//! behind each connected socket, extracts generic bindings (declared outputs
//! first, then declared inputs, so output-derived bindings keep precedence),
//! substitutes the bindings back into the declared schemas, and re-types the
//! node's sockets in place. Resolution is strictly best-effort: a property
//! whose filled schema is still a generic marker, a boolean, or otherwise
//! unnameable leaves its socket untouched, so a failed pass can at worst
//! show a stale or `unknown` label.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, trace};

use super::{NodeId, Socket, SocketRef, ToolGraph};
use crate::schema::generics::{
    extract_generic_bindings, substitute_generic_bindings, GenericBindings,
};
use crate::schema::walk::contains_generic;
use crate::types::TypeRegistry;

impl ToolGraph {
    /// Re-runs resolution for every generic node.
    ///
    /// Conservative by design: an edge change anywhere in the graph may have
    /// connected or freed a socket feeding any generic node, so all of them
    /// are re-synced on every change. Non-generic nodes are skipped.
    pub fn resync_generic_nodes(&mut self, registry: &mut TypeRegistry) {
        let generic_nodes: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|node| node.is_generic())
            .map(|node| node.id)
            .collect();
        for id in generic_nodes {
            self.sync_node(id, registry);
        }
    }

    /// One resolution pass for one node. Never fails; see the module docs
    /// for the best-effort contract.
    pub(crate) fn sync_node(&mut self, id: NodeId, registry: &mut TypeRegistry) {
        let Some(node) = self.nodes.get(&id) else { return };
        if !node.generic {
            return;
        }

        let concrete_inputs = self.observed_object_schema(id, &node.inputs, &node.declared_inputs);
        let declared_inputs = node.declared_inputs.clone();
        let declared_outputs = node.declared_outputs.clone();
        let concrete_outputs = declared_outputs
            .as_ref()
            .map(|declared| self.observed_object_schema(id, &node.outputs, declared));

        let mut bindings = GenericBindings::new();
        if let Some(declared) = &declared_outputs {
            bindings = extract_generic_bindings(declared, concrete_outputs.as_ref(), bindings);
        }
        bindings = extract_generic_bindings(&declared_inputs, Some(&concrete_inputs), bindings);
        trace!(
            node = id,
            parameters = ?bindings.keys().collect::<Vec<_>>(),
            "extracted generic bindings"
        );

        let filled_inputs = substitute_generic_bindings(&declared_inputs, &bindings);
        let filled_outputs = declared_outputs
            .as_ref()
            .map(|declared| substitute_generic_bindings(declared, &bindings));

        let Some(node) = self.nodes.get_mut(&id) else { return };
        apply_filled_types(&mut node.inputs, &filled_inputs, registry);
        if let Some(filled) = &filled_outputs {
            apply_filled_types(&mut node.outputs, filled, registry);
        }
    }

    /// Assembles the synthetic concrete object schema for one side of a
    /// node: one property per socket, holding the schema of the type
    /// connected into that socket, or the declared property schema when the
    /// socket is unconnected.
    fn observed_object_schema(&self, owner: NodeId, sockets: &[Socket], declared: &Value) -> Value {
        let declared_properties = declared.get("properties").and_then(Value::as_object);
        let mut properties = Map::new();
        for socket in sockets {
            let address = SocketRef::new(owner, socket.name());
            let observed = self.connection_into(&address).and_then(|connection| {
                let source = self.nodes.get(&connection.from.node)?;
                let socket = source.output(&connection.from.socket)?;
                Some(socket.ty().schema().clone())
            });
            let fallback = declared_properties
                .and_then(|p| p.get(socket.name()))
                .cloned();
            if let Some(schema) = observed.or(fallback) {
                properties.insert(socket.name().to_string(), schema);
            }
        }
        json!({ "type": "object", "properties": properties })
    }
}

fn apply_filled_types(sockets: &mut [Socket], filled: &Value, registry: &mut TypeRegistry) {
    let Some(properties) = filled.get("properties").and_then(Value::as_object) else {
        return;
    };
    for (name, schema) in properties {
        if schema.is_boolean() || contains_generic(schema) {
            continue;
        }
        // Properties without a matching socket are silently ignored; the
        // socket set is fixed to the tool's declared property names.
        let Some(socket) = sockets.iter_mut().find(|s| s.name() == name) else {
            continue;
        };
        match registry.upsert(schema) {
            Ok(ty) => {
                if !Arc::ptr_eq(&ty, socket.ty()) {
                    debug!(socket = %name, new_type = %ty, "socket re-typed");
                    socket.set_type(ty);
                }
            }
            Err(error) => {
                debug!(socket = %name, %error, "filled schema not nameable, socket unchanged");
            }
        }
    }
}
