//! Graph model: nodes, sockets, and connections
//!
//! The engine never owns the visual editor; it owns a mirror of the pieces
//! resolution needs. A [`ToolGraph`] holds placed [`ToolNode`]s and the
//! connection list, and re-runs generic resolution for every generic node on
//! each edge change (see [`sync`]).

pub mod sync;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ToolGraphError};
use crate::names::to_title_case;
use crate::schema::walk::contains_generic;
use crate::tool::ToolDescriptor;
use crate::types::{InterfaceType, TypeRegistry};

/// Graph-assigned node identifier.
pub type NodeId = u64;

/// Addresses one socket on one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketRef {
    pub node: NodeId,
    pub socket: String,
}

impl SocketRef {
    pub fn new(node: NodeId, socket: impl Into<String>) -> Self {
        Self {
            node,
            socket: socket.into(),
        }
    }
}

impl fmt::Display for SocketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.socket)
    }
}

/// A directed edge from an output socket to an input socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub from: SocketRef,
    pub to: SocketRef,
}

/// A named slot on a node.
///
/// The socket's identity is stable for the node's lifetime; only its type is
/// swapped as generic resolution progresses, so user-entered values and
/// existing connections survive a re-type.
#[derive(Debug, Clone)]
pub struct Socket {
    name: String,
    label: String,
    ty: Arc<InterfaceType>,
    value: Option<Value>,
}

impl Socket {
    fn new(name: &str, ty: Arc<InterfaceType>) -> Self {
        Self {
            name: name.to_string(),
            label: to_title_case(name),
            ty,
            value: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display label derived from the socket name, e.g. `maxTokens` shows
    /// as `Max Tokens`.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn ty(&self) -> &Arc<InterfaceType> {
        &self.ty
    }

    pub(crate) fn set_type(&mut self, ty: Arc<InterfaceType>) {
        self.ty = ty;
    }

    /// User-entered literal value, inputs only.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

/// A placed instance of a tool.
#[derive(Debug, Clone)]
pub struct ToolNode {
    id: NodeId,
    tool: String,
    declared_inputs: Value,
    declared_outputs: Option<Value>,
    generic: bool,
    inputs: Vec<Socket>,
    outputs: Vec<Socket>,
}

impl ToolNode {
    fn from_tool(id: NodeId, tool: &ToolDescriptor, registry: &mut TypeRegistry) -> Result<Self> {
        let inputs = sockets_from(tool.input_properties(), registry)?;
        let outputs = sockets_from(tool.output_properties(), registry)?;
        Ok(Self {
            id,
            tool: tool.name.clone(),
            declared_inputs: tool.input_schema.clone(),
            declared_outputs: tool.output_schema.clone(),
            generic: tool.is_generic(),
            inputs,
            outputs,
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Name of the tool this node invokes.
    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn is_generic(&self) -> bool {
        self.generic
    }

    pub fn inputs(&self) -> &[Socket] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Socket] {
        &self.outputs
    }

    pub fn input(&self, name: &str) -> Option<&Socket> {
        self.inputs.iter().find(|socket| socket.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&Socket> {
        self.outputs.iter().find(|socket| socket.name == name)
    }

    /// Stores a literal value on an input socket.
    pub fn set_input_value(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        let socket = self
            .inputs
            .iter_mut()
            .find(|socket| socket.name == name)
            .ok_or_else(|| ToolGraphError::SocketNotFound {
                node: self.id.to_string(),
                socket: name.to_string(),
            })?;
        socket.value = value;
        Ok(())
    }
}

/// Declared property schemas that are generic, boolean, or otherwise
/// unnameable start life as `unknown` sockets; resolution narrows them
/// later.
fn sockets_from(
    properties: Option<&serde_json::Map<String, Value>>,
    registry: &mut TypeRegistry,
) -> Result<Vec<Socket>> {
    let Some(properties) = properties else {
        return Ok(Vec::new());
    };
    let mut sockets = Vec::with_capacity(properties.len());
    for (name, schema) in properties {
        let ty = if contains_generic(schema) {
            registry.unknown()
        } else {
            match registry.upsert(schema) {
                Ok(ty) => ty,
                Err(ToolGraphError::MissingTypeName { .. }) => registry.unknown(),
                Err(other) => return Err(other),
            }
        };
        sockets.push(Socket::new(name, ty));
    }
    Ok(sockets)
}

/// The connection graph the engine reconciles against.
#[derive(Debug, Default)]
pub struct ToolGraph {
    nodes: BTreeMap<NodeId, ToolNode>,
    connections: Vec<Connection>,
    next_id: NodeId,
}

impl ToolGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a node for a tool and runs its initial resolution pass.
    pub fn add_node(&mut self, tool: &ToolDescriptor, registry: &mut TypeRegistry) -> Result<NodeId> {
        let id = self.next_id;
        self.next_id += 1;
        let node = ToolNode::from_tool(id, tool, registry)?;
        debug!(node = id, tool = %tool.name, "placed node");
        self.nodes.insert(id, node);
        self.sync_node(id, registry);
        Ok(id)
    }

    /// Removes a node along with every connection touching it.
    pub fn remove_node(&mut self, id: NodeId, registry: &mut TypeRegistry) -> Result<()> {
        if self.nodes.remove(&id).is_none() {
            return Err(ToolGraphError::NodeNotFound { id: id.to_string() });
        }
        self.connections
            .retain(|c| c.from.node != id && c.to.node != id);
        self.resync_generic_nodes(registry);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Result<&ToolNode> {
        self.nodes
            .get(&id)
            .ok_or_else(|| ToolGraphError::NodeNotFound { id: id.to_string() })
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut ToolNode> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| ToolGraphError::NodeNotFound { id: id.to_string() })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ToolNode> {
        self.nodes.values()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// The connection terminating at an input socket, if any. Fan-in is at
    /// most one, so this is unambiguous.
    pub fn connection_into(&self, to: &SocketRef) -> Option<&Connection> {
        self.connections.iter().find(|c| c.to == *to)
    }

    /// Connects an output socket to an input socket.
    ///
    /// The source type must be convertible to the destination type under the
    /// current resolution state. An edge into an already-occupied input
    /// replaces the existing one. Every edge change re-runs resolution for
    /// all generic nodes.
    pub fn connect(&mut self, from: SocketRef, to: SocketRef, registry: &mut TypeRegistry) -> Result<()> {
        let from_type = {
            let node = self.node(from.node)?;
            node.output(&from.socket)
                .ok_or_else(|| ToolGraphError::SocketNotFound {
                    node: from.node.to_string(),
                    socket: from.socket.clone(),
                })?
                .ty()
                .clone()
        };
        let to_type = {
            let node = self.node(to.node)?;
            node.input(&to.socket)
                .ok_or_else(|| ToolGraphError::SocketNotFound {
                    node: to.node.to_string(),
                    socket: to.socket.clone(),
                })?
                .ty()
                .clone()
        };
        if !from_type.converts_to(&to_type) {
            return Err(ToolGraphError::IncompatibleConnection {
                from: from.to_string(),
                from_type: from_type.name().to_string(),
                to: to.to_string(),
                to_type: to_type.name().to_string(),
            });
        }

        self.connections.retain(|c| c.to != to);
        debug!(%from, %to, "connected");
        self.connections.push(Connection { from, to });
        self.resync_generic_nodes(registry);
        Ok(())
    }

    /// Removes the connection terminating at an input socket. Returns
    /// whether an edge was actually removed.
    pub fn disconnect(&mut self, to: &SocketRef, registry: &mut TypeRegistry) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| c.to != *to);
        let removed = self.connections.len() != before;
        if removed {
            debug!(%to, "disconnected");
            self.resync_generic_nodes(registry);
        }
        removed
    }
}
