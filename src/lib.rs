//! Tool Graph Engine
//!
//! Wires callable tools into a visual node-graph editor and derives each
//! tool's editor node type from its declared input/output schemas. The heart
//! of the crate is the generic-resolution engine: tools may declare open
//! type parameters in their schemas (marked with `x-generic`), and the
//! engine infers the concrete types from whatever is connected to a placed
//! node's sockets, then rebuilds the node's socket types to match.
//!
//! ## Layers
//!
//! - [`schema`] — structural walking, synchronized dual-tree walking,
//!   copy-on-write transformation, generic extraction/substitution, and
//!   canonical type naming over JSON-Schema-like trees.
//! - [`types`] — process-wide interning of resolved type shapes into
//!   identity-comparable [`InterfaceType`] handles.
//! - [`graph`] — placed nodes, sockets, and connections, plus the socket
//!   synchronizer that re-runs resolution on every edge change.
//! - [`tool`] — tool descriptors, the [`ToolSource`] boundary to the tool
//!   server, and editor registration.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use toolgraph::{SocketRef, ToolDescriptor, ToolGraph, TypeRegistry};
//!
//! let mut registry = TypeRegistry::new();
//! let mut graph = ToolGraph::new();
//!
//! let literal = ToolDescriptor::new(
//!     "literal-string",
//!     json!({ "type": "object", "properties": {} }),
//! )
//! .with_output_schema(json!({
//!     "type": "object",
//!     "properties": { "text": { "type": "string" } }
//! }));
//! let identity = ToolDescriptor::new(
//!     "identity",
//!     json!({
//!         "type": "object",
//!         "properties": { "value": { "x-generic": "T" } }
//!     }),
//! )
//! .with_output_schema(json!({
//!     "type": "object",
//!     "properties": { "value": { "x-generic": "T" } }
//! }));
//!
//! let source = graph.add_node(&literal, &mut registry).unwrap();
//! let node = graph.add_node(&identity, &mut registry).unwrap();
//! graph
//!     .connect(
//!         SocketRef::new(source, "text"),
//!         SocketRef::new(node, "value"),
//!         &mut registry,
//!     )
//!     .unwrap();
//!
//! let node = graph.node(node).unwrap();
//! assert_eq!(node.output("value").unwrap().ty().name(), "string");
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod graph;
pub mod names;
pub mod schema;
pub mod tool;
pub mod types;

pub use checksum::Checksum;
pub use config::EngineConfig;
pub use error::{Result, ToolGraphError};
pub use graph::{Connection, NodeId, Socket, SocketRef, ToolGraph, ToolNode};
pub use schema::generics::{
    extract_generic_bindings, substitute_generic_bindings, GenericBindings,
};
pub use schema::name::type_name_of;
pub use schema::transform::transform_schema;
pub use schema::walk::{
    contains_generic, schema_contains, walk_schema, walk_schemas_in_sync, WalkControl,
};
pub use tool::{
    register_tools, EditorRegistry, InMemoryToolServer, NodeTypeDescriptor, ToolAnnotations,
    ToolArguments, ToolCatalog, ToolDescriptor, ToolResult, ToolSource,
};
pub use types::{InterfaceType, SubscriberId, TypeKind, TypeRegistry};
