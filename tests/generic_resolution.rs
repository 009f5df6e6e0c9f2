//! End-to-end generic resolution scenarios
//!
//! Exercises the full path: tool registration, node placement, connection
//! events, binding extraction, substitution, and socket re-typing.

use std::sync::Arc;

use serde_json::json;

use toolgraph::{
    register_tools, EditorRegistry, EngineConfig, InMemoryToolServer, NodeTypeDescriptor,
    SocketRef, ToolDescriptor, ToolGraph, ToolGraphError, ToolResult, TypeRegistry,
};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Fixture tools
// =============================================================================

/// `identity(x: T) -> { y: T }`
fn identity_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "identity",
        json!({
            "type": "object",
            "properties": { "x": { "x-generic": "T" } }
        }),
    )
    .with_output_schema(json!({
        "type": "object",
        "properties": { "y": { "x-generic": "T" } }
    }))
}

/// `wrap(item: T) -> { items: list[T] }`
fn wrap_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "wrap",
        json!({
            "type": "object",
            "properties": { "item": { "x-generic": "T" } }
        }),
    )
    .with_output_schema(json!({
        "type": "object",
        "properties": {
            "items": { "type": "array", "items": { "x-generic": "T" } }
        }
    }))
}

/// `literal-string() -> { text: string }`
fn literal_string_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "literal-string",
        json!({ "type": "object", "properties": {} }),
    )
    .with_output_schema(json!({
        "type": "object",
        "properties": { "text": { "type": "string" } }
    }))
}

/// `literal-number() -> { value: number }`
fn literal_number_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "literal-number",
        json!({ "type": "object", "properties": {} }),
    )
    .with_output_schema(json!({
        "type": "object",
        "properties": { "value": { "type": "number" } }
    }))
}

// =============================================================================
// Socket reconciliation
// =============================================================================

#[test]
fn connecting_a_string_resolves_the_output_socket() {
    init_tracing();
    let mut registry = TypeRegistry::new();
    let mut graph = ToolGraph::new();

    let source = graph.add_node(&literal_string_tool(), &mut registry).unwrap();
    let node = graph.add_node(&identity_tool(), &mut registry).unwrap();

    // Unresolved generic sockets start at `unknown`.
    assert_eq!(graph.node(node).unwrap().input("x").unwrap().ty().name(), "unknown");
    assert_eq!(graph.node(node).unwrap().output("y").unwrap().ty().name(), "unknown");

    graph
        .connect(
            SocketRef::new(source, "text"),
            SocketRef::new(node, "x"),
            &mut registry,
        )
        .unwrap();

    let resolved = graph.node(node).unwrap();
    assert_eq!(resolved.input("x").unwrap().ty().name(), "string");
    assert_eq!(resolved.output("y").unwrap().ty().name(), "string");
}

#[test]
fn disconnecting_keeps_the_last_resolved_type() {
    init_tracing();
    let mut registry = TypeRegistry::new();
    let mut graph = ToolGraph::new();

    let source = graph.add_node(&literal_string_tool(), &mut registry).unwrap();
    let node = graph.add_node(&identity_tool(), &mut registry).unwrap();
    let input = SocketRef::new(node, "x");
    graph
        .connect(SocketRef::new(source, "text"), input.clone(), &mut registry)
        .unwrap();

    assert!(graph.disconnect(&input, &mut registry));

    // The declared schema is generic again, so the pass records no binding
    // and leaves both sockets at their last resolved type.
    let node = graph.node(node).unwrap();
    assert_eq!(node.input("x").unwrap().ty().name(), "string");
    assert_eq!(node.output("y").unwrap().ty().name(), "string");
}

#[test]
fn once_resolved_a_conflicting_reconnection_is_rejected() {
    init_tracing();
    let mut registry = TypeRegistry::new();
    let mut graph = ToolGraph::new();

    let strings = graph.add_node(&literal_string_tool(), &mut registry).unwrap();
    let numbers = graph.add_node(&literal_number_tool(), &mut registry).unwrap();
    let node = graph.add_node(&identity_tool(), &mut registry).unwrap();
    let input = SocketRef::new(node, "x");

    graph
        .connect(SocketRef::new(strings, "text"), input.clone(), &mut registry)
        .unwrap();
    graph.disconnect(&input, &mut registry);

    // The input socket kept its `string` resolution, so a number source no
    // longer converts into it.
    let result = graph.connect(SocketRef::new(numbers, "value"), input, &mut registry);
    match result {
        Err(ToolGraphError::IncompatibleConnection { from_type, to_type, .. }) => {
            assert_eq!(from_type, "number");
            assert_eq!(to_type, "string");
        }
        other => panic!("Expected IncompatibleConnection, got {:?}", other),
    }
}

#[test]
fn resolution_propagates_through_chained_generic_nodes() {
    init_tracing();
    let mut registry = TypeRegistry::new();
    let mut graph = ToolGraph::new();

    let source = graph.add_node(&literal_string_tool(), &mut registry).unwrap();
    let first = graph.add_node(&identity_tool(), &mut registry).unwrap();
    let second = graph.add_node(&identity_tool(), &mut registry).unwrap();

    graph
        .connect(
            SocketRef::new(source, "text"),
            SocketRef::new(first, "x"),
            &mut registry,
        )
        .unwrap();
    graph
        .connect(
            SocketRef::new(first, "y"),
            SocketRef::new(second, "x"),
            &mut registry,
        )
        .unwrap();

    assert_eq!(
        graph.node(second).unwrap().output("y").unwrap().ty().name(),
        "string"
    );
}

#[test]
fn composite_types_come_out_of_resolution_interned() {
    init_tracing();
    let mut registry = TypeRegistry::new();
    let mut graph = ToolGraph::new();

    let source = graph.add_node(&literal_string_tool(), &mut registry).unwrap();
    let node = graph.add_node(&wrap_tool(), &mut registry).unwrap();
    graph
        .connect(
            SocketRef::new(source, "text"),
            SocketRef::new(node, "item"),
            &mut registry,
        )
        .unwrap();

    let items = graph.node(node).unwrap().output("items").unwrap().ty().clone();
    assert_eq!(items.name(), "list[string]");

    // Resolution went through the registry, so the socket's handle is the
    // same one `list_of(string)` hands out.
    let string = registry.get("string").unwrap();
    let list_string = registry.list_of(&string);
    assert!(Arc::ptr_eq(&items, &list_string));
}

#[test]
fn partial_resolution_leaves_unrelated_parameters_alone() {
    init_tracing();
    let mut registry = TypeRegistry::new();
    let mut graph = ToolGraph::new();

    // pair(a: A, b: B) -> { first: A, second: B }
    let pair = ToolDescriptor::new(
        "pair",
        json!({
            "type": "object",
            "properties": {
                "a": { "x-generic": "A" },
                "b": { "x-generic": "B" }
            }
        }),
    )
    .with_output_schema(json!({
        "type": "object",
        "properties": {
            "first": { "x-generic": "A" },
            "second": { "x-generic": "B" }
        }
    }));

    let source = graph.add_node(&literal_string_tool(), &mut registry).unwrap();
    let node = graph.add_node(&pair, &mut registry).unwrap();
    graph
        .connect(
            SocketRef::new(source, "text"),
            SocketRef::new(node, "a"),
            &mut registry,
        )
        .unwrap();

    let node = graph.node(node).unwrap();
    assert_eq!(node.output("first").unwrap().ty().name(), "string");
    assert_eq!(node.output("second").unwrap().ty().name(), "unknown");
    assert_eq!(node.input("b").unwrap().ty().name(), "unknown");
}

// =============================================================================
// Registration end-to-end
// =============================================================================

#[derive(Default)]
struct RecordingEditor {
    node_types: Vec<(NodeTypeDescriptor, String)>,
    type_names: Vec<String>,
}

impl EditorRegistry for RecordingEditor {
    fn register_node_type(&mut self, descriptor: &NodeTypeDescriptor, category: &str) {
        self.node_types
            .push((descriptor.clone(), category.to_string()));
    }

    fn add_interface_types(&mut self, types: &[Arc<toolgraph::InterfaceType>]) {
        self.type_names
            .extend(types.iter().map(|ty| ty.name().to_string()));
    }
}

#[test]
fn startup_registers_every_tool_and_executes_them() {
    init_tracing();
    let mut server = InMemoryToolServer::new();
    server
        .add_tool(
            literal_string_tool().with_category("Literals"),
            Box::new(|_| {
                let mut result = ToolResult::new();
                result.insert("text".to_string(), json!("hello"));
                Ok(result)
            }),
        )
        .unwrap();
    server
        .add_tool(
            identity_tool(),
            Box::new(|arguments| {
                let mut result = ToolResult::new();
                result.insert(
                    "y".to_string(),
                    arguments.get("x").cloned().unwrap_or(serde_json::Value::Null),
                );
                Ok(result)
            }),
        )
        .unwrap();

    let mut editor = RecordingEditor::default();
    let mut registry = TypeRegistry::new();
    let config = EngineConfig::default();
    let catalog = register_tools(&server, &mut editor, &mut registry, &config).unwrap();

    assert_eq!(catalog.len(), 2);
    let names: Vec<&str> = editor
        .node_types
        .iter()
        .map(|(d, _)| d.node_type.as_str())
        .collect();
    assert_eq!(names, ["LiteralStringNode", "IdentityNode"]);
    let categories: Vec<&str> = editor.node_types.iter().map(|(_, c)| c.as_str()).collect();
    assert_eq!(categories, ["Literals", "Tools"]);

    // Tools loaded from the catalog drive live graphs.
    use toolgraph::ToolSource;
    let mut graph = ToolGraph::new();
    let source = graph
        .add_node(catalog.get("literal-string").unwrap(), &mut registry)
        .unwrap();
    let node = graph
        .add_node(catalog.get("identity").unwrap(), &mut registry)
        .unwrap();
    graph
        .connect(
            SocketRef::new(source, "text"),
            SocketRef::new(node, "x"),
            &mut registry,
        )
        .unwrap();
    assert_eq!(graph.node(node).unwrap().output("y").unwrap().ty().name(), "string");

    let mut arguments = toolgraph::ToolArguments::new();
    arguments.insert("x".to_string(), json!("pass-through"));
    let result = server.call_tool("identity", arguments).unwrap();
    assert_eq!(result.get("y"), Some(&json!("pass-through")));
}

#[test]
fn lenient_naming_downgrades_the_startup_error() {
    init_tracing();
    let unnameable = ToolDescriptor::new(
        "opaque",
        json!({
            "type": "object",
            "properties": {
                "payload": { "type": "object", "properties": { "a": { "type": "string" } } }
            }
        }),
    );
    let mut server = InMemoryToolServer::new();
    server
        .add_tool(unnameable, Box::new(|_| Ok(ToolResult::new())))
        .unwrap();

    let mut editor = RecordingEditor::default();
    let mut registry = TypeRegistry::new();

    let strict = EngineConfig::default();
    match register_tools(&server, &mut editor, &mut registry, &strict) {
        Err(ToolGraphError::MissingTypeName { context, .. }) => {
            assert!(context.contains("opaque"));
        }
        other => panic!("Expected MissingTypeName, got {:?}", other),
    }

    let mut lenient = EngineConfig::default();
    lenient.registration.strict_naming = false;
    let catalog = register_tools(&server, &mut editor, &mut registry, &lenient).unwrap();
    assert_eq!(catalog.len(), 1);

    // The unnameable property still yields a placeable node; its socket
    // falls back to `unknown`.
    let mut graph = ToolGraph::new();
    let id = graph
        .add_node(catalog.get("opaque").unwrap(), &mut registry)
        .unwrap();
    assert_eq!(
        graph.node(id).unwrap().input("payload").unwrap().ty().name(),
        "unknown"
    );
}
