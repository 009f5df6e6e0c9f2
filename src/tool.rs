//! Tool descriptors, tool sources, and editor registration
//!
//! A [`ToolDescriptor`] is the unit handed to us by a tool server: a unique
//! name, a declared input schema (one property per argument), an optional
//! declared output schema, and a callable. [`register_tools`] walks a
//! source's full tool list once at startup, interns every nameable declared
//! type, and announces one node type per tool to the editor.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{Result, ToolGraphError};
use crate::names::{to_pascal_case, to_title_case};
use crate::schema::walk::contains_generic;
use crate::types::{InterfaceType, TypeRegistry};

/// Argument values for one tool invocation, keyed by argument name.
pub type ToolArguments = Map<String, Value>;

/// Result values from one tool invocation, keyed by result field name.
pub type ToolResult = Map<String, Value>;

/// Opaque per-tool annotations. Only the display category is interpreted.
#[derive(Debug, Clone, Default)]
pub struct ToolAnnotations {
    pub category: Option<String>,
}

/// A named, independently invocable operation with declared schemas.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Object schema with one property per argument.
    pub input_schema: Value,
    /// Object schema with one property per result field, if declared.
    pub output_schema: Option<Value>,
    pub annotations: ToolAnnotations,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            input_schema,
            output_schema: None,
            annotations: ToolAnnotations::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_output_schema(mut self, output_schema: Value) -> Self {
        self.output_schema = Some(output_schema);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.annotations.category = Some(category.into());
        self
    }

    /// True if either declared schema carries a generic marker anywhere.
    /// Generic tools need socket resynchronization on every graph edit;
    /// non-generic tools get fixed sockets at placement.
    pub fn is_generic(&self) -> bool {
        contains_generic(&self.input_schema)
            || self
                .output_schema
                .as_ref()
                .is_some_and(contains_generic)
    }

    pub fn input_properties(&self) -> Option<&Map<String, Value>> {
        self.input_schema
            .get("properties")
            .and_then(Value::as_object)
    }

    pub fn output_properties(&self) -> Option<&Map<String, Value>> {
        self.output_schema
            .as_ref()
            .and_then(|schema| schema.get("properties"))
            .and_then(Value::as_object)
    }
}

/// Where tool descriptors come from. Implementations must exhaust any
/// pagination internally; the engine expects the complete set in one call.
pub trait ToolSource {
    fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Executes a tool. Failures are reported as
    /// [`ToolGraphError::ToolExecution`] and are not schema-engine errors.
    fn call_tool(&mut self, name: &str, arguments: ToolArguments) -> Result<ToolResult>;
}

type ToolHandler = Box<dyn FnMut(ToolArguments) -> std::result::Result<ToolResult, String>>;

/// A [`ToolSource`] backed by in-process handlers. The test double for the
/// real protocol client, and a convenient host for built-in tools.
#[derive(Default)]
pub struct InMemoryToolServer {
    tools: Vec<ToolDescriptor>,
    handlers: HashMap<String, ToolHandler>,
}

impl InMemoryToolServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tool(&mut self, descriptor: ToolDescriptor, handler: ToolHandler) -> Result<()> {
        if self.handlers.contains_key(&descriptor.name) {
            return Err(ToolGraphError::ToolAlreadyRegistered {
                name: descriptor.name,
            });
        }
        self.handlers.insert(descriptor.name.clone(), handler);
        self.tools.push(descriptor);
        Ok(())
    }
}

impl ToolSource for InMemoryToolServer {
    fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(self.tools.clone())
    }

    fn call_tool(&mut self, name: &str, arguments: ToolArguments) -> Result<ToolResult> {
        let handler = self
            .handlers
            .get_mut(name)
            .ok_or_else(|| ToolGraphError::ToolNotFound {
                name: name.to_string(),
            })?;
        handler(arguments).map_err(|message| ToolGraphError::ToolExecution {
            tool: name.to_string(),
            message,
        })
    }
}

/// What the editor needs to offer a tool as a placeable node.
#[derive(Debug, Clone)]
pub struct NodeTypeDescriptor {
    /// Editor-facing node type identifier, e.g. `GenerateImageNode`.
    pub node_type: String,
    pub title: String,
    /// Name of the tool this node type invokes.
    pub tool: String,
    pub generic: bool,
}

/// The editor-side surface the engine drives. The real implementation wraps
/// the graph editor's own registries; tests use a recording stub.
pub trait EditorRegistry {
    fn register_node_type(&mut self, descriptor: &NodeTypeDescriptor, category: &str);
    fn add_interface_types(&mut self, types: &[Arc<InterfaceType>]);
}

/// Registered tools, keyed by name.
#[derive(Debug, Default)]
pub struct ToolCatalog {
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolCatalog {
    pub fn get(&self, name: &str) -> Result<&ToolDescriptor> {
        self.tools
            .get(name)
            .ok_or_else(|| ToolGraphError::ToolNotFound {
                name: name.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Fetches every tool from `source`, interns the declared types, and
/// registers one node type per tool with the editor.
///
/// Declared property schemas must be nameable: an unnameable non-generic
/// property is a configuration error in the tool server and aborts startup,
/// unless `registration.strict_naming` is disabled, in which case it is
/// logged and the socket falls back to `unknown`. Generic-marker properties
/// are exempt; they stay `unknown` until resolved from connections.
pub fn register_tools(
    source: &dyn ToolSource,
    editor: &mut dyn EditorRegistry,
    registry: &mut TypeRegistry,
    config: &EngineConfig,
) -> Result<ToolCatalog> {
    let tools = source.list_tools()?;
    editor.add_interface_types(&registry.all());

    let mut catalog = ToolCatalog::default();
    for tool in tools {
        if catalog.tools.contains_key(&tool.name) {
            return Err(ToolGraphError::ToolAlreadyRegistered { name: tool.name });
        }

        let mut synthesized = Vec::new();
        for (side, properties) in [
            ("input", tool.input_properties()),
            ("output", tool.output_properties()),
        ] {
            let Some(properties) = properties else { continue };
            for (property, schema) in properties {
                if schema.is_boolean() || contains_generic(schema) {
                    continue;
                }
                match registry.upsert(schema) {
                    Ok(ty) => synthesized.push(ty),
                    Err(ToolGraphError::MissingTypeName { .. }) => {
                        let context =
                            format!("{side} property '{property}' of tool '{}'", tool.name);
                        if config.registration.strict_naming {
                            return Err(ToolGraphError::MissingTypeName {
                                context,
                                schema: schema.to_string(),
                            });
                        }
                        warn!(%context, "unnameable declared schema, socket will be 'unknown'");
                    }
                    Err(other) => return Err(other),
                }
            }
        }
        if !synthesized.is_empty() {
            editor.add_interface_types(&synthesized);
        }

        let descriptor = NodeTypeDescriptor {
            node_type: format!("{}Node", to_pascal_case(&tool.name)),
            title: tool
                .title
                .clone()
                .unwrap_or_else(|| to_title_case(&tool.name)),
            tool: tool.name.clone(),
            generic: tool.is_generic(),
        };
        let category = tool
            .annotations
            .category
            .clone()
            .unwrap_or_else(|| config.registration.default_category.clone());
        debug!(tool = %tool.name, node_type = %descriptor.node_type, %category, "registering node type");
        editor.register_node_type(&descriptor, &category);
        catalog.tools.insert(tool.name.clone(), tool);
    }

    info!(tools = catalog.len(), "tool registration complete");
    Ok(catalog)
}
