//! Error types for the tool graph engine

use thiserror::Error;

/// Result type for tool graph operations
pub type Result<T> = std::result::Result<T, ToolGraphError>;

/// Tool graph errors
#[derive(Error, Debug)]
pub enum ToolGraphError {
    #[error("no derivable type name for {context}: {schema}")]
    MissingTypeName { context: String, schema: String },

    #[error("type name '{name}' is already taken by a different schema")]
    CoreTypeConflict { name: String },

    #[error("tool already registered: {name}")]
    ToolAlreadyRegistered { name: String },

    #[error("tool not found: {name}")]
    ToolNotFound { name: String },

    #[error("node not found: {id}")]
    NodeNotFound { id: String },

    #[error("socket '{socket}' not found on node '{node}'")]
    SocketNotFound { node: String, socket: String },

    #[error("cannot connect '{from}' ({from_type}) to '{to}' ({to_type}): types are not convertible")]
    IncompatibleConnection {
        from: String,
        from_type: String,
        to: String,
        to_type: String,
    },

    #[error("tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("config error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
