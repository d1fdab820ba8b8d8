use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::document::Scope;

/// Unified error type for flowdecl operations
#[derive(Debug, Error)]
pub enum FlowdeclError {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // Document errors
    #[error("Parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Declaration file not found at '{0}'")]
    DocumentNotFound(PathBuf),

    // Catalog errors
    #[error("Property '{key}' already exists in {scope} scope")]
    DuplicateKey { scope: Scope, key: String },

    #[error("Property '{key}' not found{}", .scope.as_ref().map(|s| format!(" in {s} scope")).unwrap_or_default())]
    NotFound { scope: Option<Scope>, key: String },

    #[error("Dependency cycle in {scope} scope: {}", .keys.join(" -> "))]
    Cycle { scope: Scope, keys: Vec<String> },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Result type alias for flowdecl operations
pub type Result<T> = std::result::Result<T, FlowdeclError>;

impl FlowdeclError {
    pub(crate) fn not_found(scope: Scope, key: impl Into<String>) -> Self {
        FlowdeclError::NotFound {
            scope: Some(scope),
            key: key.into(),
        }
    }

    pub(crate) fn duplicate(scope: Scope, key: impl Into<String>) -> Self {
        FlowdeclError::DuplicateKey {
            scope,
            key: key.into(),
        }
    }

    /// Returns true for errors caused by the shape of the document or the
    /// requested edit, as opposed to I/O or configuration trouble.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            FlowdeclError::DuplicateKey { .. }
                | FlowdeclError::NotFound { .. }
                | FlowdeclError::Cycle { .. }
                | FlowdeclError::InvalidOperation(_)
        )
    }

    /// Convert to a serializable representation for IPC
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }
}

/// A serializable representation of FlowdeclError for IPC (e.g. a webview)
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Property key involved (if applicable)
    pub key: Option<String>,
    /// Associated path (if applicable)
    pub path: Option<PathBuf>,
}

impl From<&FlowdeclError> for SerializableError {
    fn from(err: &FlowdeclError) -> Self {
        let kind = match err {
            FlowdeclError::Io(_)
            | FlowdeclError::FileRead { .. }
            | FlowdeclError::FileWrite { .. }
            | FlowdeclError::DocumentNotFound(_) => "IOError",
            FlowdeclError::Parse { .. } | FlowdeclError::Xml(_) => "ParseError",
            FlowdeclError::DuplicateKey { .. } => "DuplicateKey",
            FlowdeclError::NotFound { .. } => "NotFound",
            FlowdeclError::Cycle { .. } => "CycleError",
            FlowdeclError::InvalidOperation(_) => "InvalidOperation",
            FlowdeclError::ConfigParse(_)
            | FlowdeclError::ConfigSerialize(_)
            | FlowdeclError::NoConfigDir => "ConfigError",
        }
        .to_string();

        let key = match err {
            FlowdeclError::DuplicateKey { key, .. } => Some(key.clone()),
            FlowdeclError::NotFound { key, .. } => Some(key.clone()),
            FlowdeclError::Cycle { keys, .. } => keys.first().cloned(),
            _ => None,
        };

        let path = match err {
            FlowdeclError::FileRead { path, .. } => Some(path.clone()),
            FlowdeclError::FileWrite { path, .. } => Some(path.clone()),
            FlowdeclError::DocumentNotFound(path) => Some(path.clone()),
            _ => None,
        };

        Self {
            kind,
            message: err.to_string(),
            key,
            path,
        }
    }
}

impl From<FlowdeclError> for SerializableError {
    fn from(err: FlowdeclError) -> Self {
        SerializableError::from(&err)
    }
}
