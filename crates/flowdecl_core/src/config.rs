//! Configuration types for flowdecl.
//!
//! This module provides the [`Config`] struct which stores user preferences.
//! Configuration is persisted as TOML (typically at
//! `~/.config/flowdecl/config.toml` on Unix systems).
//!
//! # Key Configuration Fields
//!
//! - `default_workspace`: Workspace directory used when none is given
//! - `indent`: Indentation width used when writing declaration files
//! - `extra_structural_fields`: Element-scope keys that are not properties
//! - `element_defaults` / `connection_defaults`: Attributes for new properties
//!
//! # Example
//!
//! ```ignore
//! use flowdecl_core::config::Config;
//!
//! // Load from default location (native only)
//! let config = Config::load()?;
//!
//! // Access config values
//! let indent = config.indent;
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::document::{Attributes, Scope};
use crate::error::{FlowdeclError, Result};
use crate::fs::FileSystem;

fn default_indent() -> usize {
    2
}

fn is_default_indent(indent: &usize) -> bool {
    *indent == default_indent()
}

/// `Config` is a data structure that represents the parts of flowdecl that the user can configure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Workspace directory to use when no file or workspace is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_workspace: Option<PathBuf>,

    /// Indentation width for written declaration files (0 writes a single line)
    #[serde(default = "default_indent", skip_serializing_if = "is_default_indent")]
    pub indent: usize,

    /// Element-scope keys to treat as document configuration rather than
    /// editable properties, in addition to the built-in set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_structural_fields: Vec<String>,

    /// Attributes given to new element-scope properties.
    /// `{key}` in a value is replaced by the property key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_defaults: Option<IndexMap<String, String>>,

    /// Attributes given to new connection-scope properties.
    /// `{key}` in a value is replaced by the property key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_defaults: Option<IndexMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_workspace: None,
            indent: default_indent(),
            extra_structural_fields: Vec::new(),
            element_defaults: None,
            connection_defaults: None,
        }
    }
}

impl Config {
    /// Create a new config with the given workspace directory
    pub fn new(default_workspace: PathBuf) -> Self {
        Self {
            default_workspace: Some(default_workspace),
            ..Default::default()
        }
    }

    /// Attributes for a new property of `scope` named `key`.
    ///
    /// Uses the configured defaults when present, otherwise the built-in ones.
    pub fn default_attributes(&self, scope: Scope, key: &str) -> Attributes {
        let configured = match scope {
            Scope::Element => self.element_defaults.as_ref(),
            Scope::Connection => self.connection_defaults.as_ref(),
        };
        match configured {
            Some(map) => map
                .iter()
                .map(|(k, v)| (k.clone(), v.replace("{key}", key)))
                .collect(),
            None => builtin_defaults(scope, key),
        }
    }

    /// Load config from a specific path.
    pub fn load_from<FS: FileSystem>(fs: &FS, path: &Path) -> Result<Self> {
        let contents = fs
            .read_to_string(path)
            .map_err(|e| FlowdeclError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to<FS: FileSystem>(&self, fs: &FS, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs.create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs.write_file(path, &contents)
            .map_err(|e| FlowdeclError::FileWrite {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(())
    }

    /// Load config from a path, returning the default if it is missing or invalid.
    pub fn load_from_or_default<FS: FileSystem>(fs: &FS, path: &Path) -> Self {
        match Self::load_from(fs, path) {
            Ok(config) => config,
            Err(e) => {
                if fs.exists(path) {
                    log::warn!("Ignoring config at {}: {}", path.display(), e);
                }
                Self::default()
            }
        }
    }
}

/// Attributes the source tooling gives new properties.
fn builtin_defaults(scope: Scope, key: &str) -> Attributes {
    match scope {
        Scope::Element => [
            ("Editor", "inline"),
            ("LocalizedTagName", key),
            ("UserDefined", "true"),
            ("Type", "string"),
        ]
        .into_iter()
        .collect(),
        Scope::Connection => [
            ("Default", ""),
            ("DetailedInfo", ""),
            ("Editor", "inline"),
            ("LocalizedTagName", key),
            ("Subtype", "inline"),
            ("Tooltip", ""),
            ("Type", "string"),
            ("UserDefined", "true"),
            ("Validation", "Standard"),
        ]
        .into_iter()
        .collect(),
    }
}

// ============================================================================
// Native-only implementation (not available in WASM)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl Config {
    /// Get the config file path (~/.config/flowdecl/config.toml)
    /// Only available on native platforms
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("flowdecl").join("config.toml"))
    }

    /// Load config from default location, or return default if file doesn't exist
    /// Only available on native platforms
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let contents = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&contents)?;
            return Ok(config);
        }

        // Return default config if file doesn't exist
        Ok(Config::default())
    }

    /// Save config to default location
    /// Only available on native platforms
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(FlowdeclError::NoConfigDir)?;

        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        Ok(())
    }
}
