//! Command pattern API for presentation layers.
//!
//! Every operation a presentation layer can trigger is a [`Command`]; results
//! come back as a [`Response`]. Both are serializable so that a webview or an
//! IPC peer can drive a session with JSON.
//!
//! # Usage
//!
//! ```ignore
//! use flowdecl_core::{Command, Response};
//!
//! let response = session.execute(Command::GetOutline)?;
//! if let Response::Outline(outline) = response {
//!     println!("{}", outline.format());
//! }
//! ```

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::Property;
use crate::document::Scope;
use crate::editor::PropertyView;
use crate::session::Selection;
use crate::tree::DocumentOutline;

// ============================================================================
// Command Types
// ============================================================================

/// All commands that can be executed against a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum Command {
    // === Selection ===
    /// Select a property, or the document root when `key` is absent or unknown.
    Select {
        /// Key to select.
        #[serde(default)]
        key: Option<String>,
    },

    // === Structural edits ===
    /// Add a property with the scope's default attributes.
    Add {
        /// Target scope.
        scope: Scope,
        /// Key of the new property.
        name: String,
        /// Attributes replacing the defaults.
        #[serde(default)]
        attributes: Option<IndexMap<String, String>>,
    },

    /// Remove a property. Dependents are kept.
    Remove {
        /// Key to remove.
        key: String,
        /// Scope override; otherwise element scope is tried first.
        #[serde(default)]
        scope: Option<Scope>,
    },

    /// Copy a property under a new key.
    Duplicate {
        /// Source key.
        old_key: String,
        /// Key of the copy.
        new_key: String,
        /// Scope override; otherwise element scope is tried first.
        #[serde(default)]
        scope: Option<Scope>,
    },

    /// Move a top-level property before its previous sibling.
    MoveUp {
        /// Key to move.
        key: String,
        /// Scope override.
        #[serde(default)]
        scope: Option<Scope>,
    },

    /// Move a top-level property after its next sibling.
    MoveDown {
        /// Key to move.
        key: String,
        /// Scope override.
        #[serde(default)]
        scope: Option<Scope>,
    },

    // === Persistence ===
    /// Write the document to its backing file.
    Save,

    /// Reload from the backing file, discarding unsaved edits.
    Reload,

    // === Editing ===
    /// Edit one field of the selected property.
    PropertyFieldChanged {
        /// Key of the selected property.
        key: String,
        /// Field id.
        field: String,
        /// New value.
        value: String,
    },

    // === Queries ===
    /// Editor view of a property.
    GetProperty {
        /// Key to view.
        key: String,
        /// Scope override.
        #[serde(default)]
        scope: Option<Scope>,
    },

    /// Document name and both dependency forests.
    GetOutline,

    /// Properties with a dangling dependency.
    GetOrphans {
        /// Limit to one scope.
        #[serde(default)]
        scope: Option<Scope>,
    },
}

impl Command {
    /// Returns true if the command can change the document.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::Add { .. }
                | Command::Remove { .. }
                | Command::Duplicate { .. }
                | Command::MoveUp { .. }
                | Command::MoveDown { .. }
                | Command::PropertyFieldChanged { .. }
        )
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Response from a command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Response {
    /// Command completed successfully with no data.
    Ok,

    /// Boolean response (e.g. whether a move happened).
    Bool(bool),

    /// Keys affected by the command.
    Keys(Vec<String>),

    /// Selection response.
    Selection(Selection),

    /// Editor view response.
    Property(PropertyView),

    /// Outline response.
    Outline(DocumentOutline),

    /// Orphaned properties.
    Orphans(Vec<Property>),

    /// Path written by a save.
    Saved(PathBuf),
}
