//! Core library for editing flow element declaration files.
//!
//! A declaration is an XML document with two property containers,
//! `ElementFields` and `ConnectionFields`. Each property is one child element
//! whose attributes describe it; a `Dependency` attribute names the property
//! it hangs under. This crate loads such a file, presents each container as an
//! ordered catalog plus a derived dependency forest, and applies structural
//! and field edits that keep catalog, document and file consistent.
//!
//! The entry point is [`Session`]:
//!
//! ```ignore
//! use flowdecl_core::{Config, Direction, RealFileSystem, Scope, Session};
//!
//! let mut session = Session::open(RealFileSystem, "Mover/Mover.xml", Config::default())?;
//! session.add(Scope::Element, "Retries", None)?;
//! session.reorder(Scope::Element, "Retries", Direction::Previous)?;
//! println!("{}", session.outline()?.format());
//! session.save()?;
//! ```
#![warn(missing_docs)]

/// Configuration options
pub mod config;

/// Error (common error types)
pub mod error;

/// Filesystem abstraction
pub mod fs;

/// XML element tree (parse and serialize)
pub mod markup;

/// Declaration document model and store
pub mod document;

/// Property catalog (ordered properties per scope)
pub mod catalog;

/// Dependency tree (forest derived from Dependency references)
pub mod tree;

/// Property editor projection
pub mod editor;

/// Session events and subscriptions
pub mod events;

/// Editing session
pub mod session;

/// Structural and field edits
pub mod mutation;

/// Command pattern API
pub mod command;

mod command_handler;

#[cfg(test)]
pub mod test_utils;

pub use catalog::{Catalog, Property, STRUCTURAL_FIELDS};
pub use command::{Command, Response};
pub use config::Config;
pub use document::{Attributes, Document, DocumentStore, PropertyNode, Scope, WellKnown};
pub use editor::{FieldRow, PropertyView};
pub use error::{FlowdeclError, Result, SerializableError};
pub use events::{EventCallback, EventRegistry, SessionEvent, SubscriptionId};
pub use fs::{FileSystem, InMemoryFileSystem};
#[cfg(not(target_arch = "wasm32"))]
pub use fs::RealFileSystem;
pub use mutation::Direction;
pub use session::{DocumentSummary, Selection, Session};
pub use tree::{DocumentOutline, TreeNode, format_tree};
