//! Declaration document model and store.
//!
//! This module provides the in-memory form of a declaration file and the
//! primitives to move it to and from text:
//! - [`Document`] - root element with the two scoped property containers
//! - [`load`] / [`serialize`] - whole-document text conversion
//! - [`DocumentStore`] - binds a filesystem and a path for read/write
//!
//! # Module Structure
//!
//! - `types` - Core data types (Scope, Attributes, PropertyNode)

mod types;

pub use types::{Attributes, PropertyNode, Scope, WellKnown};

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::{FlowdeclError, Result};
use crate::fs::FileSystem;
use crate::markup::{self, Element};

/// Properties of one scope, keyed by tag name, in document order.
pub type Fields = IndexMap<String, PropertyNode>;

/// Default root tag for new documents.
pub const DEFAULT_ROOT: &str = "Object";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Container {
    attributes: IndexMap<String, String>,
    fields: Fields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RootItem {
    Scoped(Scope, Container),
    Other(Element),
}

/// In-memory declaration document.
///
/// Holds the root element, the two scoped containers and every other root
/// child in original order so that a load/serialize cycle keeps them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root_name: String,
    root_attributes: IndexMap<String, String>,
    items: Vec<RootItem>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl Document {
    /// Create an empty document with the given root tag.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            root_attributes: IndexMap::new(),
            items: Vec::new(),
        }
    }

    /// Root tag name.
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// Name shown for the document as a whole.
    ///
    /// Uses `ElementFields/Name`, then a root-level `Name`, then `"Root"`.
    pub fn display_name(&self) -> String {
        let from_fields = self
            .node(Scope::Element, "Name")
            .and_then(|n| n.text.as_deref());
        let from_root = self.items.iter().find_map(|item| match item {
            RootItem::Other(el) if el.name == "Name" => el.text.as_deref(),
            _ => None,
        });
        from_fields
            .or(from_root)
            .filter(|s| !s.is_empty())
            .unwrap_or("Root")
            .to_string()
    }

    /// The scoped container, if the document has one.
    pub fn fields(&self, scope: Scope) -> Option<&Fields> {
        self.items.iter().find_map(|item| match item {
            RootItem::Scoped(s, container) if *s == scope => Some(&container.fields),
            _ => None,
        })
    }

    /// The scoped container, created at the end of the root if missing.
    pub fn fields_mut(&mut self, scope: Scope) -> &mut Fields {
        let pos = self
            .items
            .iter()
            .position(|item| matches!(item, RootItem::Scoped(s, _) if *s == scope));
        let pos = match pos {
            Some(pos) => pos,
            None => {
                self.items
                    .push(RootItem::Scoped(scope, Container::default()));
                self.items.len() - 1
            }
        };
        match &mut self.items[pos] {
            RootItem::Scoped(_, container) => &mut container.fields,
            RootItem::Other(_) => unreachable!("position matched a scoped item"),
        }
    }

    /// A single node of a scope.
    pub fn node(&self, scope: Scope, key: &str) -> Option<&PropertyNode> {
        self.fields(scope).and_then(|f| f.get(key))
    }

    /// Returns true if `key` exists in the scope's container (property or
    /// structural field).
    pub fn contains(&self, scope: Scope, key: &str) -> bool {
        self.node(scope, key).is_some()
    }

    fn from_root(root: Element) -> Result<Self> {
        let mut doc = Document {
            root_name: root.name,
            root_attributes: root.attributes,
            items: Vec::new(),
        };

        for child in root.children {
            let scope = Scope::from_container_tag(&child.name)
                .filter(|s| doc.fields(*s).is_none());
            let Some(scope) = scope else {
                doc.items.push(RootItem::Other(child));
                continue;
            };

            let mut container = Container {
                attributes: child.attributes,
                fields: Fields::new(),
            };
            for property in child.children {
                let (key, node) = PropertyNode::from_element(property);
                if container.fields.contains_key(&key) {
                    return Err(FlowdeclError::Parse {
                        position: 0,
                        message: format!("duplicate key '{key}' in {}", scope.container_tag()),
                    });
                }
                container.fields.insert(key, node);
            }
            doc.items.push(RootItem::Scoped(scope, container));
        }

        Ok(doc)
    }

    fn to_root(&self) -> Element {
        let mut root = Element::new(self.root_name.clone());
        root.attributes = self.root_attributes.clone();
        for item in &self.items {
            match item {
                RootItem::Scoped(scope, container) => {
                    let mut el = Element::new(scope.container_tag());
                    el.attributes = container.attributes.clone();
                    el.children = container
                        .fields
                        .iter()
                        .map(|(key, node)| node.to_element(key))
                        .collect();
                    root.children.push(el);
                }
                RootItem::Other(el) => root.children.push(el.clone()),
            }
        }
        root
    }
}

/// Parse declaration text into a document.
///
/// Fails with a parse error on malformed markup or a key repeated inside one
/// scoped container.
pub fn load(text: &str) -> Result<Document> {
    let root = markup::parse(text)?;
    Document::from_root(root)
}

/// Serialize a document to declaration text.
pub fn serialize(doc: &Document, indent: usize) -> Result<String> {
    markup::serialize(&doc.to_root(), indent)
}

/// Find the declaration file of a workspace directory.
///
/// A workspace `dir` keeps its declaration at `dir/<name of dir>.xml`.
pub fn locate_document<FS: FileSystem>(fs: &FS, dir: &Path) -> Result<PathBuf> {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| FlowdeclError::DocumentNotFound(dir.to_path_buf()))?;
    let path = dir.join(format!("{name}.xml"));
    if !fs.exists(&path) {
        return Err(FlowdeclError::DocumentNotFound(path));
    }
    Ok(path)
}

/// Reads and writes one declaration file as a whole.
#[derive(Debug, Clone)]
pub struct DocumentStore<FS: FileSystem> {
    fs: FS,
    path: PathBuf,
}

impl<FS: FileSystem> DocumentStore<FS> {
    /// Create a store for the file at `path`.
    pub fn new(fs: FS, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a reference to the underlying filesystem
    pub fn fs_ref(&self) -> &FS {
        &self.fs
    }

    /// Read and parse the backing file.
    pub fn read(&self) -> Result<Document> {
        let text = self
            .fs
            .read_to_string(&self.path)
            .map_err(|e| FlowdeclError::FileRead {
                path: self.path.clone(),
                source: e,
            })?;
        load(&text)
    }

    /// Serialize the document and overwrite the backing file.
    pub fn write(&self, doc: &Document, indent: usize) -> Result<()> {
        let text = serialize(doc, indent)?;
        self.fs
            .write_file(&self.path, &text)
            .map_err(|e| FlowdeclError::FileWrite {
                path: self.path.clone(),
                source: e,
            })?;
        log::debug!("Wrote {} bytes to {}", text.len(), self.path.display());
        Ok(())
    }
}
