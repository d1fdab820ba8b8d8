//! Editing session.
//!
//! A [`Session`] owns everything needed to edit one declaration file: the
//! backing store, the parsed document, the catalog derived from it, the
//! configuration, the current selection and the event subscribers. All edits
//! go through it, one at a time.
//!
//! # Example
//!
//! ```ignore
//! use flowdecl_core::{Config, RealFileSystem, Scope, Session};
//!
//! let mut session = Session::open(RealFileSystem, "Mover/Mover.xml", Config::default())?;
//! session.add(Scope::Element, "Retries", None)?;
//! session.save()?;
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Property};
use crate::config::Config;
use crate::document::{self, Document, DocumentStore, Scope};
use crate::editor::PropertyView;
use crate::error::{FlowdeclError, Result};
use crate::events::{EventCallback, EventRegistry, SessionEvent, SubscriptionId};
use crate::fs::FileSystem;
use crate::tree::DocumentOutline;

/// Summary of the document as a whole, shown when nothing is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Display name.
    pub name: String,
    /// Backing file.
    pub path: PathBuf,
    /// Number of element-scope properties.
    pub element_count: usize,
    /// Number of connection-scope properties.
    pub connection_count: usize,
}

/// Result of a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum Selection {
    /// The document root.
    Root(DocumentSummary),
    /// A single property.
    Property(Property),
}

/// One open declaration document.
pub struct Session<FS: FileSystem> {
    pub(crate) store: DocumentStore<FS>,
    pub(crate) document: Document,
    pub(crate) catalog: Catalog,
    pub(crate) config: Config,
    pub(crate) selection: Option<(Scope, String)>,
    pub(crate) generation: u64,
    pub(crate) dirty: bool,
    pub(crate) events: EventRegistry,
}

impl<FS: FileSystem> Session<FS> {
    /// Open the declaration file at `path`.
    ///
    /// Fails if the file cannot be read or parsed, or if either scope's
    /// dependencies form a cycle.
    pub fn open(fs: FS, path: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let store = DocumentStore::new(fs, path);
        let document = store.read()?;
        Self::with_document(store, document, config)
    }

    /// Open the declaration file of a workspace directory.
    pub fn open_workspace(fs: FS, dir: &Path, config: Config) -> Result<Self> {
        let path = document::locate_document(&fs, dir)?;
        Self::open(fs, path, config)
    }

    /// Start a session from declaration text; `path` is where `save` writes.
    pub fn from_text(fs: FS, path: impl Into<PathBuf>, text: &str, config: Config) -> Result<Self> {
        let document = document::load(text)?;
        Self::with_document(DocumentStore::new(fs, path), document, config)
    }

    fn with_document(store: DocumentStore<FS>, document: Document, config: Config) -> Result<Self> {
        let catalog = build_catalog(&document, &config)?;
        log::info!(
            "Opened {} ({} element, {} connection properties)",
            store.path().display(),
            catalog.len(Scope::Element),
            catalog.len(Scope::Connection)
        );
        Ok(Self {
            store,
            document,
            catalog,
            config,
            selection: None,
            generation: 0,
            dirty: false,
            events: EventRegistry::new(),
        })
    }

    /// Rebuild everything from a fresh read of the backing file.
    ///
    /// Unsaved edits are discarded. On failure the session keeps its current
    /// state. On success views taken earlier become stale and the selection
    /// returns to the document root.
    pub fn reload(&mut self) -> Result<()> {
        let document = self.store.read()?;
        let catalog = build_catalog(&document, &self.config)?;

        if self.dirty {
            log::warn!(
                "Reloading {} discards unsaved edits",
                self.store.path().display()
            );
        }

        self.document = document;
        self.catalog = catalog;
        self.selection = None;
        self.dirty = false;
        self.generation += 1;

        self.events.emit(&SessionEvent::CatalogRebuilt {
            name: self.document.display_name(),
            generation: self.generation,
        });
        Ok(())
    }

    /// Serialize the document and write it to the backing file.
    pub fn save(&mut self) -> Result<()> {
        self.store.write(&self.document, self.config.indent)?;
        self.dirty = false;
        log::info!("Saved {}", self.store.path().display());
        self.events.emit(&SessionEvent::Saved {
            path: self.store.path().to_path_buf(),
        });
        Ok(())
    }

    /// Serialize the document without writing it.
    pub fn to_text(&self) -> Result<String> {
        document::serialize(&self.document, self.config.indent)
    }

    /// Returns true if there are edits not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// End the session. Subscribers receive `Closed` and are dropped.
    pub fn close(self) {
        if self.dirty {
            log::warn!(
                "Closing {} with unsaved edits",
                self.store.path().display()
            );
        }
        self.events.emit(&SessionEvent::Closed);
        self.events.clear();
    }

    /// Select a property by key, or the document root.
    ///
    /// The element scope is searched first. A key that matches nothing
    /// selects the root.
    pub fn select(&mut self, key: Option<&str>) -> Selection {
        let found = key.and_then(|k| self.resolve(k).map(|scope| (scope, k.to_string())));
        match found {
            Some((scope, key)) => {
                self.events
                    .emit(&SessionEvent::property_selected(scope, key.as_str()));
                self.selection = Some((scope, key));
            }
            None => {
                if let Some(key) = key {
                    log::debug!("No property '{}', selecting document root", key);
                }
                self.selection = None;
                self.events.emit(&SessionEvent::root_selected());
            }
        }
        self.selection()
    }

    /// The current selection.
    pub fn selection(&self) -> Selection {
        self.selection
            .as_ref()
            .and_then(|(scope, key)| self.catalog.get(*scope, key).ok())
            .map(|p| Selection::Property(p.clone()))
            .unwrap_or_else(|| Selection::Root(self.summary()))
    }

    /// Scope and key of the selected property.
    pub fn selected(&self) -> Option<(Scope, &str)> {
        self.selection
            .as_ref()
            .map(|(scope, key)| (*scope, key.as_str()))
    }

    /// Scope holding `key`, element scope first.
    pub fn resolve(&self, key: &str) -> Option<Scope> {
        self.catalog.resolve(key)
    }

    /// Scope for a key-only operation: `scope` if given, else [`Self::resolve`].
    pub fn resolve_scope(&self, key: &str, scope: Option<Scope>) -> Result<Scope> {
        match scope {
            Some(scope) if self.catalog.contains(scope, key) => Ok(scope),
            Some(scope) => Err(FlowdeclError::not_found(scope, key)),
            None => self.resolve(key).ok_or_else(|| FlowdeclError::NotFound {
                scope: None,
                key: key.to_string(),
            }),
        }
    }

    /// Look up a property.
    pub fn property(&self, scope: Scope, key: &str) -> Result<&Property> {
        self.catalog.get(scope, key)
    }

    /// Editor view of a property at the current generation.
    pub fn view(&self, scope: Scope, key: &str) -> Result<PropertyView> {
        let property = self.catalog.get(scope, key)?;
        Ok(PropertyView::new(property, self.generation))
    }

    /// Document name plus both scopes' dependency forests.
    pub fn outline(&self) -> Result<DocumentOutline> {
        Ok(DocumentOutline {
            name: self.document.display_name(),
            element: self.catalog.tree(Scope::Element)?,
            connection: self.catalog.tree(Scope::Connection)?,
        })
    }

    /// Summary of the document as a whole.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            name: self.document.display_name(),
            path: self.store.path().to_path_buf(),
            element_count: self.catalog.len(Scope::Element),
            connection_count: self.catalog.len(Scope::Connection),
        }
    }

    /// Subscribe to session events.
    pub fn subscribe(&self, callback: EventCallback) -> SubscriptionId {
        self.events.subscribe(callback)
    }

    /// Remove a subscription. Returns `true` if it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// The parsed document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The property catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The session configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Incremented on every reload.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<FS: FileSystem> std::fmt::Debug for Session<FS> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("path", &self.store.path())
            .field("generation", &self.generation)
            .field("dirty", &self.dirty)
            .field("selection", &self.selection)
            .finish()
    }
}

fn build_catalog(document: &Document, config: &Config) -> Result<Catalog> {
    let catalog = Catalog::build(document, &config.extra_structural_fields);
    catalog.validate()?;
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;
    use crate::test_utils::{SAMPLE_PATH, SAMPLE_XML, element_xml, sample_session};
    use std::sync::{Arc, Mutex};

    fn recorder<FS: FileSystem>(session: &Session<FS>) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        session.subscribe(Arc::new(move |event| {
            seen_clone.lock().unwrap().push(event.event_type().to_string());
        }));
        seen
    }

    #[test]
    fn test_open_sample() {
        let session = sample_session();
        let summary = session.summary();
        assert_eq!(summary.name, "Archive mover");
        assert_eq!(summary.element_count, 3);
        assert_eq!(summary.connection_count, 2);
        assert!(!session.is_dirty());
        assert_eq!(session.generation(), 0);
    }

    #[test]
    fn test_open_rejects_cycle() {
        let fs = InMemoryFileSystem::new().with_file(SAMPLE_PATH, &element_xml(&[("X", Some("X"))]));
        let err = Session::open(fs, SAMPLE_PATH, Config::default()).unwrap_err();
        assert!(matches!(err, FlowdeclError::Cycle { .. }));
    }

    #[test]
    fn test_open_rejects_malformed() {
        let fs = InMemoryFileSystem::new().with_file(SAMPLE_PATH, "<Object><ElementFields></Object>");
        let err = Session::open(fs, SAMPLE_PATH, Config::default()).unwrap_err();
        assert!(matches!(err, FlowdeclError::Parse { .. } | FlowdeclError::Xml(_)));
    }

    #[test]
    fn test_open_workspace() {
        let fs = InMemoryFileSystem::new().with_file("ws/Mover/Mover.xml", SAMPLE_XML);
        let session = Session::open_workspace(fs, Path::new("ws/Mover"), Config::default()).unwrap();
        assert_eq!(session.path(), Path::new("ws/Mover/Mover.xml"));
    }

    #[test]
    fn test_select_property_then_root() {
        let mut session = sample_session();
        let events = recorder(&session);

        match session.select(Some("Label")) {
            Selection::Property(p) => {
                assert_eq!(p.scope, Scope::Connection);
                assert_eq!(p.key, "Label");
            }
            other => panic!("expected property, got {:?}", other),
        }
        assert_eq!(session.selected(), Some((Scope::Connection, "Label")));

        assert!(matches!(session.select(Some("Nope")), Selection::Root(_)));
        assert!(matches!(session.select(None), Selection::Root(_)));
        assert_eq!(session.selected(), None);
        assert_eq!(events.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_structural_key_selects_root() {
        let mut session = sample_session();
        assert!(matches!(session.select(Some("Version")), Selection::Root(_)));
    }

    #[test]
    fn test_resolve_scope() {
        let session = sample_session();
        assert_eq!(session.resolve_scope("Mode", None).unwrap(), Scope::Element);
        assert_eq!(session.resolve_scope("Priority", None).unwrap(), Scope::Connection);
        assert!(session.resolve_scope("Mode", Some(Scope::Connection)).is_err());
        assert!(matches!(
            session.resolve_scope("Nope", None),
            Err(FlowdeclError::NotFound { scope: None, .. })
        ));
    }

    #[test]
    fn test_reload_supersedes_edits() {
        let fs = InMemoryFileSystem::new().with_file(SAMPLE_PATH, SAMPLE_XML);
        let mut session = Session::open(fs.clone(), SAMPLE_PATH, Config::default()).unwrap();
        let events = recorder(&session);
        session.select(Some("Mode"));
        session.add(Scope::Element, "Unsaved", None).unwrap();
        assert!(session.is_dirty());

        session.reload().unwrap();
        assert!(!session.catalog().contains(Scope::Element, "Unsaved"));
        assert!(!session.is_dirty());
        assert_eq!(session.generation(), 1);
        assert_eq!(session.selected(), None);
        assert_eq!(events.lock().unwrap().last().map(String::as_str), Some("CatalogRebuilt"));
    }

    #[test]
    fn test_failed_reload_keeps_state() {
        let fs = InMemoryFileSystem::new().with_file(SAMPLE_PATH, SAMPLE_XML);
        let mut session = Session::open(fs.clone(), SAMPLE_PATH, Config::default()).unwrap();
        session.add(Scope::Element, "Kept", None).unwrap();

        fs.write_file(Path::new(SAMPLE_PATH), "<Object><Broken></Object>").unwrap();
        assert!(session.reload().is_err());

        fs.write_file(Path::new(SAMPLE_PATH), &element_xml(&[("X", Some("X"))])).unwrap();
        assert!(matches!(session.reload(), Err(FlowdeclError::Cycle { .. })));

        assert!(session.catalog().contains(Scope::Element, "Kept"));
        assert!(session.is_dirty());
        assert_eq!(session.generation(), 0);
    }

    #[test]
    fn test_save_writes_and_clears_dirty() {
        let fs = InMemoryFileSystem::new().with_file(SAMPLE_PATH, SAMPLE_XML);
        let mut session = Session::open(fs.clone(), SAMPLE_PATH, Config::default()).unwrap();
        let events = recorder(&session);
        session.remove(Scope::Element, "Mode").unwrap();
        session.save().unwrap();
        assert!(!session.is_dirty());

        let written = fs.get_content(SAMPLE_PATH).unwrap();
        assert!(!written.contains("<Mode"));
        assert!(written.contains("<Connections>"));
        assert_eq!(events.lock().unwrap().last().map(String::as_str), Some("Saved"));
    }

    #[test]
    fn test_failed_save_keeps_dirty() {
        let fs = InMemoryFileSystem::new().with_file(SAMPLE_PATH, SAMPLE_XML);
        let mut session = Session::open(fs.clone(), SAMPLE_PATH, Config::default()).unwrap();
        session.add(Scope::Connection, "Extra", None).unwrap();
        fs.set_read_only(true);

        assert!(matches!(session.save(), Err(FlowdeclError::FileWrite { .. })));
        assert!(session.is_dirty());
        assert!(session.catalog().contains(Scope::Connection, "Extra"));
    }

    #[test]
    fn test_from_text_and_to_text() {
        let session = Session::from_text(
            InMemoryFileSystem::new(),
            "new.xml",
            SAMPLE_XML,
            Config::default(),
        )
        .unwrap();
        let text = session.to_text().unwrap();
        assert!(text.starts_with("<?xml"));
        assert_eq!(document::load(&text).unwrap(), *session.document());
    }

    #[test]
    fn test_outline() {
        let session = sample_session();
        let outline = session.outline().unwrap();
        assert_eq!(outline.name, "Archive mover");
        assert_eq!(outline.element.len(), 2);
        assert_eq!(outline.connection[0].children[0].key, "Label");
    }

    #[test]
    fn test_close_notifies_and_clears() {
        let session = sample_session();
        let events = recorder(&session);
        session.close();
        assert_eq!(*events.lock().unwrap(), vec!["Closed".to_string()]);
    }

    #[test]
    fn test_open_deep_chain_and_extend_it() {
        let keys: Vec<String> = (0..10_000).map(|i| format!("P{i}")).collect();
        let props: Vec<(&str, Option<&str>)> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.as_str(), i.checked_sub(1).map(|p| keys[p].as_str())))
            .collect();
        let mut session = crate::test_utils::session_from(&element_xml(&props));

        let attributes: crate::document::Attributes = [("Dependency", "P9999")].into_iter().collect();
        session.add(Scope::Element, "Tail", Some(attributes)).unwrap();

        let outline = session.outline().unwrap();
        assert_eq!(outline.element.len(), 1);
        assert_eq!(outline.element[0].count(), 10_001);
        assert!(outline.element[0].find("Tail").is_some());
    }
}
