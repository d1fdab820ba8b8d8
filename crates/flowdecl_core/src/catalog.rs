//! Property catalog.
//!
//! The catalog is the ordered, editable projection of a document's two scoped
//! containers. It is rebuilt wholesale from a [`Document`] and is the
//! authority for which properties exist and in which order; the document is
//! kept in step with it by the mutation engine.
//!
//! Each scope caches a parent → children index the first time a hierarchy
//! query needs it. Any change to the scope drops the cache.

use std::cell::OnceCell;
use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::{Attributes, Document, PropertyNode, Scope};
use crate::error::{FlowdeclError, Result};
use crate::tree::{self, DependencyIndex, TreeNode};

/// Element-scope keys that configure the document as a whole and are never
/// listed as properties.
pub const STRUCTURAL_FIELDS: &[&str] = &[
    "Name",
    "DisplayName",
    "Version",
    "Keywords",
    "Tooltip",
    "IncomingConnections",
    "OutgoingConnections",
    "ConnectionType",
    "FunctionsNodeJSScript",
    "ExecutionMode",
    "NumberOfSlots",
    "ExecutionGroup",
    "PerformanceTuning",
    "IdleAfterJob",
    "PositionInElementPane",
    "SubcategoryInElementPane",
    "DispositionInElementPane",
    "Description",
    "Compatibility",
    "SupportInfo",
    "AppDiscovery",
    "FlowUpgradeWarning",
    "UpgradeMaximumVersion",
    "Connections",
    "SwitchModule",
    "ObsoleteProperties",
    "ObsoleteConnectionProperties",
];

/// A catalog entry: one property of one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Key, unique within the scope.
    pub key: String,
    /// Scope the property belongs to.
    pub scope: Scope,
    /// Attributes and body.
    pub node: PropertyNode,
}

impl Property {
    /// Create a property.
    pub fn new(scope: Scope, key: impl Into<String>, node: PropertyNode) -> Self {
        Self {
            key: key.into(),
            scope,
            node,
        }
    }

    /// Attribute map.
    pub fn attributes(&self) -> &Attributes {
        &self.node.attributes
    }

    /// Key of the parent property, if any.
    pub fn dependency(&self) -> Option<&str> {
        self.node.attributes.dependency()
    }

    /// Returns true if the property has no dependency reference.
    pub fn is_top_level(&self) -> bool {
        self.dependency().is_none()
    }

    /// Display label: the localized tag name, falling back to the key.
    pub fn label(&self) -> &str {
        self.node.attributes.tag_name().unwrap_or(&self.key)
    }
}

/// Properties of one scope plus the lazily built dependency index.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScopeCatalog {
    properties: IndexMap<String, Property>,
    index: OnceCell<DependencyIndex>,
}

impl ScopeCatalog {
    pub(crate) fn properties(&self) -> &IndexMap<String, Property> {
        &self.properties
    }

    pub(crate) fn index(&self) -> &DependencyIndex {
        self.index
            .get_or_init(|| DependencyIndex::build(&self.properties))
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    pub(crate) fn position(&self, key: &str) -> Option<usize> {
        self.properties.get_index_of(key)
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub(crate) fn push(&mut self, property: Property) {
        self.index.take();
        self.properties.insert(property.key.clone(), property);
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<Property> {
        self.index.take();
        self.properties.shift_remove(key)
    }

    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        self.index.take();
        self.properties.swap_indices(a, b);
    }

    pub(crate) fn attributes_mut(&mut self, key: &str) -> Option<&mut Attributes> {
        self.index.take();
        self.properties.get_mut(key).map(|p| &mut p.node.attributes)
    }
}

/// The two scoped property lists of one document.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    element: ScopeCatalog,
    connection: ScopeCatalog,
    structural: HashSet<String>,
}

impl Catalog {
    /// Build the catalog from a document.
    ///
    /// Every entry of each scoped container becomes a property in document
    /// order, except element-scope structural fields (the built-in set plus
    /// `extra_structural`).
    pub fn build(doc: &Document, extra_structural: &[String]) -> Self {
        let structural: HashSet<String> = STRUCTURAL_FIELDS
            .iter()
            .map(|s| s.to_string())
            .chain(extra_structural.iter().cloned())
            .collect();

        let mut catalog = Catalog {
            element: ScopeCatalog::default(),
            connection: ScopeCatalog::default(),
            structural,
        };

        for scope in Scope::ALL {
            let Some(fields) = doc.fields(scope) else {
                continue;
            };
            for (key, node) in fields {
                if scope == Scope::Element && catalog.structural.contains(key) {
                    continue;
                }
                catalog
                    .scope_mut(scope)
                    .push(Property::new(scope, key.clone(), node.clone()));
            }
        }

        log::debug!(
            "Built catalog: {} element, {} connection properties",
            catalog.element.properties.len(),
            catalog.connection.properties.len()
        );
        catalog
    }

    pub(crate) fn scope(&self, scope: Scope) -> &ScopeCatalog {
        match scope {
            Scope::Element => &self.element,
            Scope::Connection => &self.connection,
        }
    }

    pub(crate) fn scope_mut(&mut self, scope: Scope) -> &mut ScopeCatalog {
        match scope {
            Scope::Element => &mut self.element,
            Scope::Connection => &mut self.connection,
        }
    }

    pub(crate) fn replace_scope(&mut self, scope: Scope, staged: ScopeCatalog) {
        *self.scope_mut(scope) = staged;
    }

    /// Returns true if `key` names a structural field of `scope` rather than a
    /// property.
    pub fn is_structural(&self, scope: Scope, key: &str) -> bool {
        scope == Scope::Element && self.structural.contains(key)
    }

    /// All properties of a scope, in catalog order.
    pub fn list(&self, scope: Scope) -> impl Iterator<Item = &Property> {
        self.scope(scope).properties.values()
    }

    /// Number of properties in a scope.
    pub fn len(&self, scope: Scope) -> usize {
        self.scope(scope).properties.len()
    }

    /// Returns true if neither scope has any property.
    pub fn is_empty(&self) -> bool {
        self.element.properties.is_empty() && self.connection.properties.is_empty()
    }

    /// Look up a property.
    pub fn get(&self, scope: Scope, key: &str) -> Result<&Property> {
        self.scope(scope)
            .get(key)
            .ok_or_else(|| FlowdeclError::not_found(scope, key))
    }

    /// Returns true if the scope has a property named `key`.
    pub fn contains(&self, scope: Scope, key: &str) -> bool {
        self.scope(scope).contains(key)
    }

    /// Scope holding `key`, checking the element scope first.
    pub fn resolve(&self, key: &str) -> Option<Scope> {
        Scope::ALL.into_iter().find(|s| self.contains(*s, key))
    }

    /// Properties with no dependency reference, in catalog order.
    pub fn top_level(&self, scope: Scope) -> Vec<&Property> {
        self.list(scope).filter(|p| p.is_top_level()).collect()
    }

    /// Properties whose dependency is `key`, in catalog order.
    pub fn children_of(&self, scope: Scope, key: &str) -> Result<Vec<&Property>> {
        let sc = self.scope(scope);
        if !sc.contains(key) {
            return Err(FlowdeclError::not_found(scope, key));
        }
        Ok(sc
            .index()
            .children(key)
            .iter()
            .map(|&i| &sc.properties[i])
            .collect())
    }

    /// Returns true if any property of the scope depends on `key`.
    pub fn has_children(&self, scope: Scope, key: &str) -> bool {
        !self.scope(scope).index().children(key).is_empty()
    }

    /// Properties whose dependency names a key that does not exist.
    pub fn orphans(&self, scope: Scope) -> Vec<&Property> {
        let sc = self.scope(scope);
        sc.index()
            .orphans()
            .iter()
            .map(|&i| &sc.properties[i])
            .collect()
    }

    /// The dependency forest of a scope.
    ///
    /// Fails with a cycle error if some property can reach itself through
    /// dependency references.
    pub fn tree(&self, scope: Scope) -> Result<Vec<TreeNode>> {
        let sc = self.scope(scope);
        tree::build_forest(scope, &sc.properties, sc.index())
    }

    /// Check that both scopes form acyclic hierarchies.
    pub fn validate(&self) -> Result<()> {
        for scope in Scope::ALL {
            self.tree(scope)?;
        }
        Ok(())
    }
}
