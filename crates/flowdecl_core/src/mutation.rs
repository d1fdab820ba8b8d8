//! Structural and field edits.
//!
//! Every edit is staged on a copy of the affected scope. The staged scope must
//! still form an acyclic forest before it replaces the live one, and only then
//! is the change mirrored into the document. A failed edit leaves both
//! untouched.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::{Property, ScopeCatalog};
use crate::document::{Attributes, Fields, PropertyNode, Scope};
use crate::editor::{self, PropertyView};
use crate::error::{FlowdeclError, Result};
use crate::events::SessionEvent;
use crate::fs::FileSystem;
use crate::markup;
use crate::session::Session;
use crate::tree;

/// Direction of a reorder among top-level siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards the start of the scope.
    Previous,
    /// Towards the end of the scope.
    Next,
}

impl<FS: FileSystem> Session<FS> {
    /// Append a new property to a scope.
    ///
    /// Uses the scope's default attributes unless `attributes` is given.
    /// Fails with `DuplicateKey` if the key is taken and with
    /// `InvalidOperation` if it is not a valid tag name, names a structural
    /// field, or any attribute name is not a valid XML name.
    pub fn add(&mut self, scope: Scope, key: &str, attributes: Option<Attributes>) -> Result<()> {
        self.check_new_key(scope, key)?;
        let attributes = attributes.unwrap_or_else(|| self.config.default_attributes(scope, key));
        if let Some((name, _)) = attributes.iter().find(|(name, _)| !markup::is_valid_name(name)) {
            return Err(FlowdeclError::InvalidOperation(format!(
                "'{}' is not a valid attribute name",
                name
            )));
        }
        let node = PropertyNode::with_attributes(attributes);

        let mut staged = self.catalog.scope(scope).clone();
        staged.push(Property::new(scope, key, node.clone()));
        self.commit(scope, staged, |fields| {
            fields.insert(key.to_string(), node);
        })?;

        log::info!("Added {} property '{}'", scope, key);
        self.events.emit(&SessionEvent::PropertyAdded {
            scope,
            key: key.to_string(),
        });
        Ok(())
    }

    /// Remove a property. Dependents are kept and become orphans.
    ///
    /// Returns the keys of the properties left with a dangling dependency.
    pub fn remove(&mut self, scope: Scope, key: &str) -> Result<Vec<String>> {
        let orphaned: Vec<String> = self
            .catalog
            .children_of(scope, key)?
            .into_iter()
            .map(|p| p.key.clone())
            .collect();

        let mut staged = self.catalog.scope(scope).clone();
        staged.remove(key);
        self.commit(scope, staged, |fields| {
            fields.shift_remove(key);
        })?;

        if orphaned.is_empty() {
            log::info!("Removed {} property '{}'", scope, key);
        } else {
            log::warn!(
                "Removed {} property '{}'; orphaned: {}",
                scope,
                key,
                orphaned.join(", ")
            );
        }
        if self.selected() == Some((scope, key)) {
            self.selection = None;
        }
        self.events.emit(&SessionEvent::PropertyRemoved {
            scope,
            key: key.to_string(),
            orphaned: orphaned.clone(),
        });
        Ok(orphaned)
    }

    /// Copy a property under a new key at the end of the scope.
    ///
    /// The copy keeps the source's dependency, so both share a parent.
    pub fn duplicate(&mut self, scope: Scope, from: &str, to: &str) -> Result<()> {
        let node = self.catalog.get(scope, from)?.node.clone();
        self.check_new_key(scope, to)?;

        let mut staged = self.catalog.scope(scope).clone();
        staged.push(Property::new(scope, to, node.clone()));
        self.commit(scope, staged, |fields| {
            fields.insert(to.to_string(), node);
        })?;

        log::info!("Duplicated {} property '{}' as '{}'", scope, from, to);
        self.events.emit(&SessionEvent::PropertyDuplicated {
            scope,
            from: from.to_string(),
            to: to.to_string(),
        });
        Ok(())
    }

    /// Swap a top-level property with its neighbouring top-level sibling.
    ///
    /// Returns `Ok(false)` without changing anything if the property has a
    /// dependency or has no neighbour in that direction. Dependents keep
    /// their positions.
    pub fn reorder(&mut self, scope: Scope, key: &str, direction: Direction) -> Result<bool> {
        let (pos, neighbor, neighbor_key) = {
            let property = self.catalog.get(scope, key)?;
            if !property.is_top_level() {
                log::debug!("Not moving '{}': it depends on another property", key);
                return Ok(false);
            }

            let sc = self.catalog.scope(scope);
            let top: Vec<usize> = sc
                .properties()
                .values()
                .enumerate()
                .filter(|(_, p)| p.is_top_level())
                .map(|(i, _)| i)
                .collect();
            let Some(pos) = sc.position(key) else {
                return Err(FlowdeclError::not_found(scope, key));
            };
            let Some(at) = top.iter().position(|&i| i == pos) else {
                return Ok(false);
            };
            let neighbor = match direction {
                Direction::Previous => at.checked_sub(1).map(|n| top[n]),
                Direction::Next => top.get(at + 1).copied(),
            };
            let Some(neighbor) = neighbor else {
                log::debug!("Not moving '{}': already at the boundary", key);
                return Ok(false);
            };
            (pos, neighbor, sc.properties()[neighbor].key.clone())
        };

        let mut staged = self.catalog.scope(scope).clone();
        staged.swap(pos, neighbor);
        self.commit(scope, staged, |fields| {
            if let (Some(a), Some(b)) = (fields.get_index_of(key), fields.get_index_of(&neighbor_key)) {
                fields.swap_indices(a, b);
            }
        })?;

        log::info!("Moved {} property '{}' past '{}'", scope, key, neighbor_key);
        self.events.emit(&SessionEvent::PropertyMoved {
            scope,
            key: key.to_string(),
            swapped_with: neighbor_key,
        });
        Ok(true)
    }

    /// Move a top-level property one place towards the start.
    pub fn move_up(&mut self, scope: Scope, key: &str) -> Result<bool> {
        self.reorder(scope, key, Direction::Previous)
    }

    /// Move a top-level property one place towards the end.
    pub fn move_down(&mut self, scope: Scope, key: &str) -> Result<bool> {
        self.reorder(scope, key, Direction::Next)
    }

    /// Write editor changes into the viewed property's attributes.
    ///
    /// The key row is ignored. Fails without applying anything if the view is
    /// stale, a field id is unknown, or the edit would create a dependency
    /// cycle. Returns the ids of the fields whose value changed.
    pub fn apply_field_changes(
        &mut self,
        view: &PropertyView,
        changes: &IndexMap<String, String>,
    ) -> Result<Vec<String>> {
        if view.generation != self.generation {
            return Err(FlowdeclError::InvalidOperation(format!(
                "view of '{}' is stale (document reloaded)",
                view.key
            )));
        }
        let scope = view.scope;
        let key = view.key.as_str();
        let edits = editor::check_changes(self.catalog.get(scope, key)?, changes)?;

        let mut staged = self.catalog.scope(scope).clone();
        let Some(attrs) = staged.attributes_mut(key) else {
            return Err(FlowdeclError::not_found(scope, key));
        };
        let changed = editor::apply_edits(attrs, &edits);
        if changed.is_empty() {
            return Ok(changed);
        }
        let attributes = attrs.clone();

        self.commit(scope, staged, |fields| {
            if let Some(node) = fields.get_mut(key) {
                node.attributes = attributes;
            }
        })?;

        log::info!("Changed {} on '{}'", changed.join(", "), key);
        self.events.emit(&SessionEvent::PropertyChanged {
            scope,
            key: key.to_string(),
            fields: changed.clone(),
        });
        Ok(changed)
    }

    /// Apply a single field edit to the selected property.
    pub fn property_field_changed(&mut self, key: &str, field: &str, value: &str) -> Result<Vec<String>> {
        let scope = match self.selected() {
            Some((scope, selected)) if selected == key => scope,
            _ => {
                return Err(FlowdeclError::InvalidOperation(format!(
                    "'{key}' is not the selected property"
                )));
            }
        };
        let view = self.view(scope, key)?;
        let mut changes = IndexMap::new();
        changes.insert(field.to_string(), value.to_string());
        self.apply_field_changes(&view, &changes)
    }

    fn check_new_key(&self, scope: Scope, key: &str) -> Result<()> {
        if !markup::is_valid_name(key) {
            return Err(FlowdeclError::InvalidOperation(format!(
                "'{key}' is not a valid property name"
            )));
        }
        if self.catalog.is_structural(scope, key) {
            return Err(FlowdeclError::InvalidOperation(format!(
                "'{key}' is a structural field of the document"
            )));
        }
        if self.catalog.contains(scope, key) || self.document.contains(scope, key) {
            return Err(FlowdeclError::duplicate(scope, key));
        }
        Ok(())
    }

    fn commit(&mut self, scope: Scope, staged: ScopeCatalog, mirror: impl FnOnce(&mut Fields)) -> Result<()> {
        if let Err(e) = tree::build_forest(scope, staged.properties(), staged.index()) {
            log::warn!("Rejected {} edit: {}", scope, e);
            return Err(e);
        }
        self.catalog.replace_scope(scope, staged);
        mirror(self.document.fields_mut(scope));
        self.dirty = true;
        Ok(())
    }
}
