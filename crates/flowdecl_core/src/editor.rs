//! Property editor projection.
//!
//! Translates a property's attribute map into an ordered list of labelled rows
//! for a form-style editor, and validates the change-sets such an editor sends
//! back. Applying the changes to a session is done by
//! [`Session::apply_field_changes`](crate::session::Session::apply_field_changes).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Property;
use crate::document::{Attributes, Scope};
use crate::error::{FlowdeclError, Result};

/// Id of the synthetic row carrying the property key.
pub const KEY_FIELD: &str = "@key";

/// Label of the synthetic key row.
pub const KEY_LABEL: &str = "Tag";

/// Attributes shown first, in this order, when present.
pub const PREFERRED_FIELDS: [&str; 10] = [
    "LocalizedTagName",
    "Tooltip",
    "Editor",
    "Default",
    "Dependency",
    "DependencyCondition",
    "Dependencyvalue",
    "Dependencytype",
    "Validation",
    "DetailedInfo",
];

/// Attributes never shown.
pub const HIDDEN_FIELDS: [&str; 3] = ["Type", "Subtype", "UserDefined"];

/// Display label for an attribute name.
pub fn label_for(attr: &str) -> &str {
    match attr {
        "LocalizedTagName" => "Name",
        "Dependencyvalue" => "Master value",
        "DependencyCondition" => "Show if master",
        "DetailedInfo" => "Default info",
        other => other,
    }
}

/// Returns true if `attr` is never shown in the editor.
pub fn is_hidden(attr: &str) -> bool {
    HIDDEN_FIELDS.contains(&attr)
}

/// One editable row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FieldRow {
    /// Field id: the attribute name, or [`KEY_FIELD`].
    pub id: String,
    /// Display label.
    pub label: String,
    /// Current value.
    pub value: String,
    /// True if edits to this row are ignored.
    pub read_only: bool,
}

impl FieldRow {
    fn attribute(name: &str, value: &str) -> Self {
        Self {
            id: name.to_string(),
            label: label_for(name).to_string(),
            value: value.to_string(),
            read_only: false,
        }
    }
}

/// Rows for a property.
///
/// The key row comes first, then preferred attributes in their fixed order,
/// then every other visible attribute sorted by name.
pub fn project(property: &Property) -> Vec<FieldRow> {
    let attrs = property.attributes();
    let mut rows = vec![FieldRow {
        id: KEY_FIELD.to_string(),
        label: KEY_LABEL.to_string(),
        value: property.key.clone(),
        read_only: true,
    }];

    for name in PREFERRED_FIELDS {
        if let Some(value) = attrs.get(name) {
            rows.push(FieldRow::attribute(name, value));
        }
    }

    let mut rest: Vec<(&str, &str)> = attrs
        .iter()
        .filter(|(name, _)| !is_hidden(name) && !PREFERRED_FIELDS.contains(name))
        .collect();
    rest.sort_by(|a, b| a.0.cmp(b.0));
    rows.extend(rest.into_iter().map(|(name, value)| FieldRow::attribute(name, value)));

    rows
}

/// An editor's snapshot of one property.
///
/// The generation ties the view to the catalog it was taken from; after a
/// reload the view is stale and can no longer be used to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PropertyView {
    /// Scope of the property.
    pub scope: Scope,
    /// Key of the property.
    pub key: String,
    /// Session generation the view was taken at.
    #[ts(type = "number")]
    pub generation: u64,
    /// Rows in display order.
    pub rows: Vec<FieldRow>,
}

impl PropertyView {
    /// Project a property at the given generation.
    pub fn new(property: &Property, generation: u64) -> Self {
        Self {
            scope: property.scope,
            key: property.key.clone(),
            generation,
            rows: project(property),
        }
    }

    /// Row with the given id.
    pub fn row(&self, id: &str) -> Option<&FieldRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Value of the row with the given id.
    pub fn value(&self, id: &str) -> Option<&str> {
        self.row(id).map(|r| r.value.as_str())
    }
}

/// Check a change-set against a property and return the edits to apply.
///
/// Entries for the key row are dropped. Any id that is neither a visible
/// attribute of the property nor a preferred field fails the whole set.
pub(crate) fn check_changes(
    property: &Property,
    changes: &IndexMap<String, String>,
) -> Result<Vec<(String, String)>> {
    let attrs = property.attributes();
    let unknown: Vec<&str> = changes
        .keys()
        .map(String::as_str)
        .filter(|id| *id != KEY_FIELD)
        .filter(|id| !PREFERRED_FIELDS.contains(id) && (is_hidden(id) || !attrs.contains(id)))
        .collect();
    if !unknown.is_empty() {
        return Err(FlowdeclError::InvalidOperation(format!(
            "unknown field(s) for '{}': {}",
            property.key,
            unknown.join(", ")
        )));
    }

    Ok(changes
        .iter()
        .filter(|(id, _)| id.as_str() != KEY_FIELD)
        .map(|(id, value)| (id.clone(), value.clone()))
        .collect())
}

/// Write edits into an attribute map. Returns the ids whose value changed.
pub(crate) fn apply_edits(attrs: &mut Attributes, edits: &[(String, String)]) -> Vec<String> {
    let mut changed = Vec::new();
    for (id, value) in edits {
        if attrs.get(id) == Some(value.as_str()) {
            continue;
        }
        attrs.set(id.clone(), value.clone());
        changed.push(id.clone());
    }
    changed
}
