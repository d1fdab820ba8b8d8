//! Document data types.
//!
//! This module contains the core data types of a declaration document:
//! - `Scope` - Which of the two property namespaces a key lives in
//! - `Attributes` - Ordered attribute map with accessors for well-known keys
//! - `PropertyNode` - Attributes plus optional text body of one property

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::FlowdeclError;
use crate::markup::Element;

/// One of the two independent property namespaces of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Flow element properties (`ElementFields`).
    Element,
    /// Outgoing connection properties (`ConnectionFields`).
    Connection,
}

impl Scope {
    /// Both scopes, in lookup order.
    pub const ALL: [Scope; 2] = [Scope::Element, Scope::Connection];

    /// Tag name of the container holding this scope's properties.
    pub fn container_tag(self) -> &'static str {
        match self {
            Scope::Element => "ElementFields",
            Scope::Connection => "ConnectionFields",
        }
    }

    /// Heading shown for this scope in a hierarchy view.
    pub fn heading(self) -> &'static str {
        match self {
            Scope::Element => "Flow element properties",
            Scope::Connection => "Outgoing connection properties",
        }
    }

    pub(crate) fn from_container_tag(tag: &str) -> Option<Scope> {
        Scope::ALL.into_iter().find(|s| s.container_tag() == tag)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Element => f.write_str("element"),
            Scope::Connection => f.write_str("connection"),
        }
    }
}

impl FromStr for Scope {
    type Err = FlowdeclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "element" | "flow" => Ok(Scope::Element),
            "connection" | "outgoing" => Ok(Scope::Connection),
            other => Err(FlowdeclError::InvalidOperation(format!(
                "unknown scope '{other}' (expected 'element' or 'connection')"
            ))),
        }
    }
}

/// Attribute names the core or the editor projection give meaning to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnown {
    /// Key of the parent property in the same scope.
    Dependency,
    /// Editor kind (e.g. `inline`, `dropdown`).
    Editor,
    /// Default value.
    Default,
    /// Validation rule.
    Validation,
    /// Short help text.
    Tooltip,
    /// Human-readable property name.
    LocalizedTagName,
    /// Long help text.
    DetailedInfo,
    /// Condition on the parent's value that shows this property.
    DependencyCondition,
    /// Parent value the condition compares against.
    DependencyValue,
    /// How the parent value is compared.
    DependencyType,
    /// Value type marker.
    Type,
    /// Editor subtype marker.
    Subtype,
    /// Set on properties created by users rather than shipped with the element.
    UserDefined,
}

impl WellKnown {
    /// Every well-known attribute.
    pub const ALL: [WellKnown; 13] = [
        WellKnown::Dependency,
        WellKnown::Editor,
        WellKnown::Default,
        WellKnown::Validation,
        WellKnown::Tooltip,
        WellKnown::LocalizedTagName,
        WellKnown::DetailedInfo,
        WellKnown::DependencyCondition,
        WellKnown::DependencyValue,
        WellKnown::DependencyType,
        WellKnown::Type,
        WellKnown::Subtype,
        WellKnown::UserDefined,
    ];

    /// Attribute name as written in the document.
    pub fn as_str(self) -> &'static str {
        match self {
            WellKnown::Dependency => "Dependency",
            WellKnown::Editor => "Editor",
            WellKnown::Default => "Default",
            WellKnown::Validation => "Validation",
            WellKnown::Tooltip => "Tooltip",
            WellKnown::LocalizedTagName => "LocalizedTagName",
            WellKnown::DetailedInfo => "DetailedInfo",
            WellKnown::DependencyCondition => "DependencyCondition",
            WellKnown::DependencyValue => "Dependencyvalue",
            WellKnown::DependencyType => "Dependencytype",
            WellKnown::Type => "Type",
            WellKnown::Subtype => "Subtype",
            WellKnown::UserDefined => "UserDefined",
        }
    }

    /// Look up a well-known attribute by its document name.
    pub fn from_name(name: &str) -> Option<WellKnown> {
        WellKnown::ALL.into_iter().find(|w| w.as_str() == name)
    }
}

/// Ordered attribute map of a property node.
///
/// Values are plain strings. Well-known attributes have typed accessors;
/// everything else is reachable through [`Attributes::custom`] and is carried
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(IndexMap<String, String>);

impl Attributes {
    /// Create an empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Get a well-known attribute value.
    pub fn well_known(&self, attr: WellKnown) -> Option<&str> {
        self.get(attr.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Remove an attribute, preserving the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.shift_remove(name)
    }

    /// Returns true if the attribute is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterate over attributes in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Attributes that are not well-known, in document order.
    pub fn custom(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(k, _)| WellKnown::from_name(k).is_none())
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Key of the parent property. An empty value counts as no dependency.
    pub fn dependency(&self) -> Option<&str> {
        self.well_known(WellKnown::Dependency)
            .filter(|d| !d.is_empty())
    }

    /// Editor kind.
    pub fn editor(&self) -> Option<&str> {
        self.well_known(WellKnown::Editor)
    }

    /// Default value.
    pub fn default_value(&self) -> Option<&str> {
        self.well_known(WellKnown::Default)
    }

    /// Validation rule.
    pub fn validation(&self) -> Option<&str> {
        self.well_known(WellKnown::Validation)
    }

    /// Tooltip text.
    pub fn tooltip(&self) -> Option<&str> {
        self.well_known(WellKnown::Tooltip)
    }

    /// Human-readable name.
    pub fn tag_name(&self) -> Option<&str> {
        self.well_known(WellKnown::LocalizedTagName)
            .filter(|n| !n.is_empty())
    }

    pub(crate) fn as_map(&self) -> &IndexMap<String, String> {
        &self.0
    }
}

impl From<IndexMap<String, String>> for Attributes {
    fn from(map: IndexMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A single property node: attributes plus optional text body.
///
/// Nested elements are not interpreted by the core; they are kept so that
/// structural fields round-trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyNode {
    /// Attribute map.
    pub attributes: Attributes,
    /// Text body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Nested elements, carried through untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl PropertyNode {
    /// Create a node with the given attributes and no body.
    pub fn with_attributes(attributes: Attributes) -> Self {
        Self {
            attributes,
            text: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn from_element(element: Element) -> (String, Self) {
        let node = Self {
            attributes: Attributes::from(element.attributes),
            text: element.text,
            children: element.children,
        };
        (element.name, node)
    }

    pub(crate) fn to_element(&self, key: &str) -> Element {
        Element {
            name: key.to_string(),
            attributes: self.attributes.as_map().clone(),
            text: self.text.clone(),
            children: self.children.clone(),
        }
    }
}
