//! Dependency tree.
//!
//! A scope's hierarchy is not stored anywhere: each property names its parent
//! through the `Dependency` attribute and the forest is derived from those
//! back-references. [`DependencyIndex`] groups children under their parent key
//! in a single pass; [`build_forest`] expands it from the roots and reports a
//! cycle when some property is never reached.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Property;
use crate::document::Scope;
use crate::error::{FlowdeclError, Result};

/// Parent key → children positions for one scope.
///
/// Positions refer to the scope's catalog order at the time the index was
/// built and are only valid until the scope changes.
#[derive(Debug, Clone, Default)]
pub(crate) struct DependencyIndex {
    children: HashMap<String, Vec<usize>>,
    roots: Vec<usize>,
    orphans: Vec<usize>,
}

impl DependencyIndex {
    pub(crate) fn build(props: &IndexMap<String, Property>) -> Self {
        let mut index = Self::default();
        for (i, prop) in props.values().enumerate() {
            match prop.dependency() {
                None => index.roots.push(i),
                Some(dep) if props.contains_key(dep) => {
                    index.children.entry(dep.to_string()).or_default().push(i);
                }
                // Dangling reference: treated as a root
                Some(_) => {
                    index.roots.push(i);
                    index.orphans.push(i);
                }
            }
        }
        index
    }

    pub(crate) fn children(&self, key: &str) -> &[usize] {
        self.children.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub(crate) fn orphans(&self) -> &[usize] {
        &self.orphans
    }

    fn is_orphan(&self, pos: usize) -> bool {
        // Pushed in ascending order
        self.orphans.binary_search(&pos).is_ok()
    }
}

/// Node in a scope's dependency forest (for display purposes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TreeNode {
    /// Property key
    pub key: String,
    /// Display label (localized tag name, or the key)
    pub label: String,
    /// Scope of the property
    pub scope: Scope,
    /// True if the property depends on a key that does not exist
    pub orphan: bool,
    /// Dependent properties, in catalog order
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(&node.children);
        }
        total
    }

    /// Find a node by key in this subtree, searching in pre-order.
    pub fn find(&self, key: &str) -> Option<&TreeNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.key == key {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }
}

// Chains may be arbitrarily deep, so children are released from a flat
// stack instead of one nested drop per level.
impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// A node whose children are still being expanded.
struct Pending {
    pos: usize,
    next: usize,
    children: Vec<TreeNode>,
}

impl Pending {
    fn new(pos: usize) -> Self {
        Self {
            pos,
            next: 0,
            children: Vec::new(),
        }
    }

    fn finish(self, props: &IndexMap<String, Property>, index: &DependencyIndex) -> TreeNode {
        let prop = &props[self.pos];
        TreeNode {
            key: prop.key.clone(),
            label: prop.label().to_string(),
            scope: prop.scope,
            orphan: index.is_orphan(self.pos),
            children: self.children,
        }
    }
}

/// Expand the forest of a scope from its index.
///
/// Every property appears exactly once. Properties not reachable from a root
/// lie on a dependency cycle; the first one found is reported as a
/// [`FlowdeclError::Cycle`] listing the keys around the loop.
pub(crate) fn build_forest(
    scope: Scope,
    props: &IndexMap<String, Property>,
    index: &DependencyIndex,
) -> Result<Vec<TreeNode>> {
    let mut visited = vec![false; props.len()];
    let mut forest = Vec::with_capacity(index.roots().len());

    for &root in index.roots() {
        visited[root] = true;
        let mut stack = vec![Pending::new(root)];
        while let Some(top) = stack.last_mut() {
            if let Some(&child) = index.children(&props[top.pos].key).get(top.next) {
                top.next += 1;
                visited[child] = true;
                stack.push(Pending::new(child));
                continue;
            }
            let Some(done) = stack.pop() else { break };
            let node = done.finish(props, index);
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => forest.push(node),
            }
        }
    }

    if let Some(start) = visited.iter().position(|seen| !seen) {
        let keys = cycle_from(start, props);
        log::warn!("Dependency cycle in {} scope: {}", scope, keys.join(" -> "));
        return Err(FlowdeclError::Cycle { scope, keys });
    }

    Ok(forest)
}

/// Follow parent references from `start` until a key repeats.
fn cycle_from(start: usize, props: &IndexMap<String, Property>) -> Vec<String> {
    let mut path: Vec<usize> = Vec::new();
    let mut current = start;
    loop {
        if let Some(at) = path.iter().position(|&p| p == current) {
            let mut keys: Vec<String> = path[at..].iter().map(|&p| props[p].key.clone()).collect();
            keys.push(props[current].key.clone());
            return keys;
        }
        path.push(current);
        match props[current].dependency().and_then(|d| props.get_index_of(d)) {
            Some(parent) => current = parent,
            None => return path.iter().map(|&p| props[p].key.clone()).collect(),
        }
    }
}

/// Name of a document plus the forests of both scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DocumentOutline {
    /// Document display name
    pub name: String,
    /// Element-scope forest
    pub element: Vec<TreeNode>,
    /// Connection-scope forest
    pub connection: Vec<TreeNode>,
}

impl DocumentOutline {
    /// Forest of one scope.
    pub fn forest(&self, scope: Scope) -> &[TreeNode] {
        match scope {
            Scope::Element => &self.element,
            Scope::Connection => &self.connection,
        }
    }

    /// Render the outline as text, one heading per scope.
    pub fn format(&self) -> String {
        let mut result = String::new();
        result.push_str(&self.name);
        result.push('\n');
        for scope in Scope::ALL {
            result.push_str(&format_tree(scope.heading(), self.forest(scope)));
        }
        result
    }
}

/// Render a forest under a heading with box-drawing connectors.
pub fn format_tree(heading: &str, nodes: &[TreeNode]) -> String {
    let mut result = String::new();
    result.push_str(heading);
    result.push('\n');
    result.push_str(&format_children(nodes, ""));
    result
}

/// Helper function to format a tree node for display
pub fn format_tree_node(node: &TreeNode, prefix: &str) -> String {
    let mut result = String::new();
    push_label(&mut result, node);
    result.push_str(&format_children(&node.children, prefix));
    result
}

fn push_label(result: &mut String, node: &TreeNode) {
    result.push_str(&node.label);
    if node.label != node.key {
        result.push_str(" (");
        result.push_str(&node.key);
        result.push(')');
    }
    if node.orphan {
        result.push_str(" [orphan]");
    }
    result.push('\n');
}

fn format_children(nodes: &[TreeNode], prefix: &str) -> String {
    let mut result = String::new();
    let mut stack = Vec::new();
    push_children(&mut stack, nodes, prefix);

    while let Some((node, prefix, is_last)) = stack.pop() {
        let connector = if is_last { "└── " } else { "├── " };
        let child_prefix = if is_last { "    " } else { "│   " };

        result.push_str(&prefix);
        result.push_str(connector);
        push_label(&mut result, node);
        push_children(&mut stack, &node.children, &format!("{}{}", prefix, child_prefix));
    }
    result
}

/// Queue `nodes` so that they pop in order, each tagged with its prefix.
fn push_children<'a>(stack: &mut Vec<(&'a TreeNode, String, bool)>, nodes: &'a [TreeNode], prefix: &str) {
    let last = nodes.len().saturating_sub(1);
    for (i, node) in nodes.iter().enumerate().rev() {
        stack.push((node, prefix.to_string(), i == last));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::document::load;
    use crate::test_utils::{ABC_XML, SAMPLE_XML, element_xml};

    fn forest(xml: &str) -> Result<Vec<TreeNode>> {
        Catalog::build(&load(xml).unwrap(), &[]).tree(Scope::Element)
    }

    fn total(nodes: &[TreeNode]) -> usize {
        nodes.iter().map(TreeNode::count).sum()
    }

    #[test]
    fn test_forest_of_abc() {
        let nodes = forest(ABC_XML).unwrap();
        let roots: Vec<_> = nodes.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(roots, vec!["A", "C"]);
        assert_eq!(nodes[0].children.len(), 1);
        assert_eq!(nodes[0].children[0].key, "B");
        assert_eq!(total(&nodes), 3);
    }

    #[test]
    fn test_deep_chain_visits_every_property_once() {
        let xml = element_xml(&[
            ("D", Some("C")),
            ("C", Some("B")),
            ("B", Some("A")),
            ("A", None),
            ("E", Some("A")),
        ]);
        let nodes = forest(&xml).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(total(&nodes), 5);

        let a = &nodes[0];
        let kids: Vec<_> = a.children.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(kids, vec!["B", "E"]);
        assert!(a.find("D").is_some());
        assert_eq!(a.find("C").unwrap().children[0].key, "D");
    }

    #[test]
    fn test_very_deep_chain_does_not_overflow() {
        let keys: Vec<String> = (0..10_000).map(|i| format!("P{i}")).collect();
        let props: Vec<(&str, Option<&str>)> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.as_str(), i.checked_sub(1).map(|p| keys[p].as_str())))
            .collect();
        let nodes = forest(&element_xml(&props)).unwrap();

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].key, "P0");
        assert_eq!(total(&nodes), 10_000);
        let last = nodes[0].find("P9999").unwrap();
        assert!(last.children.is_empty());

        let text = format_tree("Props", &nodes[0].find("P9990").map(|n| vec![n.clone()]).unwrap());
        assert_eq!(text.lines().count(), 11);
        assert!(text.ends_with("P9999\n"));
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let xml = element_xml(&[("A", None), ("X", Some("X"))]);
        match forest(&xml) {
            Err(FlowdeclError::Cycle { scope, keys }) => {
                assert_eq!(scope, Scope::Element);
                assert_eq!(keys, vec!["X", "X"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_longer_cycle_reports_loop() {
        let xml = element_xml(&[("P", Some("R")), ("Q", Some("P")), ("R", Some("Q")), ("S", Some("P"))]);
        match forest(&xml) {
            Err(FlowdeclError::Cycle { keys, .. }) => {
                assert_eq!(keys.first(), keys.last());
                assert_eq!(keys.len(), 4);
                for key in ["P", "Q", "R"] {
                    assert!(keys.iter().any(|k| k == key));
                }
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_orphans_become_flagged_roots() {
        let xml = element_xml(&[("B", Some("A")), ("C", Some("B"))]);
        let nodes = forest(&xml).unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].orphan);
        assert_eq!(nodes[0].key, "B");
        assert!(!nodes[0].children[0].orphan);
    }

    #[test]
    fn test_labels_use_localized_name() {
        let xml = r#"<Object><ElementFields><Speed LocalizedTagName="Max speed"/><Raw/></ElementFields></Object>"#;
        let nodes = forest(xml).unwrap();
        assert_eq!(nodes[0].label, "Max speed");
        assert_eq!(nodes[1].label, "Raw");
    }

    #[test]
    fn test_format_tree() {
        let nodes = forest(&element_xml(&[("A", None), ("B", Some("A")), ("D", Some("A")), ("C", None)])).unwrap();
        let text = format_tree("Props", &nodes);
        assert_eq!(text, "Props\n├── A\n│   ├── B\n│   └── D\n└── C\n");
    }

    #[test]
    fn test_format_tree_node_marks_orphans_and_keys() {
        let node = TreeNode {
            key: "Sub".into(),
            label: "Sub folder".into(),
            scope: Scope::Element,
            orphan: true,
            children: vec![],
        };
        assert_eq!(format_tree_node(&node, ""), "Sub folder (Sub) [orphan]\n");
    }

    #[test]
    fn test_outline_format_has_both_scopes() {
        let catalog = Catalog::build(&load(SAMPLE_XML).unwrap(), &[]);
        let outline = DocumentOutline {
            name: "Archive mover".into(),
            element: catalog.tree(Scope::Element).unwrap(),
            connection: catalog.tree(Scope::Connection).unwrap(),
        };
        let text = outline.format();
        assert!(text.starts_with("Archive mover\nFlow element properties\n"));
        assert!(text.contains("Outgoing connection properties\n└── Priority\n    └── Label\n"));
    }
}
