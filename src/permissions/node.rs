//! Permission node tree
//!
//! One node per segment of a dotted permission path. Nodes own their
//! children; the tree is cleared and rebuilt wholesale on reload, so nodes
//! are never removed individually.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Segment name that matches any child not listed explicitly
pub const ASTERISK: &str = "*";

/// A single segment of a permission path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionNode {
    name: String,
    value: bool,
    children: BTreeMap<String, PermissionNode>,
    /// Store row id, assigned after the path is persisted
    id: Option<i64>,
}

impl PermissionNode {
    /// Create a node without children
    pub fn new(name: impl Into<String>, value: bool) -> Self {
        Self {
            name: name.into(),
            value,
            children: BTreeMap::new(),
            id: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> bool {
        self.value
    }

    pub fn set_value(&mut self, value: bool) {
        self.value = value;
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    /// True if this node is the `*` wildcard
    pub fn is_asterisk(&self) -> bool {
        self.name == ASTERISK
    }

    /// Attach a child keyed by its name, replacing any existing child of that name.
    /// Returns the attached child.
    pub fn add_child_node(&mut self, node: PermissionNode) -> &mut PermissionNode {
        match self.children.entry(node.name.clone()) {
            Entry::Occupied(mut slot) => {
                slot.insert(node);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(node),
        }
    }

    /// Get the named child, creating it with `value` if missing.
    /// The flag is true when the child was created by this call.
    pub fn child_or_insert(&mut self, name: &str, value: bool) -> (&mut PermissionNode, bool) {
        match self.children.entry(name.to_string()) {
            Entry::Occupied(slot) => (slot.into_mut(), false),
            Entry::Vacant(slot) => (slot.insert(PermissionNode::new(name, value)), true),
        }
    }

    /// Exact-key lookup. `*` is a literal key here; wildcard matching is the resolver's job.
    pub fn get_child_node(&self, name: &str) -> Option<&PermissionNode> {
        self.children.get(name)
    }

    pub fn get_child_node_mut(&mut self, name: &str) -> Option<&mut PermissionNode> {
        self.children.get_mut(name)
    }

    pub fn has_child_node(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn children(&self) -> impl Iterator<Item = &PermissionNode> {
        self.children.values()
    }

    /// Depth-first pre-order flattening of this node and all descendants
    pub fn get_child_nodes<'a>(&'a self, acc: &mut Vec<&'a PermissionNode>) {
        acc.push(self);
        for child in self.children.values() {
            child.get_child_nodes(acc);
        }
    }

    /// Full dotted paths with values for this node and its descendants, pre-order
    pub fn entries(&self, prefix: Option<&str>, acc: &mut Vec<(String, bool)>) {
        let path = match prefix {
            Some(p) => format!("{}.{}", p, self.name),
            None => self.name.clone(),
        };
        acc.push((path.clone(), self.value));
        for child in self.children.values() {
            child.entries(Some(&path), acc);
        }
    }
}
