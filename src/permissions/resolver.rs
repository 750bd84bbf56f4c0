//! Path resolution over a provider's root nodes
//!
//! Resolution order for `resolve_path` (most specific wins):
//! 1. Start at the literal root for the first segment, else a root `*`
//! 2. Walk literal children, remembering the value of every `*` seen on the
//!    way (the node itself, or a `*` sibling of the branch taken)
//! 3. Missing literal child: the last `*` value seen, or deny
//! 4. Fully walked: the terminal node's value

use super::node::{PermissionNode, ASTERISK};

/// Find a root by exact name only
fn find_root_exact<'a>(roots: &'a [PermissionNode], name: &str) -> Option<&'a PermissionNode> {
    roots.iter().find(|n| n.name() == name)
}

/// Find the root for a segment: literal match first, a root `*` otherwise
pub fn find_root<'a>(roots: &'a [PermissionNode], name: &str) -> Option<&'a PermissionNode> {
    find_root_exact(roots, name).or_else(|| roots.iter().find(|n| n.is_asterisk()))
}

/// Insert a path, returning the deepest node touched.
///
/// Nodes created by this call take `value`; an existing terminal node has its
/// value overwritten. Existing intermediate nodes keep theirs.
pub fn add_path<'a>(
    roots: &'a mut Vec<PermissionNode>,
    segments: &[&str],
    value: bool,
) -> &'a mut PermissionNode {
    let (first, rest) = match segments.split_first() {
        Some((first, rest)) => (*first, rest),
        None => ("", &[][..]),
    };

    let index = match roots.iter().position(|n| n.name() == first) {
        Some(index) => {
            if rest.is_empty() {
                roots[index].set_value(value);
            }
            index
        }
        None => {
            roots.push(PermissionNode::new(first, value));
            roots.len() - 1
        }
    };

    let mut node = &mut roots[index];
    for (depth, segment) in rest.iter().enumerate() {
        let (child, created) = node.child_or_insert(segment, value);
        if !created && depth + 1 == rest.len() {
            child.set_value(value);
        }
        node = child;
    }
    node
}

/// Whether the tree has an entry covering the path.
///
/// A literal child is preferred at every level, with a `*` child accepted in
/// its place. A `*` node with nothing more specific below covers the rest.
pub fn has_path(roots: &[PermissionNode], segments: &[&str]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return false;
    };
    let Some(mut node) = find_root(roots, first) else {
        return false;
    };

    for segment in rest {
        match node
            .get_child_node(segment)
            .or_else(|| node.get_child_node(ASTERISK))
        {
            Some(child) => node = child,
            None => return node.is_asterisk(),
        }
    }
    true
}

/// Resolve the effective value of a path. Unresolvable paths deny.
pub fn resolve_path(roots: &[PermissionNode], segments: &[&str]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return false;
    };

    let root_asterisk = roots.iter().find(|n| n.is_asterisk());
    let mut has_asterisk = root_asterisk.is_some();
    let mut asterisk_value = root_asterisk.map(|n| n.value()).unwrap_or(false);

    let Some(mut node) = find_root(roots, first) else {
        return false;
    };

    let mut remaining = rest.iter();
    loop {
        if node.is_asterisk() {
            has_asterisk = true;
            asterisk_value = node.value();
        }
        // A wildcard sibling counts even when the literal branch is taken
        if let Some(star) = node.get_child_node(ASTERISK) {
            has_asterisk = true;
            asterisk_value = star.value();
        }

        let Some(segment) = remaining.next() else {
            break;
        };
        match node.get_child_node(segment) {
            Some(child) => node = child,
            None => return has_asterisk && asterisk_value,
        }
    }

    if has_asterisk && asterisk_value == node.value() {
        return asterisk_value;
    }
    // Explicit terminal node beats any wildcard seen on the way
    node.value()
}

/// Full dotted paths and values of every node under `roots`, pre-order
pub fn collect_entries(roots: &[PermissionNode]) -> Vec<(String, bool)> {
    let mut acc = Vec::new();
    for root in roots {
        root.entries(None, &mut acc);
    }
    acc
}
