//! Hierarchy tree mirroring the entity store
//!
//! The tree is the display model of the address book: groups and ungrouped
//! connections at the root, connections inside groups one level down.
//! Siblings are kept sorted by label (case-sensitive, as typed) with ties in
//! insertion order.

use uuid::Uuid;

use crate::models::{Connection, ConnectionGroup};

/// Kind of record a node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Group node; may hold connection children
    Group,
    /// Connection node; always a leaf
    Connection,
}

/// A node of the hierarchy tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Id of the backing store record
    pub id: Uuid,
    /// Node kind
    pub kind: NodeKind,
    /// Display label
    pub label: String,
    /// Whether the node is expanded (groups only)
    pub expanded: bool,
    /// Sorted children
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn group(group: &ConnectionGroup) -> Self {
        Self {
            id: group.id,
            kind: NodeKind::Group,
            label: group.name.clone(),
            expanded: group.expanded,
            children: Vec::new(),
        }
    }

    fn connection(connection: &Connection) -> Self {
        Self {
            id: connection.id,
            kind: NodeKind::Connection,
            label: connection.name.clone(),
            expanded: false,
            children: Vec::new(),
        }
    }

    /// Returns true for group nodes
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.kind == NodeKind::Group
    }

    /// Returns the number of direct children
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns the ids of the direct children in display order
    #[must_use]
    pub fn child_ids(&self) -> Vec<Uuid> {
        self.children.iter().map(|c| c.id).collect()
    }
}

/// Ordered tree of groups and connections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyTree {
    roots: Vec<TreeNode>,
}

impl HierarchyTree {
    /// Creates an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the root-level nodes in display order
    #[must_use]
    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    /// Returns the total number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    /// Returns true if the tree has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Inserts a group node under the root
    pub fn insert_group(&mut self, group: &ConnectionGroup) -> &TreeNode {
        let id = group.id;
        self.roots.push(TreeNode::group(group));
        sort_siblings(&mut self.roots);
        let index = self.roots.iter().position(|n| n.id == id).unwrap_or_default();
        &self.roots[index]
    }

    /// Inserts a connection node under `parent`, or under the root when `None`
    ///
    /// Returns `None` if the parent node does not exist or is not a group.
    pub fn insert_connection(
        &mut self,
        parent: Option<Uuid>,
        connection: &Connection,
    ) -> Option<&TreeNode> {
        let id = connection.id;
        let siblings = match parent {
            None => &mut self.roots,
            Some(parent_id) => {
                let node = self.find_node_mut(parent_id)?;
                if !node.is_group() {
                    return None;
                }
                &mut node.children
            }
        };
        siblings.push(TreeNode::connection(connection));
        sort_siblings(siblings);
        siblings.iter().find(|n| n.id == id)
    }

    /// Finds a node anywhere in the tree
    #[must_use]
    pub fn find_node(&self, id: Uuid) -> Option<&TreeNode> {
        self.walk().find(|n| n.id == id)
    }

    /// Finds a mutable node anywhere in the tree
    pub fn find_node_mut(&mut self, id: Uuid) -> Option<&mut TreeNode> {
        find_in_mut(&mut self.roots, id)
    }

    /// Returns the id of the group holding `id`
    ///
    /// `None` for root-level nodes and for unknown ids.
    #[must_use]
    pub fn parent_of(&self, id: Uuid) -> Option<Uuid> {
        self.roots
            .iter()
            .find(|group| group.children.iter().any(|c| c.id == id))
            .map(|group| group.id)
    }

    /// Detaches a node together with its subtree
    pub fn remove_node(&mut self, id: Uuid) -> Option<TreeNode> {
        remove_from(&mut self.roots, id)
    }

    /// Relabels a node and re-sorts its siblings
    pub fn rename(&mut self, id: Uuid, label: &str) -> bool {
        let parent = self.parent_of(id);
        let Some(node) = self.find_node_mut(id) else {
            return false;
        };
        label.clone_into(&mut node.label);

        match parent {
            Some(parent_id) => {
                if let Some(parent) = self.find_node_mut(parent_id) {
                    sort_siblings(&mut parent.children);
                }
            }
            None => sort_siblings(&mut self.roots),
        }
        true
    }

    /// Detaches every child of a node, returning the detached ids
    pub fn clear_children(&mut self, id: Uuid) -> Vec<Uuid> {
        let Some(node) = self.find_node_mut(id) else {
            return Vec::new();
        };
        let detached = std::mem::take(&mut node.children);
        Walk::new(&detached).map(|n| n.id).collect()
    }

    /// Sets the expanded flag of a node
    pub fn set_expanded(&mut self, id: Uuid, expanded: bool) -> bool {
        match self.find_node_mut(id) {
            Some(node) => {
                node.expanded = expanded;
                true
            }
            None => false,
        }
    }

    /// Returns the number of children of a node (0 for unknown ids)
    #[must_use]
    pub fn child_count(&self, id: Uuid) -> usize {
        self.find_node(id).map_or(0, TreeNode::child_count)
    }

    /// Iterates over every node depth-first in display order
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(&self.roots)
    }
}

/// Depth-first pre-order iterator over tree nodes
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Walk<'a> {
    fn new(nodes: &'a [TreeNode]) -> Self {
        Self {
            stack: nodes.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

fn sort_siblings(nodes: &mut [TreeNode]) {
    nodes.sort_by(|a, b| a.label.cmp(&b.label));
}

fn find_in_mut(nodes: &mut [TreeNode], id: Uuid) -> Option<&mut TreeNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_in_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

fn remove_from(nodes: &mut Vec<TreeNode>, id: Uuid) -> Option<TreeNode> {
    if let Some(index) = nodes.iter().position(|n| n.id == id) {
        return Some(nodes.remove(index));
    }
    nodes
        .iter_mut()
        .find_map(|node| remove_from(&mut node.children, id))
}
