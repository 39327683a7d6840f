//! Property-based tests for the hierarchy tree

use proptest::prelude::*;
use simconsole_core::{Connection, ConnectionGroup, HierarchyTree, TreeNode};

#[derive(Debug, Clone)]
enum TreeOp {
    AddGroup(String),
    AddConnection { name: String, parent: Option<usize> },
    Rename { target: usize, name: String },
    Remove(usize),
}

fn arb_label() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 _-]{1,8}"
}

fn arb_op() -> impl Strategy<Value = TreeOp> {
    prop_oneof![
        arb_label().prop_map(TreeOp::AddGroup),
        (arb_label(), prop::option::of(0usize..8))
            .prop_map(|(name, parent)| TreeOp::AddConnection { name, parent }),
        (0usize..16, arb_label()).prop_map(|(target, name)| TreeOp::Rename { target, name }),
        (0usize..16).prop_map(TreeOp::Remove),
    ]
}

fn assert_sorted(nodes: &[TreeNode]) -> bool {
    nodes.windows(2).all(|pair| pair[0].label <= pair[1].label)
        && nodes.iter().all(|n| assert_sorted(&n.children))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Siblings stay sorted by label and the node count tracks every
    /// successful insert and removal.
    #[test]
    fn prop_tree_stays_sorted(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut tree = HierarchyTree::new();
        let mut groups = Vec::new();
        let mut ids = Vec::new();

        for op in ops {
            match op {
                TreeOp::AddGroup(name) => {
                    let group = ConnectionGroup::new(name);
                    tree.insert_group(&group);
                    groups.push(group.id);
                    ids.push(group.id);
                }
                TreeOp::AddConnection { name, parent } => {
                    let parent = parent.and_then(|i| groups.get(i).copied());
                    let connection = Connection::new(name, "h".into(), 9000);
                    let before = tree.len();
                    let inserted = tree.insert_connection(parent, &connection).is_some();
                    let exists = parent.is_none_or(|p| tree.find_node(p).is_some());
                    prop_assert_eq!(inserted, exists);
                    if inserted {
                        prop_assert_eq!(tree.len(), before + 1);
                        prop_assert_eq!(tree.parent_of(connection.id), parent);
                        ids.push(connection.id);
                    }
                }
                TreeOp::Rename { target, name } => {
                    if let Some(id) = ids.get(target).copied() {
                        if tree.rename(id, &name) {
                            prop_assert_eq!(tree.find_node(id).map(|n| n.label.clone()), Some(name));
                        }
                    }
                }
                TreeOp::Remove(target) => {
                    if let Some(id) = ids.get(target).copied() {
                        let before = tree.len();
                        if let Some(removed) = tree.remove_node(id) {
                            let subtree = 1 + removed.child_count();
                            prop_assert_eq!(tree.len(), before - subtree);
                            prop_assert!(tree.find_node(id).is_none());
                        }
                    }
                }
            }
            prop_assert!(assert_sorted(tree.roots()));
        }
    }

    /// Equal labels keep their insertion order.
    #[test]
    fn prop_equal_labels_keep_insertion_order(count in 1usize..8, label in arb_label()) {
        let mut tree = HierarchyTree::new();
        let inserted: Vec<_> = (0..count)
            .map(|_| {
                let group = ConnectionGroup::new(label.clone());
                tree.insert_group(&group);
                group.id
            })
            .collect();
        let order: Vec<_> = tree.roots().iter().map(|n| n.id).collect();
        prop_assert_eq!(order, inserted);
    }
}
