//! Property-based tests for the address book edit rules

use proptest::prelude::*;
use simconsole_core::{AddressBook, ConnectionDraft, ConnectionGroup, RosterResponse};

fn arb_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Za-z][a-z0-9]{0,6}", 1..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Deleting a static group with children is refused and leaves the group
    /// in both the store and the tree.
    #[test]
    fn prop_non_empty_static_group_not_deleted(names in arb_names()) {
        let mut book = AddressBook::new();
        let group = book.create_group();
        for name in &names {
            book.add_connection(Some(group), ConnectionDraft::new(name.clone(), "sim", 9000));
        }

        prop_assert!(!book.delete_group(group));
        prop_assert!(book.group(group).is_some());
        prop_assert_eq!(book.tree().child_count(group), names.len());
        prop_assert!(book.validate());
    }

    /// A dynamic group holding fetched children cannot be deleted, and its
    /// children cannot be deleted, renamed or edited.
    #[test]
    fn prop_dynamic_records_read_only(names in arb_names()) {
        let mut book = AddressBook::new();
        let group = book.insert_group(ConnectionGroup::new_dynamic(
            "Grid".into(),
            "http://grid.example/r".into(),
        ));
        let request = book.begin_load(group).expect("request");
        let body = names.iter().map(|n| format!("h {n}")).collect::<Vec<_>>().join("\n");
        book.complete_load(RosterResponse {
            group_id: group,
            generation: request.generation,
            result: Ok(body),
        });

        prop_assert!(!book.delete_group(group));
        let children = book.tree().find_node(group).expect("group").child_ids();
        prop_assert_eq!(children.len(), names.len());
        for child in children {
            prop_assert!(!book.delete_connection(child));
            prop_assert!(!book.rename(child, "Renamed"));
            prop_assert!(!book.update_connection(child, &ConnectionDraft::new("x", "y", 1)));
            prop_assert!(book.connection(child).is_some());
        }
        prop_assert!(book
            .add_connection(Some(group), ConnectionDraft::new("Manual", "h", 9000))
            .is_none());
    }
}
