//! Property-based tests for saving and restoring the address book

use std::collections::BTreeSet;

use proptest::prelude::*;
use simconsole_core::{
    AddressBook, ConfigManager, Connection, ConnectionDraft, GroupDraft,
    PersistedState, RosterResponse, UiSettings,
};
use tempfile::TempDir;
use uuid::Uuid;

// ========== Generators ==========

#[derive(Debug, Clone)]
struct GroupSpec {
    name: String,
    dynamic: bool,
    dns: Option<String>,
    expanded: bool,
    roster: Vec<String>,
}

#[derive(Debug, Clone)]
struct ConnectionSpec {
    name: String,
    host: String,
    port: u16,
    user: String,
    pass: String,
    /// Index into the generated groups; `None` for the root
    parent: Option<usize>,
}

fn arb_group() -> impl Strategy<Value = GroupSpec> {
    (
        "[A-Za-z][A-Za-z0-9 ]{0,10}",
        any::<bool>(),
        prop::option::of("10\\.[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}"),
        any::<bool>(),
        prop::collection::vec("[a-z]{1,6}(:[0-9]{1,4})? [a-z]{1,6}", 0..4),
    )
        .prop_map(|(name, dynamic, dns, expanded, roster)| GroupSpec {
            name,
            dynamic,
            dns,
            expanded,
            roster,
        })
}

fn arb_connection(groups: usize) -> impl Strategy<Value = ConnectionSpec> {
    (
        "[A-Za-z][A-Za-z0-9 ]{0,10}",
        "[a-z][a-z0-9.-]{0,15}",
        any::<u16>(),
        "[a-z]{0,8}",
        "[ -~]{0,12}",
        prop::option::of(0..groups.max(1)),
    )
        .prop_map(move |(name, host, port, user, pass, parent)| ConnectionSpec {
            name,
            host,
            port,
            user,
            pass,
            parent: parent.filter(|_| groups > 0),
        })
}

fn arb_book_spec() -> impl Strategy<Value = (Vec<GroupSpec>, Vec<ConnectionSpec>)> {
    prop::collection::vec(arb_group(), 0..5).prop_flat_map(|groups| {
        let count = groups.len();
        (Just(groups), prop::collection::vec(arb_connection(count), 0..10))
    })
}

/// Builds a book with fetched dynamic groups; user connections may be
/// placed into any group, dynamic ones included
fn build_book(groups: &[GroupSpec], connections: &[ConnectionSpec]) -> AddressBook {
    let mut book = AddressBook::new();
    let ids: Vec<Uuid> = groups
        .iter()
        .map(|spec| {
            book.create_group_from(&GroupDraft {
                name: spec.name.clone(),
                dns: spec.dns.clone().unwrap_or_default(),
                dynamic: spec.dynamic,
                source: "http://roster.example/r".into(),
                ..GroupDraft::default()
            })
        })
        .collect();

    for (spec, id) in groups.iter().zip(&ids) {
        book.set_expanded(*id, spec.expanded);
        if let Some(request) = book.begin_load(*id) {
            book.complete_load(RosterResponse {
                group_id: *id,
                generation: request.generation,
                result: Ok(spec.roster.join("\n")),
            });
        }
    }

    for spec in connections {
        let parent = spec.parent.map(|i| ids[i]);
        let connection = ConnectionDraft::new(spec.name.clone(), spec.host.clone(), spec.port)
            .with_credentials(spec.user.clone(), spec.pass.clone())
            .into_connection();
        book.insert_connection(parent, connection);
    }
    book
}

fn connection_view(c: &Connection, parent: Option<Uuid>) -> (Uuid, String, String, u16, String, String, Option<Uuid>) {
    (
        c.id,
        c.name.clone(),
        c.host.clone(),
        c.port,
        c.username.clone(),
        c.password().to_string(),
        parent,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Saving never emits a dynamic connection, nor any connection whose
    /// parent group is dynamic.
    #[test]
    fn prop_save_skips_dynamic_connections((groups, connections) in arb_book_spec()) {
        let book = build_book(&groups, &connections);
        let state = PersistedState::capture(&book, &UiSettings::default());

        for record in &state.connections {
            let connection = book.connection(record.uuid).expect("saved connection exists");
            prop_assert!(!connection.dynamic);
            if let Some(parent) = record.parent {
                let group = book.group(parent).expect("parent exists");
                prop_assert!(!group.dynamic);
            }
        }

        let expected = book
            .store()
            .connections()
            .filter(|c| !c.dynamic)
            .filter(|c| book.parent_group(c.id).is_none_or(|g| !g.dynamic))
            .count();
        prop_assert_eq!(state.connections.len(), expected);
        prop_assert_eq!(state.groups.len(), groups.len());
    }

    /// Loading a saved book restores every group and every user connection
    /// outside dynamic groups, with the same fields and parent links.
    #[test]
    fn prop_save_load_roundtrip((groups, connections) in arb_book_spec(), black_on_white in any::<bool>()) {
        let book = build_book(&groups, &connections);
        let ui = UiSettings {
            window_geometry: vec![1, 2, 3],
            window_state: vec![255, 0],
            split: Some(vec![7]),
            black_on_white,
            system_font: !black_on_white,
        };

        let temp = TempDir::new().expect("temp dir");
        let config = ConfigManager::with_config_dir(temp.path().to_path_buf());
        config.save_state(&PersistedState::capture(&book, &ui)).expect("saved");
        let (restored, restored_ui) = config.load_state().restore();

        prop_assert_eq!(restored_ui, ui);

        let group_view = |b: &AddressBook| -> BTreeSet<(Uuid, String, bool, Option<String>, bool)> {
            b.store()
                .groups()
                .map(|g| (g.id, g.name.clone(), g.dynamic, g.dns.map(|d| d.to_string()), g.expanded))
                .collect()
        };
        prop_assert_eq!(group_view(&restored), group_view(&book));

        let expected: BTreeSet<_> = book
            .store()
            .connections()
            .filter(|c| !c.dynamic)
            .filter(|c| book.parent_group(c.id).is_none_or(|g| !g.dynamic))
            .map(|c| connection_view(c, book.tree().parent_of(c.id)))
            .collect();
        let actual: BTreeSet<_> = restored
            .store()
            .connections()
            .map(|c| connection_view(c, restored.tree().parent_of(c.id)))
            .collect();
        prop_assert_eq!(actual, expected);
        prop_assert!(restored.store().connections().all(|c| !c.dynamic));
        prop_assert!(restored.validate());
    }
}
