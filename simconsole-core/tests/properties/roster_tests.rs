//! Property-based tests for roster parsing and dynamic group reloads

use proptest::prelude::*;
use simconsole_core::{
    parse_line, parse_roster, AddressBook, ConnectionGroup, LoadOutcome, RosterResponse,
    DEFAULT_ROSTER_PORT,
};

// ========== Generators ==========

fn arb_host() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}(\\.[a-z][a-z0-9]{0,7}){0,2}"
}

fn arb_words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z][a-z0-9]{0,5}", 1..4)
}

fn arb_line() -> impl Strategy<Value = String> {
    (arb_host(), prop::option::of(any::<u16>()), arb_words()).prop_map(|(host, port, words)| {
        let address = port.map_or_else(|| host.clone(), |p| format!("{host}:{p}"));
        format!("{address} {}", words.join(" "))
    })
}

fn arb_body() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            3 => arb_line(),
            1 => arb_host(),
            1 => Just(String::new()),
        ],
        0..12,
    )
    .prop_map(|lines| lines.join("\n"))
}

fn capitalized(words: &[String]) -> String {
    let joined = words.join(" ");
    let mut chars = joined.chars();
    chars
        .next()
        .map(|c| c.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A well-formed line yields its host, its port (or the default) and
    /// its words joined by single spaces with the first letter raised.
    #[test]
    fn prop_well_formed_line_parses(
        host in arb_host(),
        port in prop::option::of(any::<u16>()),
        words in arb_words(),
        gap in "[ \t]{1,3}",
    ) {
        let address = port.map_or_else(|| host.clone(), |p| format!("{host}:{p}"));
        let line = format!("{address}{gap}{}", words.join(gap.as_str()));

        let entry = parse_line(&line).expect("entry");
        prop_assert_eq!(entry.host, host);
        prop_assert_eq!(entry.port, port.unwrap_or(DEFAULT_ROSTER_PORT));
        prop_assert_eq!(entry.name, capitalized(&words));
    }

    /// A line with a single token never produces an entry.
    #[test]
    fn prop_single_token_skipped(host in arb_host(), port in prop::option::of(any::<u16>())) {
        let line = port.map_or_else(|| host.clone(), |p| format!("  {host}:{p} "));
        prop_assert!(parse_line(&line).is_none());
    }

    /// After a reload, a successful fetch leaves exactly the parsed roster
    /// as the group's children, whatever the previous fetch produced.
    #[test]
    fn prop_reload_leaves_no_residue(first in arb_body(), second in arb_body()) {
        let mut book = AddressBook::new();
        let group = book.insert_group(ConnectionGroup::new_dynamic(
            "Grid".into(),
            "http://grid.example/roster".into(),
        ));

        let request = book.begin_load(group).expect("request");
        book.complete_load(RosterResponse {
            group_id: group,
            generation: request.generation,
            result: Ok(first),
        });

        let request = book.reload_group(group).expect("request");
        let outcome = book.complete_load(RosterResponse {
            group_id: group,
            generation: request.generation,
            result: Ok(second.clone()),
        });

        let expected = parse_roster(&second);
        prop_assert_eq!(outcome, LoadOutcome::Merged { added: expected.len() });

        let mut expected_names: Vec<String> = expected.into_iter().map(|e| e.name).collect();
        expected_names.sort();
        let node = book.tree().find_node(group).expect("group node");
        let names: Vec<String> = node.children.iter().map(|c| c.label.clone()).collect();
        prop_assert_eq!(names, expected_names);
        prop_assert_eq!(book.store().connections().count(), node.child_count());
        prop_assert!(book.validate());
    }

    /// A response from an older generation never changes the group.
    #[test]
    fn prop_stale_response_ignored(old in arb_body(), new in arb_body()) {
        let mut book = AddressBook::new();
        let group = book.insert_group(ConnectionGroup::new_dynamic(
            "Grid".into(),
            "https://grid.example/roster".into(),
        ));

        let stale = book.begin_load(group).expect("request");
        let fresh = book.reload_group(group).expect("request");
        book.complete_load(RosterResponse {
            group_id: group,
            generation: fresh.generation,
            result: Ok(new.clone()),
        });
        let before = book.tree().child_count(group);

        let outcome = book.complete_load(RosterResponse {
            group_id: group,
            generation: stale.generation,
            result: Ok(old),
        });
        prop_assert_eq!(outcome, LoadOutcome::Stale);
        prop_assert_eq!(book.tree().child_count(group), before);
        prop_assert_eq!(before, parse_roster(&new).len());
    }
}

#[test]
fn test_documented_roster_lines() {
    let entry = parse_line("host.example.com:9001 bob smith").expect("entry");
    assert_eq!(entry.host, "host.example.com");
    assert_eq!(entry.port, 9001);
    assert_eq!(entry.name, "Bob smith");

    assert!(parse_line("10.0.0.5").is_none());
}
