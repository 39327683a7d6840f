//! Property-based tests for the session tab model

use std::cell::Cell;
use std::net::IpAddr;
use std::rc::Rc;

use proptest::prelude::*;
use simconsole_core::{
    Connection, ConnectionGroup, OpenOutcome, PaneFactory, SessionPane, TabManager,
};

struct CountingPane {
    logged_in: bool,
    live: Rc<Cell<i32>>,
}

impl SessionPane for CountingPane {
    fn login(&mut self) {
        self.logged_in = true;
        self.live.set(self.live.get() + 1);
    }
    fn close_connection(&mut self) {
        if self.logged_in {
            self.live.set(self.live.get() - 1);
        }
        self.logged_in = false;
    }
    fn is_logged_in(&self) -> bool {
        self.logged_in
    }
    fn clear_scrollback(&mut self) {}
    fn copy_selection(&mut self) {}
    fn restart_server(&mut self) {}
}

fn factory(live: &Rc<Cell<i32>>) -> impl PaneFactory {
    let live = Rc::clone(live);
    move |_: &Connection, _: Option<IpAddr>| -> Box<dyn SessionPane> {
        Box::new(CountingPane {
            logged_in: false,
            live: Rc::clone(&live),
        })
    }
}

#[derive(Debug, Clone)]
enum TabOp {
    Open { connection: usize, grouped: bool },
    Close(usize),
    CloseTab(usize),
}

fn arb_op() -> impl Strategy<Value = TabOp> {
    prop_oneof![
        3 => (0usize..6, any::<bool>()).prop_map(|(connection, grouped)| TabOp::Open { connection, grouped }),
        1 => (0usize..6).prop_map(TabOp::Close),
        1 => (0usize..4).prop_map(TabOp::CloseTab),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Opening an already logged-in connection leaves the tab count unchanged,
    /// at most one pane exists per connection, and no sub-container is empty.
    #[test]
    fn prop_tabs_consistent(ops in prop::collection::vec(arb_op(), 0..30)) {
        let live = Rc::new(Cell::new(0));
        let mut factory = factory(&live);
        let mut tabs = TabManager::new();
        let group = ConnectionGroup::new("Grid".into());
        let connections: Vec<Connection> = (0..6)
            .map(|i| Connection::new(format!("C{i}"), "sim".into(), 9000))
            .collect();

        for op in ops {
            match op {
                TabOp::Open { connection, grouped } => {
                    let connection = &connections[connection];
                    let already = tabs.pane(connection.id).is_some();
                    let before = tabs.tab_count();
                    let outcome = tabs.open(grouped.then_some(&group), connection, None, &mut factory);
                    if already {
                        prop_assert_eq!(outcome, OpenOutcome::AlreadyOpen);
                        prop_assert_eq!(tabs.tab_count(), before);
                    } else {
                        prop_assert_eq!(outcome, OpenOutcome::Opened { replaced: false });
                    }
                }
                TabOp::Close(connection) => {
                    let id = connections[connection].id;
                    let was_open = tabs.pane(id).is_some();
                    prop_assert_eq!(tabs.close(id), was_open);
                }
                TabOp::CloseTab(index) => {
                    let exists = index < tabs.tab_count();
                    prop_assert_eq!(tabs.close_tab(index), exists);
                }
            }

            let open = connections.iter().filter(|c| tabs.pane(c.id).is_some()).count();
            prop_assert_eq!(tabs.pane_count(), open);
            prop_assert_eq!(i32::try_from(open).unwrap_or(i32::MAX), live.get());
            prop_assert!(tabs.tab_count() <= tabs.pane_count());
            prop_assert_eq!(tabs.current_index().is_some(), tabs.tab_count() > 0);
        }
    }
}
