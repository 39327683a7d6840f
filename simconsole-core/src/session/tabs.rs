//! Tab model for live session panes
//!
//! The top level holds either single panes or group sub-containers; a
//! sub-container holds the panes opened for one group. At most one pane
//! exists per connection id across the whole model.

use std::net::IpAddr;

use uuid::Uuid;

use super::pane::{PaneFactory, SessionPane};
use crate::models::{Connection, ConnectionGroup};

/// A pane tab bound to one connection
pub struct PaneTab {
    /// Connection the pane is bound to
    pub connection_id: Uuid,
    /// Tab title
    pub title: String,
    pane: Box<dyn SessionPane>,
}

impl PaneTab {
    /// Returns the pane
    #[must_use]
    pub fn pane(&self) -> &dyn SessionPane {
        self.pane.as_ref()
    }

    /// Returns the mutable pane
    pub fn pane_mut(&mut self) -> &mut dyn SessionPane {
        self.pane.as_mut()
    }
}

impl std::fmt::Debug for PaneTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaneTab")
            .field("connection_id", &self.connection_id)
            .field("title", &self.title)
            .field("logged_in", &self.pane.is_logged_in())
            .finish()
    }
}

/// A nested tab host for the panes of one group
#[derive(Debug)]
pub struct GroupContainer {
    /// Group this container stands for
    pub group_id: Uuid,
    /// Tab title
    pub title: String,
    tabs: Vec<PaneTab>,
    current: Option<usize>,
}

impl GroupContainer {
    /// Returns the panes in tab order
    #[must_use]
    pub fn tabs(&self) -> &[PaneTab] {
        &self.tabs
    }

    /// Returns the index of the active pane
    #[must_use]
    pub const fn current(&self) -> Option<usize> {
        self.current
    }
}

/// A top-level tab
#[derive(Debug)]
pub enum TabEntry {
    /// A pane opened outside any group
    Pane(PaneTab),
    /// A group sub-container
    Group(GroupContainer),
}

impl TabEntry {
    /// Returns the tab title
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Pane(tab) => &tab.title,
            Self::Group(container) => &container.title,
        }
    }
}

/// Where an id lives in the tab model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabLocation {
    /// A top-level pane
    Root(usize),
    /// A group sub-container at this top-level index
    Container(usize),
    /// A pane inside the sub-container at `container`
    Nested {
        /// Top-level index of the sub-container
        container: usize,
        /// Index of the pane within the sub-container
        index: usize,
    },
}

/// Result of asking for a session to be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A logged-in pane already exists; nothing changed
    AlreadyOpen,
    /// A new pane was created and its login started
    Opened {
        /// A stale (not logged in) pane was dropped first
        replaced: bool,
    },
}

/// Top-level tab container for live sessions
#[derive(Debug, Default)]
pub struct TabManager {
    tabs: Vec<TabEntry>,
    current: Option<usize>,
}

impl TabManager {
    /// Creates an empty tab manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the top-level tabs
    #[must_use]
    pub fn tabs(&self) -> &[TabEntry] {
        &self.tabs
    }

    /// Returns the number of top-level tabs
    #[must_use]
    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    /// Returns the number of panes, nested ones included
    #[must_use]
    pub fn pane_count(&self) -> usize {
        self.tabs
            .iter()
            .map(|entry| match entry {
                TabEntry::Pane(_) => 1,
                TabEntry::Group(container) => container.tabs.len(),
            })
            .sum()
    }

    /// Returns the index of the active top-level tab
    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Finds a pane (by connection id) or a sub-container (by group id)
    #[must_use]
    pub fn find(&self, id: Uuid) -> Option<TabLocation> {
        for (index, entry) in self.tabs.iter().enumerate() {
            match entry {
                TabEntry::Pane(tab) if tab.connection_id == id => {
                    return Some(TabLocation::Root(index));
                }
                TabEntry::Pane(_) => {}
                TabEntry::Group(container) => {
                    if container.group_id == id {
                        return Some(TabLocation::Container(index));
                    }
                    if let Some(nested) = container.tabs.iter().position(|t| t.connection_id == id) {
                        return Some(TabLocation::Nested {
                            container: index,
                            index: nested,
                        });
                    }
                }
            }
        }
        None
    }

    /// Returns the pane open for a connection
    #[must_use]
    pub fn pane(&self, connection_id: Uuid) -> Option<&PaneTab> {
        match self.find(connection_id)? {
            TabLocation::Root(index) => match &self.tabs[index] {
                TabEntry::Pane(tab) => Some(tab),
                TabEntry::Group(_) => None,
            },
            TabLocation::Nested { container, index } => match &self.tabs[container] {
                TabEntry::Group(c) => c.tabs.get(index),
                TabEntry::Pane(_) => None,
            },
            TabLocation::Container(_) => None,
        }
    }

    /// Opens a session pane for `connection`
    ///
    /// A logged-in pane for the same connection makes this a no-op; a stale
    /// one is dropped and replaced. With a `group`, the pane goes into that
    /// group's sub-container, which is created on first use.
    pub fn open(
        &mut self,
        group: Option<&ConnectionGroup>,
        connection: &Connection,
        dns: Option<IpAddr>,
        factory: &mut dyn PaneFactory,
    ) -> OpenOutcome {
        let mut replaced = false;
        if let Some(existing) = self.pane(connection.id) {
            if existing.pane().is_logged_in() {
                tracing::debug!(connection = %connection.id, "Session already open");
                return OpenOutcome::AlreadyOpen;
            }
            let keep_container = group.map(|g| g.id);
            self.remove_pane(connection.id, keep_container);
            replaced = true;
        }

        let mut tab = PaneTab {
            connection_id: connection.id,
            title: connection.name.clone(),
            pane: factory.create_pane(connection, dns),
        };
        tab.pane.login();

        match group {
            Some(group) => {
                let index = match self.find(group.id) {
                    Some(TabLocation::Container(index)) => index,
                    _ => {
                        self.tabs.push(TabEntry::Group(GroupContainer {
                            group_id: group.id,
                            title: group.name.clone(),
                            tabs: Vec::new(),
                            current: None,
                        }));
                        self.tabs.len() - 1
                    }
                };
                if let TabEntry::Group(container) = &mut self.tabs[index] {
                    container.tabs.push(tab);
                    container.current = Some(container.tabs.len() - 1);
                }
                self.current = Some(index);
            }
            None => {
                self.tabs.push(TabEntry::Pane(tab));
                self.current = Some(self.tabs.len() - 1);
            }
        }

        tracing::debug!(connection = %connection.id, replaced, "Opened session pane");
        OpenOutcome::Opened { replaced }
    }

    /// Closes the session for a connection
    ///
    /// The live session is terminated, the pane dropped, and an emptied
    /// group sub-container removed. Returns false if no pane was open.
    pub fn close(&mut self, connection_id: Uuid) -> bool {
        match self.remove_pane(connection_id, None) {
            Some(mut tab) => {
                tab.pane.close_connection();
                true
            }
            None => false,
        }
    }

    /// Closes the top-level tab at `index`, with every pane it holds
    pub fn close_tab(&mut self, index: usize) -> bool {
        if index >= self.tabs.len() {
            return false;
        }
        match self.tabs.remove(index) {
            TabEntry::Pane(mut tab) => tab.pane.close_connection(),
            TabEntry::Group(container) => {
                for mut tab in container.tabs {
                    tab.pane.close_connection();
                }
            }
        }
        self.current = shift_after_removal(self.current, index, self.tabs.len());
        true
    }

    /// Makes the top-level tab at `index` active
    pub fn set_current(&mut self, index: usize) -> bool {
        if index < self.tabs.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    /// Returns the connection id of the active pane
    ///
    /// Descends into the active sub-container.
    #[must_use]
    pub fn current_connection_id(&self) -> Option<Uuid> {
        match self.tabs.get(self.current?)? {
            TabEntry::Pane(tab) => Some(tab.connection_id),
            TabEntry::Group(container) => container
                .current
                .and_then(|i| container.tabs.get(i))
                .map(|tab| tab.connection_id),
        }
    }

    /// Returns the active pane
    #[must_use]
    pub fn current_pane(&self) -> Option<&dyn SessionPane> {
        self.pane(self.current_connection_id()?).map(PaneTab::pane)
    }

    /// Returns the active pane, mutably
    pub fn current_pane_mut(&mut self) -> Option<&mut dyn SessionPane> {
        let tab = match self.tabs.get_mut(self.current?)? {
            TabEntry::Pane(tab) => tab,
            TabEntry::Group(container) => container.tabs.get_mut(container.current?)?,
        };
        Some(tab.pane.as_mut())
    }

    /// Closes the active pane
    pub fn disconnect_current(&mut self) -> bool {
        self.current_connection_id()
            .is_some_and(|id| self.close(id))
    }

    /// Clears the scrollback of the active pane
    pub fn clear_scrollback(&mut self) -> bool {
        self.with_current(|pane| pane.clear_scrollback())
    }

    /// Copies the selection of the active pane
    pub fn copy_selection(&mut self) -> bool {
        self.with_current(|pane| pane.copy_selection())
    }

    /// Restarts the server behind the active pane
    pub fn restart_server(&mut self) -> bool {
        self.with_current(|pane| pane.restart_server())
    }

    fn with_current(&mut self, action: impl FnOnce(&mut dyn SessionPane)) -> bool {
        match self.current_pane_mut() {
            Some(pane) => {
                action(pane);
                true
            }
            None => false,
        }
    }

    /// Detaches a pane, dropping its sub-container if that becomes empty
    /// (unless it belongs to `keep_container`)
    fn remove_pane(&mut self, connection_id: Uuid, keep_container: Option<Uuid>) -> Option<PaneTab> {
        match self.find(connection_id)? {
            TabLocation::Root(index) => {
                let TabEntry::Pane(tab) = self.tabs.remove(index) else {
                    return None;
                };
                self.current = shift_after_removal(self.current, index, self.tabs.len());
                Some(tab)
            }
            TabLocation::Nested { container, index } => {
                let TabEntry::Group(group) = &mut self.tabs[container] else {
                    return None;
                };
                let tab = group.tabs.remove(index);
                group.current = shift_after_removal(group.current, index, group.tabs.len());

                if group.tabs.is_empty() && keep_container != Some(group.group_id) {
                    self.tabs.remove(container);
                    self.current = shift_after_removal(self.current, container, self.tabs.len());
                }
                Some(tab)
            }
            TabLocation::Container(_) => None,
        }
    }
}

/// Adjusts an active index after removing the element at `removed`
fn shift_after_removal(current: Option<usize>, removed: usize, remaining: usize) -> Option<usize> {
    let current = current?;
    if remaining == 0 {
        return None;
    }
    if current > removed {
        Some(current - 1)
    } else if current == removed {
        Some(removed.min(remaining - 1))
    } else {
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct PaneLog {
        logins: usize,
        closes: usize,
        restarts: usize,
    }

    struct FakePane {
        log: Rc<RefCell<PaneLog>>,
        logged_in: bool,
        succeed: bool,
    }

    impl SessionPane for FakePane {
        fn login(&mut self) {
            self.log.borrow_mut().logins += 1;
            self.logged_in = self.succeed;
        }
        fn close_connection(&mut self) {
            self.log.borrow_mut().closes += 1;
            self.logged_in = false;
        }
        fn is_logged_in(&self) -> bool {
            self.logged_in
        }
        fn clear_scrollback(&mut self) {}
        fn copy_selection(&mut self) {}
        fn restart_server(&mut self) {
            self.log.borrow_mut().restarts += 1;
        }
    }

    fn factory(log: &Rc<RefCell<PaneLog>>, succeed: bool) -> impl PaneFactory {
        let log = Rc::clone(log);
        move |_: &Connection, _: Option<IpAddr>| -> Box<dyn SessionPane> {
            Box::new(FakePane {
                log: Rc::clone(&log),
                logged_in: false,
                succeed,
            })
        }
    }

    fn conn(name: &str) -> Connection {
        Connection::new(name.into(), "sim".into(), 9000)
    }

    #[test]
    fn test_open_logged_in_is_noop() {
        let log = Rc::new(RefCell::new(PaneLog::default()));
        let mut tabs = TabManager::new();
        let c = conn("A");

        assert_eq!(tabs.open(None, &c, None, &mut factory(&log, true)), OpenOutcome::Opened { replaced: false });
        let before = tabs.tab_count();
        assert_eq!(tabs.open(None, &c, None, &mut factory(&log, true)), OpenOutcome::AlreadyOpen);
        assert_eq!(tabs.tab_count(), before);
        assert_eq!(log.borrow().logins, 1);
    }

    #[test]
    fn test_open_replaces_stale_pane() {
        let log = Rc::new(RefCell::new(PaneLog::default()));
        let mut tabs = TabManager::new();
        let c = conn("A");

        tabs.open(None, &c, None, &mut factory(&log, false));
        assert_eq!(tabs.open(None, &c, None, &mut factory(&log, true)), OpenOutcome::Opened { replaced: true });
        assert_eq!(tabs.pane_count(), 1);
        assert!(tabs.pane(c.id).is_some_and(|t| t.pane().is_logged_in()));
    }

    #[test]
    fn test_group_panes_share_container() {
        let log = Rc::new(RefCell::new(PaneLog::default()));
        let mut tabs = TabManager::new();
        let group = ConnectionGroup::new("Grid".into());
        let a = conn("A");
        let b = conn("B");

        tabs.open(Some(&group), &a, None, &mut factory(&log, true));
        tabs.open(Some(&group), &b, None, &mut factory(&log, true));
        tabs.open(None, &conn("Solo"), None, &mut factory(&log, true));

        assert_eq!(tabs.tab_count(), 2);
        assert_eq!(tabs.pane_count(), 3);
        assert_eq!(tabs.find(group.id), Some(TabLocation::Container(0)));
        assert_eq!(tabs.find(b.id), Some(TabLocation::Nested { container: 0, index: 1 }));
        assert_eq!(tabs.tabs()[0].title(), "Grid");
    }

    #[test]
    fn test_close_removes_empty_container() {
        let log = Rc::new(RefCell::new(PaneLog::default()));
        let mut tabs = TabManager::new();
        let group = ConnectionGroup::new("Grid".into());
        let a = conn("A");
        let b = conn("B");
        tabs.open(Some(&group), &a, None, &mut factory(&log, true));
        tabs.open(Some(&group), &b, None, &mut factory(&log, true));

        assert!(tabs.close(a.id));
        assert_eq!(tabs.tab_count(), 1);
        assert!(tabs.close(b.id));
        assert_eq!(tabs.tab_count(), 0);
        assert_eq!(log.borrow().closes, 2);
        assert!(!tabs.close(a.id));
        assert_eq!(tabs.current_index(), None);
    }

    #[test]
    fn test_close_tab_closes_every_nested_pane() {
        let log = Rc::new(RefCell::new(PaneLog::default()));
        let mut tabs = TabManager::new();
        let group = ConnectionGroup::new("Grid".into());
        tabs.open(Some(&group), &conn("A"), None, &mut factory(&log, true));
        tabs.open(Some(&group), &conn("B"), None, &mut factory(&log, true));

        assert!(tabs.close_tab(0));
        assert_eq!(log.borrow().closes, 2);
        assert_eq!(tabs.pane_count(), 0);
        assert!(!tabs.close_tab(0));
    }

    #[test]
    fn test_current_pane_actions() {
        let log = Rc::new(RefCell::new(PaneLog::default()));
        let mut tabs = TabManager::new();
        assert!(!tabs.restart_server());

        let group = ConnectionGroup::new("Grid".into());
        let a = conn("A");
        let b = conn("B");
        tabs.open(None, &a, None, &mut factory(&log, true));
        tabs.open(Some(&group), &b, None, &mut factory(&log, true));

        assert_eq!(tabs.current_connection_id(), Some(b.id));
        assert!(tabs.restart_server());
        assert_eq!(log.borrow().restarts, 1);

        assert!(tabs.disconnect_current());
        assert_eq!(tabs.tab_count(), 1);
        assert_eq!(tabs.current_connection_id(), Some(a.id));
    }
}
