//! Console manager tying the address book to its state file and tabs
//!
//! This module provides the `ConsoleManager`, the single owner of the
//! address book, the session tabs and the display preferences. Every
//! mutation that changes persisted data writes the state file back.

use futures::future::join_all;
use uuid::Uuid;

use crate::book::AddressBook;
use crate::config::{ConfigManager, PersistedState, UiSettings};
use crate::dialogs::{ConnectionDraft, DialogProvider, GroupDraft};
use crate::error::ConfigResult;
use crate::models::Entity;
use crate::roster::{LoadOutcome, RosterFetcher, RosterRequest, RosterResponse};
use crate::session::{OpenOutcome, PaneFactory, TabManager};

/// Result of an edit dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The user cancelled the dialog
    Cancelled,
    /// The record is missing or read-only
    Refused,
    /// The edit was applied and saved
    Saved {
        /// Roster load to dispatch, if the edit invalidated the group
        reload: Option<RosterRequest>,
    },
}

/// Owner of the address book, its persistence and the open sessions
#[derive(Debug)]
pub struct ConsoleManager {
    book: AddressBook,
    tabs: TabManager,
    config: ConfigManager,
    ui: UiSettings,
}

impl ConsoleManager {
    /// Restores the address book and preferences from `config`
    ///
    /// Never fails; an unusable state file yields an empty book. Call
    /// [`Self::start_loads`] afterwards to fetch the dynamic groups.
    #[must_use]
    pub fn open(config: ConfigManager) -> Self {
        let (book, ui) = config.load_state().restore();
        tracing::debug!(records = book.store().len(), "Restored address book");
        Self {
            book,
            tabs: TabManager::new(),
            config,
            ui,
        }
    }

    /// Returns the address book
    #[must_use]
    pub const fn book(&self) -> &AddressBook {
        &self.book
    }

    /// Returns the session tabs
    #[must_use]
    pub const fn tabs(&self) -> &TabManager {
        &self.tabs
    }

    /// Returns the session tabs, mutably
    pub fn tabs_mut(&mut self) -> &mut TabManager {
        &mut self.tabs
    }

    /// Returns the display preferences
    #[must_use]
    pub const fn ui(&self) -> &UiSettings {
        &self.ui
    }

    /// Returns the configuration manager
    #[must_use]
    pub const fn config(&self) -> &ConfigManager {
        &self.config
    }

    /// Writes the whole state document
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn persist(&self) -> ConfigResult<()> {
        self.config
            .save_state(&PersistedState::capture(&self.book, &self.ui))
    }

    // ========== Preferences ==========

    /// Updates the console display preferences
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn set_preferences(&mut self, black_on_white: bool, system_font: bool) -> ConfigResult<()> {
        self.ui.black_on_white = black_on_white;
        self.ui.system_font = system_font;
        self.persist()
    }

    /// Stores the front-end window blobs, typically on shutdown
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn save_window_state(
        &mut self,
        geometry: Vec<u8>,
        state: Vec<u8>,
        split: Option<Vec<u8>>,
    ) -> ConfigResult<()> {
        self.ui.window_geometry = geometry;
        self.ui.window_state = state;
        self.ui.split = split;
        self.persist()
    }

    // ========== Editing ==========

    /// Creates a "New group" at the root for in-place renaming
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn new_group(&mut self) -> ConfigResult<Uuid> {
        let id = self.book.create_group();
        self.persist()?;
        Ok(id)
    }

    /// Creates a group from a filled-in form
    ///
    /// Returns the group id and, for a dynamic group, its first roster load.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn add_group(&mut self, draft: &GroupDraft) -> ConfigResult<(Uuid, Option<RosterRequest>)> {
        let id = self.book.create_group_from(draft);
        self.persist()?;
        Ok((id, self.book.begin_load(id)))
    }

    /// Asks for a new connection and adds it under `parent`
    ///
    /// Returns `None` when the dialog was cancelled or `parent` cannot hold
    /// user connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn new_connection(
        &mut self,
        parent: Option<Uuid>,
        dialogs: &mut dyn DialogProvider,
    ) -> ConfigResult<Option<Uuid>> {
        if parent.is_some_and(|id| self.book.group(id).is_none_or(|g| g.dynamic)) {
            return Ok(None);
        }
        let Some(draft) = dialogs.edit_connection(ConnectionDraft::default(), true) else {
            return Ok(None);
        };
        self.add_connection(parent, draft)
    }

    /// Adds a connection from a filled-in form
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn add_connection(
        &mut self,
        parent: Option<Uuid>,
        draft: ConnectionDraft,
    ) -> ConfigResult<Option<Uuid>> {
        let Some(id) = self.book.add_connection(parent, draft) else {
            return Ok(None);
        };
        self.persist()?;
        Ok(Some(id))
    }

    /// Opens the edit dialog for a connection or a group
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn edit(&mut self, id: Uuid, dialogs: &mut dyn DialogProvider) -> ConfigResult<EditOutcome> {
        match self.book.store().get(id) {
            Some(Entity::Connection(connection)) => {
                if connection.dynamic {
                    return Ok(EditOutcome::Refused);
                }
                let Some(draft) = dialogs.edit_connection(ConnectionDraft::from(connection), false)
                else {
                    return Ok(EditOutcome::Cancelled);
                };
                self.apply_connection_edit(id, &draft)
            }
            Some(Entity::Group(group)) => {
                let Some(draft) = dialogs.edit_group(GroupDraft::from(group)) else {
                    return Ok(EditOutcome::Cancelled);
                };
                self.apply_group_edit(id, &draft)
            }
            None => Ok(EditOutcome::Refused),
        }
    }

    /// Applies an edited connection form
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn apply_connection_edit(&mut self, id: Uuid, draft: &ConnectionDraft) -> ConfigResult<EditOutcome> {
        if !self.book.update_connection(id, draft) {
            return Ok(EditOutcome::Refused);
        }
        self.persist()?;
        Ok(EditOutcome::Saved { reload: None })
    }

    /// Applies an edited group form, reloading the group when its roster
    /// settings changed
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn apply_group_edit(&mut self, id: Uuid, draft: &GroupDraft) -> ConfigResult<EditOutcome> {
        let Some(update) = self.book.update_group(id, draft) else {
            return Ok(EditOutcome::Refused);
        };
        let reload = if update.reload_required {
            self.book.reload_group(id)
        } else {
            None
        };
        self.persist()?;
        Ok(EditOutcome::Saved { reload })
    }

    /// Asks for confirmation, then deletes a user connection or an empty group
    ///
    /// Returns false when refused or not confirmed.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn delete(&mut self, id: Uuid, dialogs: &mut dyn DialogProvider) -> ConfigResult<bool> {
        let (title, message) = match self.book.store().get(id) {
            Some(Entity::Connection(c)) if !c.dynamic => {
                ("Delete connection", "Really delete this connection?")
            }
            Some(Entity::Group(_)) if self.book.tree().child_count(id) == 0 => {
                ("Delete group", "Really delete this group?")
            }
            _ => return Ok(false),
        };
        if !dialogs.confirm(title, message) {
            return Ok(false);
        }
        self.remove(id)
    }

    /// Deletes a user connection or an empty group without asking
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn remove(&mut self, id: Uuid) -> ConfigResult<bool> {
        let removed = match self.book.store().get(id) {
            Some(Entity::Connection(_)) => self.book.delete_connection(id),
            Some(Entity::Group(_)) => self.book.delete_group(id),
            None => false,
        };
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Renames a group or a user connection
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn rename(&mut self, id: Uuid, name: &str) -> ConfigResult<bool> {
        if !self.book.rename(id, name) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Expands or collapses a group
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn set_expanded(&mut self, id: Uuid, expanded: bool) -> ConfigResult<bool> {
        if !self.book.set_expanded(id, expanded) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    // ========== Sessions ==========

    /// Opens sessions for a connection, or for every connection of a group
    pub fn connect(&mut self, id: Uuid, factory: &mut dyn PaneFactory) -> Vec<OpenOutcome> {
        let mut outcomes = Vec::new();
        for target in self.book.connect_targets(id) {
            let Some(connection) = self.book.connection(target.connection_id) else {
                continue;
            };
            let group = target.group_id.and_then(|g| self.book.group(g));
            outcomes.push(self.tabs.open(group, connection, target.dns, factory));
        }
        outcomes
    }

    /// Closes the session of a connection
    pub fn disconnect(&mut self, connection_id: Uuid) -> bool {
        self.tabs.close(connection_id)
    }

    // ========== Dynamic groups ==========

    /// Returns the ids of the dynamic groups
    #[must_use]
    pub fn dynamic_groups(&self) -> Vec<Uuid> {
        self.book.dynamic_group_ids()
    }

    /// Starts a roster load for every dynamic group
    pub fn start_loads(&mut self) -> Vec<RosterRequest> {
        self.dynamic_groups()
            .into_iter()
            .filter_map(|id| self.book.begin_load(id))
            .collect()
    }

    /// Clears a dynamic group and starts a fresh load
    pub fn refresh_group(&mut self, id: Uuid) -> Option<RosterRequest> {
        self.book.reload_group(id)
    }

    /// Merges a completed roster fetch
    ///
    /// Dynamic children are never persisted, so the state file is not
    /// rewritten.
    pub fn apply_roster(&mut self, response: RosterResponse) -> LoadOutcome {
        self.book.complete_load(response)
    }

    /// Fetches every dynamic group concurrently and merges the results
    pub async fn refresh_all(&mut self, fetcher: &dyn RosterFetcher) -> Vec<LoadOutcome> {
        let requests = self.start_loads();
        let responses = join_all(requests.into_iter().map(|r| r.execute(fetcher))).await;
        responses
            .into_iter()
            .map(|response| self.apply_roster(response))
            .collect()
    }
}
