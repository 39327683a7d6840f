//! Address book of connections and groups
//!
//! The `AddressBook` owns the entity store and the hierarchy tree and keeps
//! the two in step. It enforces the editing rules of the console client:
//! dynamic records are read-only, non-empty groups cannot be deleted and
//! connections can only be added to static groups. Refused operations are
//! no-ops reported through the return value.
//!
//! It also tracks the roster load state of every dynamic group and merges
//! fetch results, dropping responses that a newer load has superseded.

use std::collections::HashMap;
use std::net::IpAddr;

use chrono::Utc;
use secrecy::SecretString;
use uuid::Uuid;

use crate::dialogs::{ConnectionDraft, GroupDraft};
use crate::models::{parse_dns, Connection, ConnectionGroup, Entity, NEW_GROUP_NAME};
use crate::roster::{
    parse_roster, source_url, LoadOutcome, RosterRequest, RosterResponse, RosterState,
};
use crate::store::EntityStore;
use crate::tree::{HierarchyTree, NodeKind};

/// Actions a front-end may offer for a tree selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemAction {
    /// Open a session to the selected connection
    Connect,
    /// Open sessions to every connection of the selected group
    ConnectGroup,
    /// Create a connection (at root, or inside the selected group)
    Add,
    /// Create a group
    AddGroup,
    /// Edit the selected record
    Edit,
    /// Delete the selected record
    Delete,
    /// Re-fetch the roster of the selected dynamic group
    Refresh,
}

/// A session the tab manager should open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenRequest {
    /// Connection to open
    pub connection_id: Uuid,
    /// Group sub-container to host the pane, `None` for the root container
    pub group_id: Option<Uuid>,
    /// DNS override for the session
    pub dns: Option<IpAddr>,
}

/// Result of a successful group edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupUpdate {
    /// The group's roster must be re-fetched
    pub reload_required: bool,
}

#[derive(Debug, Clone, Default)]
struct RosterSlot {
    generation: u64,
    state: RosterState,
}

/// In-memory address book
#[derive(Debug, Default)]
pub struct AddressBook {
    store: EntityStore,
    tree: HierarchyTree,
    rosters: HashMap<Uuid, RosterSlot>,
}

impl AddressBook {
    /// Creates an empty address book
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entity store
    #[must_use]
    pub const fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Returns the hierarchy tree
    #[must_use]
    pub const fn tree(&self) -> &HierarchyTree {
        &self.tree
    }

    /// Gets a connection by id
    #[must_use]
    pub fn connection(&self, id: Uuid) -> Option<&Connection> {
        self.store.connection(id)
    }

    /// Gets a group by id
    #[must_use]
    pub fn group(&self, id: Uuid) -> Option<&ConnectionGroup> {
        self.store.group(id)
    }

    /// Returns the group whose tree node holds `connection_id`
    #[must_use]
    pub fn parent_group(&self, connection_id: Uuid) -> Option<&ConnectionGroup> {
        self.tree
            .parent_of(connection_id)
            .and_then(|id| self.store.group(id))
    }

    /// Returns the ids of every dynamic group, in display order
    #[must_use]
    pub fn dynamic_group_ids(&self) -> Vec<Uuid> {
        self.tree
            .roots()
            .iter()
            .filter(|n| n.kind == NodeKind::Group)
            .filter(|n| self.store.group(n.id).is_some_and(|g| g.dynamic))
            .map(|n| n.id)
            .collect()
    }

    /// Finds a record by exact name or by id string
    #[must_use]
    pub fn find_by_name_or_id(&self, name_or_id: &str) -> Vec<&Entity> {
        if let Ok(id) = Uuid::parse_str(name_or_id) {
            return self.store.get(id).into_iter().collect();
        }
        self.tree
            .walk()
            .filter(|n| n.label == name_or_id)
            .filter_map(|n| self.store.get(n.id))
            .collect()
    }

    // ========== Groups ==========

    /// Adds a group record and its tree node
    pub fn insert_group(&mut self, group: ConnectionGroup) -> Uuid {
        let id = group.id;
        self.tree.insert_group(&group);
        self.store.put(group);
        tracing::debug!(group = %id, "Inserted group");
        id
    }

    /// Creates a new static group named "New group"
    ///
    /// The front-end is expected to start an in-place rename on the returned
    /// node.
    pub fn create_group(&mut self) -> Uuid {
        self.insert_group(ConnectionGroup::new(NEW_GROUP_NAME.to_string()))
    }

    /// Creates a group from a filled-in form
    pub fn create_group_from(&mut self, draft: &GroupDraft) -> Uuid {
        let name = if draft.name.trim().is_empty() {
            NEW_GROUP_NAME.to_string()
        } else {
            draft.name.clone()
        };
        let mut group = ConnectionGroup::new(name);
        apply_group_draft(&mut group, draft);
        self.insert_group(group)
    }

    /// Applies an edited group form
    ///
    /// The name is left alone. Returns `None` if the group does not exist, or
    /// if the edit would turn a group holding user connections into a
    /// dynamic one.
    pub fn update_group(&mut self, id: Uuid, draft: &GroupDraft) -> Option<GroupUpdate> {
        let has_children = self.tree.child_count(id) > 0;
        let group = self.store.group_mut(id)?;

        if draft.dynamic && !group.dynamic && has_children {
            tracing::debug!(group = %id, "Refusing to make a non-empty static group dynamic");
            return None;
        }

        let reload_required = draft.dynamic != group.dynamic
            || (group.dynamic && draft.source.trim() != group.source.trim());

        apply_group_draft(group, draft);
        Some(GroupUpdate { reload_required })
    }

    /// Deletes an empty group
    ///
    /// Returns false if the group does not exist or still has children.
    pub fn delete_group(&mut self, id: Uuid) -> bool {
        if self.store.group(id).is_none() || self.tree.child_count(id) > 0 {
            return false;
        }
        self.tree.remove_node(id);
        self.store.remove(id);
        self.rosters.remove(&id);
        tracing::debug!(group = %id, "Deleted group");
        true
    }

    /// Sets the expanded flag of a group
    pub fn set_expanded(&mut self, id: Uuid, expanded: bool) -> bool {
        let Some(group) = self.store.group_mut(id) else {
            return false;
        };
        group.expanded = expanded;
        self.tree.set_expanded(id, expanded)
    }

    // ========== Connections ==========

    /// Adds a connection record and its tree node under `parent`
    ///
    /// Returns `None` (storing nothing) if the parent node is not a group.
    pub fn insert_connection(&mut self, parent: Option<Uuid>, mut connection: Connection) -> Option<Uuid> {
        let id = connection.id;
        connection.group_id = parent;
        self.tree.insert_connection(parent, &connection)?;
        self.store.put(connection);
        Some(id)
    }

    /// Creates a user connection from a form
    ///
    /// Connections go to the root, or into a static group. Returns `None`
    /// when `parent` is missing or dynamic.
    pub fn add_connection(&mut self, parent: Option<Uuid>, draft: ConnectionDraft) -> Option<Uuid> {
        if let Some(parent_id) = parent {
            let group = self.store.group(parent_id)?;
            if group.dynamic {
                tracing::debug!(group = %parent_id, "Refusing to add a connection to a dynamic group");
                return None;
            }
            self.tree.set_expanded(parent_id, true);
            if let Some(group) = self.store.group_mut(parent_id) {
                group.expanded = true;
            }
        }
        let id = self.insert_connection(parent, draft.into_connection())?;
        tracing::debug!(connection = %id, "Added connection");
        Some(id)
    }

    /// Applies an edited connection form, leaving the name alone
    ///
    /// Returns false for unknown or dynamic connections.
    pub fn update_connection(&mut self, id: Uuid, draft: &ConnectionDraft) -> bool {
        match self.store.connection_mut(id) {
            Some(connection) if !connection.dynamic => {
                draft.apply_to(connection);
                true
            }
            _ => false,
        }
    }

    /// Deletes a user connection
    ///
    /// Returns false for unknown or dynamic connections.
    pub fn delete_connection(&mut self, id: Uuid) -> bool {
        match self.store.connection(id) {
            Some(connection) if !connection.dynamic => {
                self.tree.remove_node(id);
                self.store.remove(id);
                tracing::debug!(connection = %id, "Deleted connection");
                true
            }
            _ => false,
        }
    }

    /// Renames a group or a user connection
    ///
    /// The new label is written back to the record so the next save sees it.
    /// Returns false for unknown ids, dynamic connections and blank names.
    pub fn rename(&mut self, id: Uuid, name: &str) -> bool {
        if name.trim().is_empty() {
            return false;
        }
        match self.store.get_mut(id) {
            Some(Entity::Connection(c)) if c.dynamic => false,
            Some(entity) => {
                entity.set_name(name.to_string());
                self.tree.rename(id, name)
            }
            None => false,
        }
    }

    // ========== Sessions and menus ==========

    /// Resolves what opening `id` means
    ///
    /// A group opens every child connection inside its own sub-container with
    /// the group's DNS override. A single connection opens in the root
    /// container, still using its parent group's DNS override.
    #[must_use]
    pub fn connect_targets(&self, id: Uuid) -> Vec<OpenRequest> {
        if let Some(group) = self.store.group(id) {
            let Some(node) = self.tree.find_node(id) else {
                return Vec::new();
            };
            return node
                .children
                .iter()
                .filter(|child| self.store.connection(child.id).is_some())
                .map(|child| OpenRequest {
                    connection_id: child.id,
                    group_id: Some(group.id),
                    dns: group.dns,
                })
                .collect();
        }

        if self.store.connection(id).is_some() {
            return vec![OpenRequest {
                connection_id: id,
                group_id: None,
                dns: self.parent_group(id).and_then(|g| g.dns),
            }];
        }

        Vec::new()
    }

    /// Lists the actions available for a selection (`None` = empty space)
    #[must_use]
    pub fn available_actions(&self, selection: Option<Uuid>) -> Vec<ItemAction> {
        let Some(id) = selection else {
            return vec![ItemAction::Add, ItemAction::AddGroup];
        };
        let Some(node) = self.tree.find_node(id) else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        match node.kind {
            NodeKind::Connection => {
                let connection = self.store.connection(id);
                if let Some(connection) = connection {
                    actions.push(ItemAction::Connect);
                    if !connection.dynamic {
                        actions.push(ItemAction::Edit);
                    }
                }
                if connection.is_none_or(|c| !c.dynamic) {
                    actions.push(ItemAction::Delete);
                }
            }
            NodeKind::Group => {
                let group = self.store.group(id);
                if group.is_some() && node.child_count() > 0 {
                    actions.push(ItemAction::ConnectGroup);
                }
                if let Some(group) = group {
                    if !group.dynamic {
                        actions.push(ItemAction::Add);
                    }
                    actions.push(ItemAction::Edit);
                    if group.dynamic {
                        actions.push(ItemAction::Refresh);
                    }
                }
                if node.child_count() == 0 {
                    actions.push(ItemAction::Delete);
                }
            }
        }
        actions.push(ItemAction::AddGroup);
        actions
    }

    // ========== Dynamic groups ==========

    /// Returns the roster load state of a group
    #[must_use]
    pub fn roster_state(&self, id: Uuid) -> RosterState {
        self.rosters
            .get(&id)
            .map(|slot| slot.state.clone())
            .unwrap_or_default()
    }

    /// Starts loading a dynamic group's roster
    ///
    /// Returns `None` (leaving the state untouched) if the group does not
    /// exist, is not dynamic, or its source is not an absolute URL.
    pub fn begin_load(&mut self, id: Uuid) -> Option<RosterRequest> {
        let group = self.store.group(id)?;
        if !group.dynamic {
            return None;
        }
        let url = match source_url(&group.source) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(group = %id, "Not loading roster: {e}");
                return None;
            }
        };

        let slot = self.rosters.entry(id).or_default();
        slot.generation += 1;
        slot.state = RosterState::Fetching;
        tracing::debug!(group = %id, generation = slot.generation, "Roster load started");

        Some(RosterRequest {
            group_id: id,
            generation: slot.generation,
            url,
        })
    }

    /// Removes every dynamic connection of a group, returning how many
    pub fn clear_group(&mut self, id: Uuid) -> usize {
        let mut doomed: Vec<Uuid> = self
            .tree
            .find_node(id)
            .map(|node| node.child_ids())
            .unwrap_or_default()
            .into_iter()
            .filter(|child| self.store.connection(*child).is_some_and(|c| c.dynamic))
            .collect();
        doomed.extend(
            self.store
                .connections()
                .filter(|c| c.dynamic && c.group_id == Some(id))
                .map(|c| c.id),
        );
        doomed.sort_unstable();
        doomed.dedup();

        for child in &doomed {
            self.tree.remove_node(*child);
            self.store.remove(*child);
        }
        doomed.len()
    }

    /// Clears a group and starts a fresh roster load
    pub fn reload_group(&mut self, id: Uuid) -> Option<RosterRequest> {
        let cleared = self.clear_group(id);
        tracing::debug!(group = %id, cleared, "Reloading group");
        self.begin_load(id)
    }

    /// Merges a completed roster fetch
    ///
    /// The response is dropped if its group is gone or no longer dynamic, or
    /// if a newer load was issued after it. A transport failure leaves the
    /// group as it is. A successful body replaces the group's dynamic
    /// children with the parsed roster.
    pub fn complete_load(&mut self, response: RosterResponse) -> LoadOutcome {
        let RosterResponse {
            group_id,
            generation,
            result,
        } = response;

        let Some(group) = self.store.group(group_id).filter(|g| g.dynamic).cloned() else {
            tracing::debug!(group = %group_id, "Discarding roster for missing or static group");
            return LoadOutcome::Discarded;
        };
        let Some(slot) = self.rosters.get_mut(&group_id) else {
            return LoadOutcome::Discarded;
        };
        if generation != slot.generation {
            tracing::debug!(group = %group_id, generation, latest = slot.generation, "Dropping stale roster");
            return LoadOutcome::Stale;
        }

        let body = match result {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(group = %group_id, "Roster fetch failed: {e}");
                slot.state = RosterState::FetchFailed {
                    reason: e.to_string(),
                    at: Utc::now(),
                };
                return LoadOutcome::Failed;
            }
        };

        self.clear_group(group_id);
        let mut added = 0;
        for entry in parse_roster(&body) {
            let connection = Connection::from_roster(entry.name, entry.host, entry.port, &group);
            if self.insert_connection(Some(group_id), connection).is_some() {
                added += 1;
            }
        }

        if let Some(slot) = self.rosters.get_mut(&group_id) {
            slot.state = RosterState::Merged {
                entries: added,
                at: Utc::now(),
            };
        }
        tracing::info!(group = %group_id, added, "Merged roster");
        LoadOutcome::Merged { added }
    }

    // ========== Integrity ==========

    /// Checks the address book invariants
    ///
    /// Every tree node resolves to a record of the matching kind, every
    /// record has a node, and every dynamic connection sits in an existing
    /// dynamic group.
    #[must_use]
    pub fn validate(&self) -> bool {
        let nodes_resolve = self.tree.walk().all(|node| match (node.kind, self.store.get(node.id)) {
            (NodeKind::Group, Some(Entity::Group(_)))
            | (NodeKind::Connection, Some(Entity::Connection(_))) => true,
            _ => false,
        });
        let records_placed = self.store.len() == self.tree.len();
        let no_nested_groups = self
            .tree
            .roots()
            .iter()
            .all(|n| n.children.iter().all(|c| c.kind == NodeKind::Connection));
        let dynamic_parents = self.store.connections().filter(|c| c.dynamic).all(|c| {
            c.group_id
                .and_then(|g| self.store.group(g))
                .is_some_and(|g| g.dynamic)
        });

        nodes_resolve && records_placed && no_nested_groups && dynamic_parents
    }
}

fn apply_group_draft(group: &mut ConnectionGroup, draft: &GroupDraft) {
    group.dns = parse_dns(&draft.dns);
    group.dynamic = draft.dynamic;
    group.source = draft.source.trim().to_string();
    group.username.clone_from(&draft.username);
    group.password = SecretString::from(draft.password.clone());
}
