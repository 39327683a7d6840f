//! In-memory entity store
//!
//! Maps unique ids to connection and group records. The store performs no
//! bookkeeping of its own: callers keep the hierarchy tree in sync.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{Connection, ConnectionGroup, Entity};

/// Id-keyed storage for connections and groups
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: HashMap<Uuid, Entity>,
}

impl EntityStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record under its own id, replacing any previous record
    pub fn put(&mut self, entity: impl Into<Entity>) -> Option<Entity> {
        let entity = entity.into();
        self.entities.insert(entity.id(), entity)
    }

    /// Gets a record by id
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Gets a mutable record by id
    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Removes a record by id
    pub fn remove(&mut self, id: Uuid) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Returns true if a record exists for `id`
    #[must_use]
    pub fn contains(&self, id: Uuid) -> bool {
        self.entities.contains_key(&id)
    }

    /// Iterates over all records in unspecified order
    pub fn values(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Returns the number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the store holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Gets a connection by id
    #[must_use]
    pub fn connection(&self, id: Uuid) -> Option<&Connection> {
        match self.entities.get(&id) {
            Some(Entity::Connection(c)) => Some(c),
            _ => None,
        }
    }

    /// Gets a mutable connection by id
    pub fn connection_mut(&mut self, id: Uuid) -> Option<&mut Connection> {
        match self.entities.get_mut(&id) {
            Some(Entity::Connection(c)) => Some(c),
            _ => None,
        }
    }

    /// Gets a group by id
    #[must_use]
    pub fn group(&self, id: Uuid) -> Option<&ConnectionGroup> {
        match self.entities.get(&id) {
            Some(Entity::Group(g)) => Some(g),
            _ => None,
        }
    }

    /// Gets a mutable group by id
    pub fn group_mut(&mut self, id: Uuid) -> Option<&mut ConnectionGroup> {
        match self.entities.get_mut(&id) {
            Some(Entity::Group(g)) => Some(g),
            _ => None,
        }
    }

    /// Iterates over all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.entities.values().filter_map(|e| match e {
            Entity::Connection(c) => Some(c),
            Entity::Group(_) => None,
        })
    }

    /// Iterates over all groups
    pub fn groups(&self) -> impl Iterator<Item = &ConnectionGroup> {
        self.entities.values().filter_map(|e| match e {
            Entity::Group(g) => Some(g),
            Entity::Connection(_) => None,
        })
    }
}
