//! Union of the records held by the entity store.

use uuid::Uuid;

use super::{Connection, ConnectionGroup};

/// Discriminates the two record kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A connection record
    Connection,
    /// A group record
    Group,
}

/// A record in the entity store
#[derive(Debug, Clone)]
pub enum Entity {
    /// A connection
    Connection(Connection),
    /// A group
    Group(ConnectionGroup),
}

impl Entity {
    /// Returns the record id
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Connection(c) => c.id,
            Self::Group(g) => g.id,
        }
    }

    /// Returns the display name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Connection(c) => &c.name,
            Self::Group(g) => &g.name,
        }
    }

    /// Replaces the display name
    pub fn set_name(&mut self, name: String) {
        match self {
            Self::Connection(c) => c.name = name,
            Self::Group(g) => g.name = name,
        }
    }

    /// Returns the record kind
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Connection(_) => EntityKind::Connection,
            Self::Group(_) => EntityKind::Group,
        }
    }

    /// Returns true for dynamic connections and dynamic groups
    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        match self {
            Self::Connection(c) => c.dynamic,
            Self::Group(g) => g.dynamic,
        }
    }
}

impl From<Connection> for Entity {
    fn from(connection: Connection) -> Self {
        Self::Connection(connection)
    }
}

impl From<ConnectionGroup> for Entity {
    fn from(group: ConnectionGroup) -> Self {
        Self::Group(group)
    }
}
