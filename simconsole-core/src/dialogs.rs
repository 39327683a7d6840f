//! Dialog contract for editing records
//!
//! Front-ends present these drafts in modal forms. A provider returns the
//! edited draft, or `None` when the user cancels.

use secrecy::{ExposeSecret, SecretString};

use crate::models::{Connection, ConnectionGroup};
use crate::roster::DEFAULT_ROSTER_PORT;

/// Form contents for creating or editing a connection
#[derive(Debug, Clone)]
pub struct ConnectionDraft {
    /// Display name (only used when creating)
    pub name: String,
    /// Remote host
    pub host: String,
    /// Console port
    pub port: u16,
    /// Login username
    pub username: String,
    /// Login password
    pub password: SecretString,
}

impl ConnectionDraft {
    /// Creates a draft with the given name, host and port and empty credentials
    #[must_use]
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            username: String::new(),
            password: SecretString::from(String::new()),
        }
    }

    /// Sets the credentials
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = SecretString::from(password.into());
        self
    }

    /// Builds a new connection from this draft
    #[must_use]
    pub fn into_connection(self) -> Connection {
        let mut connection = Connection::new(self.name, self.host, self.port);
        connection.username = self.username;
        connection.password = self.password;
        connection
    }

    /// Copies the editable fields onto `connection`, leaving its name alone
    pub fn apply_to(&self, connection: &mut Connection) {
        connection.host.clone_from(&self.host);
        connection.port = self.port;
        connection.username.clone_from(&self.username);
        connection.password = SecretString::from(self.password.expose_secret().to_string());
    }
}

impl Default for ConnectionDraft {
    fn default() -> Self {
        Self::new(String::new(), String::new(), DEFAULT_ROSTER_PORT)
    }
}

impl From<&Connection> for ConnectionDraft {
    fn from(connection: &Connection) -> Self {
        Self {
            name: connection.name.clone(),
            host: connection.host.clone(),
            port: connection.port,
            username: connection.username.clone(),
            password: connection.password.clone(),
        }
    }
}

/// Form contents for creating or editing a group
#[derive(Debug, Clone, Default)]
pub struct GroupDraft {
    /// Display name (only used when creating)
    pub name: String,
    /// DNS override as typed; empty for none
    pub dns: String,
    /// Whether the group is fed from a roster
    pub dynamic: bool,
    /// Roster URL
    pub source: String,
    /// Username handed to fetched children
    pub username: String,
    /// Password handed to fetched children
    pub password: String,
}

impl From<&ConnectionGroup> for GroupDraft {
    fn from(group: &ConnectionGroup) -> Self {
        Self {
            name: group.name.clone(),
            dns: group.dns.map(|d| d.to_string()).unwrap_or_default(),
            dynamic: group.dynamic,
            source: group.source.clone(),
            username: group.username.clone(),
            password: group.password().to_string(),
        }
    }
}

/// Modal request/response collaborator
pub trait DialogProvider {
    /// Shows the connection form; `name_editable` is false when editing
    fn edit_connection(
        &mut self,
        draft: ConnectionDraft,
        name_editable: bool,
    ) -> Option<ConnectionDraft>;

    /// Shows the group form (name is never editable here)
    fn edit_group(&mut self, draft: GroupDraft) -> Option<GroupDraft>;

    /// Asks a yes/no question; `true` means yes
    fn confirm(&mut self, title: &str, message: &str) -> bool;
}
