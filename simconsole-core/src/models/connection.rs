//! Connection model for a single console endpoint.

use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use super::ConnectionGroup;

/// A console endpoint the user can open a session to
///
/// Connections are either authored by the user (persisted) or produced by a
/// roster fetch of a dynamic group (`dynamic == true`, never persisted).
#[derive(Debug, Clone)]
pub struct Connection {
    /// Unique identifier for the connection
    pub id: Uuid,
    /// Display name shown in the tree and on the tab
    pub name: String,
    /// Remote host address (hostname or IP)
    pub host: String,
    /// Remote console port
    pub port: u16,
    /// Username for the console login
    pub username: String,
    /// Password for the console login, stored as-is
    pub password: SecretString,
    /// Owning group, if any
    pub group_id: Option<Uuid>,
    /// Whether this connection came from a roster fetch
    pub dynamic: bool,
}

impl Connection {
    /// Creates a new user-authored connection with empty credentials
    #[must_use]
    pub fn new(name: String, host: String, port: u16) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            host,
            port,
            username: String::new(),
            password: SecretString::from(String::new()),
            group_id: None,
            dynamic: false,
        }
    }

    /// Creates an ephemeral connection for a roster entry of `group`
    ///
    /// Credentials are copied from the group.
    #[must_use]
    pub fn from_roster(name: String, host: String, port: u16, group: &ConnectionGroup) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            host,
            port,
            username: group.username.clone(),
            password: group.password.clone(),
            group_id: Some(group.id),
            dynamic: true,
        }
    }

    /// Sets the login credentials
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = SecretString::from(password.into());
        self
    }

    /// Returns the plaintext password
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Returns `host:port`
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
