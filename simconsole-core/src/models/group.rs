//! Connection group model.

use std::net::IpAddr;

use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

/// Name given to groups created from the "new group" action
pub const NEW_GROUP_NAME: &str = "New group";

/// A one-level group of connections
///
/// Static groups hold user-authored connections. Dynamic groups are filled
/// from the roster published at `source`; their children are never persisted.
#[derive(Debug, Clone)]
pub struct ConnectionGroup {
    /// Unique identifier for the group
    pub id: Uuid,
    /// Human-readable name for the group
    pub name: String,
    /// DNS server override used when opening the group's connections
    pub dns: Option<IpAddr>,
    /// Whether the children come from a roster fetch
    pub dynamic: bool,
    /// Roster URL, only meaningful for dynamic groups
    pub source: String,
    /// Username applied to fetched children
    pub username: String,
    /// Password applied to fetched children
    pub password: SecretString,
    /// Whether the group is expanded in the tree
    pub expanded: bool,
}

impl ConnectionGroup {
    /// Creates a new static group
    #[must_use]
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            dns: None,
            dynamic: false,
            source: String::new(),
            username: String::new(),
            password: SecretString::from(String::new()),
            expanded: false,
        }
    }

    /// Creates a new dynamic group fed from `source`
    #[must_use]
    pub fn new_dynamic(name: String, source: String) -> Self {
        Self {
            dynamic: true,
            source,
            ..Self::new(name)
        }
    }

    /// Sets the credentials handed to fetched children
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
}

/// Parses a DNS override as typed into a form
///
/// Empty or unparsable text means "no override".
#[must_use]
pub fn parse_dns(text: &str) -> Option<IpAddr> {
    text.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dns() {
        assert_eq!(parse_dns(""), None);
        assert_eq!(parse_dns("not-an-ip"), None);
        assert_eq!(parse_dns(" 10.0.0.53 "), Some("10.0.0.53".parse().unwrap()));
        assert_eq!(parse_dns("::1"), Some("::1".parse().unwrap()));
    }

    #[test]
    fn test_dynamic_group() {
        let group = ConnectionGroup::new_dynamic("Grid".into(), "http://example.com/r".into())
            .with_credentials("admin", "secret");
        assert!(group.dynamic);
        assert_eq!(group.username, "admin");
        assert_eq!(group.password(), "secret");
    }
}
