//! Persisted state document
//!
//! The document mirrors a flat key/value settings store: window blobs, two
//! display flags, a `Groups` array and a `Connections` array. Reading is
//! lenient. Every value is converted the way a settings store would convert
//! it, and anything missing or malformed becomes the type's default.

use secrecy::SecretString;
use serde::Serialize;
use toml::{Table, Value};
use uuid::Uuid;

use crate::book::AddressBook;
use crate::error::{ConfigError, ConfigResult};
use crate::models::{parse_dns, Connection, ConnectionGroup};
use crate::tree::NodeKind;

use super::settings::UiSettings;

/// One entry of the `Groups` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRecord {
    #[serde(rename = "Uuid")]
    pub uuid: Uuid,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Dynamic")]
    pub dynamic: bool,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "User")]
    pub user: String,
    #[serde(rename = "Pass")]
    pub pass: String,
    #[serde(rename = "Dns", skip_serializing_if = "Option::is_none")]
    pub dns: Option<String>,
    #[serde(rename = "Expanded")]
    pub expanded: bool,
}

/// One entry of the `Connections` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionRecord {
    #[serde(rename = "Uuid")]
    pub uuid: Uuid,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Host")]
    pub host: String,
    #[serde(rename = "Port")]
    pub port: u16,
    #[serde(rename = "User")]
    pub user: String,
    #[serde(rename = "Pass")]
    pub pass: String,
    #[serde(rename = "Parent", skip_serializing_if = "Option::is_none")]
    pub parent: Option<Uuid>,
}

/// Everything the console client keeps between runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    /// Display preferences and window blobs
    pub ui: UiSettings,
    /// Group definitions, dynamic ones included
    pub groups: Vec<GroupRecord>,
    /// User connections outside dynamic groups
    pub connections: Vec<ConnectionRecord>,
}

/// Serialized shape of the document; plain keys first, arrays of tables last
#[derive(Serialize)]
struct Document<'a> {
    #[serde(rename = "mainWindowGeometry")]
    window_geometry: &'a [u8],
    #[serde(rename = "mainWindowState")]
    window_state: &'a [u8],
    #[serde(skip_serializing_if = "Option::is_none")]
    split: Option<&'a [u8]>,
    black_on_white: bool,
    system_font: bool,
    #[serde(rename = "Groups")]
    groups: &'a [GroupRecord],
    #[serde(rename = "Connections")]
    connections: &'a [ConnectionRecord],
}

impl PersistedState {
    /// Captures the address book and UI settings for saving
    ///
    /// All groups are kept (dynamic groups keep their definition only).
    /// Connections are kept when they are user connections whose parent
    /// group, if any, is static. Parent links come from the tree.
    #[must_use]
    pub fn capture(book: &AddressBook, ui: &UiSettings) -> Self {
        let tree = book.tree();

        let groups = tree
            .roots()
            .iter()
            .filter(|node| node.kind == NodeKind::Group)
            .filter_map(|node| {
                book.group(node.id).map(|group| GroupRecord {
                    uuid: group.id,
                    name: group.name.clone(),
                    dynamic: group.dynamic,
                    source: group.source.clone(),
                    user: group.username.clone(),
                    pass: group.password().to_string(),
                    dns: group.dns.map(|d| d.to_string()),
                    expanded: node.expanded,
                })
            })
            .collect();

        let connections = tree
            .walk()
            .filter(|node| node.kind == NodeKind::Connection)
            .filter_map(|node| book.connection(node.id))
            .filter(|connection| !connection.dynamic)
            .filter_map(|connection| {
                let parent = tree.parent_of(connection.id);
                if parent.and_then(|id| book.group(id)).is_some_and(|g| g.dynamic) {
                    return None;
                }
                Some(ConnectionRecord {
                    uuid: connection.id,
                    name: connection.name.clone(),
                    host: connection.host.clone(),
                    port: connection.port,
                    user: connection.username.clone(),
                    pass: connection.password().to_string(),
                    parent,
                })
            })
            .collect();

        Self {
            ui: ui.clone(),
            groups,
            connections,
        }
    }

    /// Rebuilds an address book from the saved records
    ///
    /// Groups are restored before connections. A connection whose parent is
    /// not a known static group is dropped, as is any record reusing an id
    /// already restored.
    #[must_use]
    pub fn restore(self) -> (AddressBook, UiSettings) {
        let mut book = AddressBook::new();

        for record in self.groups {
            if book.store().contains(record.uuid) {
                tracing::warn!(id = %record.uuid, "Skipping group with duplicate id");
                continue;
            }
            let group = ConnectionGroup {
                id: record.uuid,
                name: record.name,
                dns: record.dns.as_deref().and_then(parse_dns),
                dynamic: record.dynamic,
                source: record.source,
                username: record.user,
                password: SecretString::from(record.pass),
                expanded: record.expanded,
            };
            book.insert_group(group);
        }

        for record in self.connections {
            if book.store().contains(record.uuid) {
                tracing::warn!(id = %record.uuid, "Skipping connection with duplicate id");
                continue;
            }
            if let Some(parent) = record.parent {
                if !book.group(parent).is_some_and(|g| !g.dynamic) {
                    tracing::debug!(id = %record.uuid, %parent, "Dropping connection with unresolvable parent");
                    continue;
                }
            }
            let connection = Connection {
                id: record.uuid,
                name: record.name,
                host: record.host,
                port: record.port,
                username: record.user,
                password: SecretString::from(record.pass),
                group_id: record.parent,
                dynamic: false,
            };
            book.insert_connection(record.parent, connection);
        }

        (book, self.ui)
    }

    /// Serializes the whole document
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Serialize` if TOML serialization fails.
    pub fn to_toml(&self) -> ConfigResult<String> {
        let document = Document {
            window_geometry: &self.ui.window_geometry,
            window_state: &self.ui.window_state,
            split: self.ui.split.as_deref(),
            black_on_white: self.ui.black_on_white,
            system_font: self.ui.system_font,
            groups: &self.groups,
            connections: &self.connections,
        };
        toml::to_string_pretty(&document)
            .map_err(|e| ConfigError::Serialize(format!("Failed to serialize state: {e}")))
    }

    /// Parses a document, substituting defaults for anything malformed
    #[must_use]
    pub fn from_toml(content: &str) -> Self {
        let table = match content.parse::<Table>() {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!("Ignoring unparsable state document: {e}");
                return Self::default();
            }
        };

        let defaults = UiSettings::default();
        let ui = UiSettings {
            window_geometry: read_bytes(&table, "mainWindowGeometry").unwrap_or_default(),
            window_state: read_bytes(&table, "mainWindowState").unwrap_or_default(),
            split: read_bytes(&table, "split"),
            black_on_white: read_bool(&table, "black_on_white", defaults.black_on_white),
            system_font: read_bool(&table, "system_font", defaults.system_font),
        };

        let groups = read_array(&table, "Groups")
            .map(|entry| GroupRecord {
                uuid: read_uuid(entry, "Uuid").unwrap_or_else(Uuid::new_v4),
                name: read_string(entry, "Name"),
                dynamic: read_bool(entry, "Dynamic", false),
                source: read_string(entry, "Source"),
                user: read_string(entry, "User"),
                pass: read_string(entry, "Pass"),
                dns: entry.get("Dns").map(|_| read_string(entry, "Dns")),
                expanded: read_bool(entry, "Expanded", false),
            })
            .collect();

        let connections = read_array(&table, "Connections")
            .map(|entry| ConnectionRecord {
                uuid: read_uuid(entry, "Uuid").unwrap_or_else(Uuid::new_v4),
                name: read_string(entry, "Name"),
                host: read_string(entry, "Host"),
                port: read_port(entry, "Port"),
                user: read_string(entry, "User"),
                pass: read_string(entry, "Pass"),
                parent: read_uuid(entry, "Parent"),
            })
            .collect();

        Self {
            ui,
            groups,
            connections,
        }
    }
}

fn read_array<'a>(table: &'a Table, key: &str) -> impl Iterator<Item = &'a Table> {
    table
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_table)
}

fn read_string(table: &Table, key: &str) -> String {
    match table.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Integer(i)) => i.to_string(),
        Some(Value::Float(f)) => f.to_string(),
        Some(Value::Boolean(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn read_bool(table: &Table, key: &str, default: bool) -> bool {
    match table.get(key) {
        Some(Value::Boolean(b)) => *b,
        Some(Value::Integer(i)) => *i != 0,
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => true,
            "false" | "0" | "" => false,
            _ => default,
        },
        _ => default,
    }
}

fn read_port(table: &Table, key: &str) -> u16 {
    match table.get(key) {
        Some(Value::Integer(i)) => u16::try_from(*i).unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn read_uuid(table: &Table, key: &str) -> Option<Uuid> {
    match table.get(key) {
        Some(Value::String(s)) => Uuid::parse_str(s.trim()).ok().filter(|id| !id.is_nil()),
        _ => None,
    }
}

fn read_bytes(table: &Table, key: &str) -> Option<Vec<u8>> {
    let array = table.get(key)?.as_array()?;
    array
        .iter()
        .map(|v| v.as_integer().and_then(|i| u8::try_from(i).ok()))
        .collect()
}
