//! `SimConsole` Core Library
//!
//! This crate provides the core of the `SimConsole` console client: the
//! address book of connections and groups, dynamic roster loading, state
//! persistence and the session tab model used by front-ends.

pub mod book;
pub mod config;
pub mod dialogs;
pub mod error;
pub mod logging;
pub mod manager;
pub mod models;
pub mod roster;
pub mod session;
pub mod store;
pub mod tree;

pub use book::{AddressBook, GroupUpdate, ItemAction, OpenRequest};
pub use config::{ConfigManager, PersistedState, UiSettings};
pub use dialogs::{ConnectionDraft, DialogProvider, GroupDraft};
pub use error::{ConfigError, ConfigResult, RosterError, RosterResult, SimConsoleError};
pub use manager::{ConsoleManager, EditOutcome};
pub use models::{Connection, ConnectionGroup, Entity, EntityKind};
pub use roster::{
    parse_line, parse_roster, HttpRosterFetcher, LoadOutcome, RosterDispatcher, RosterEntry,
    RosterFetcher, RosterRequest, RosterResponse, RosterState, DEFAULT_ROSTER_PORT,
};
pub use session::{OpenOutcome, PaneFactory, SessionPane, TabEntry, TabLocation, TabManager};
pub use store::EntityStore;
pub use tree::{HierarchyTree, NodeKind, TreeNode};
