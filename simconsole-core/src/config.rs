//! Configuration and persisted state
//!
//! This module stores the address book and the display preferences in a
//! single TOML document under the user's configuration directory.

mod manager;
mod settings;
mod state;

pub use manager::ConfigManager;
pub use settings::UiSettings;
pub use state::{ConnectionRecord, GroupRecord, PersistedState};
