//! Core data models for `SimConsole`
//!
//! This module defines the records held by the address book: connections,
//! groups and the `Entity` union the entity store is keyed over.

mod connection;
mod entity;
mod group;

pub use connection::Connection;
pub use entity::{Entity, EntityKind};
pub use group::{parse_dns, ConnectionGroup, NEW_GROUP_NAME};
