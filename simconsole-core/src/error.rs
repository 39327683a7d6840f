//! Error types for `SimConsole`
//!
//! This module defines the error types used by the core library. Most address
//! book operations never fail: refused edits are reported as `false`/`None`
//! and malformed data degrades to defaults. What remains are the failures of
//! writing the state file and of fetching a roster.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for `SimConsole` operations
#[derive(Debug, Error)]
pub enum SimConsoleError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Roster fetch errors
    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to the persisted state file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Configuration directory could not be determined
    #[error("Configuration directory not found: {0}")]
    NotFound(PathBuf),

    /// Failed to write configuration file
    #[error("Failed to write configuration: {0}")]
    Write(String),

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),
}

/// Errors related to fetching a dynamic group roster
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// The group source is not an absolute URL
    #[error("Invalid roster source: {0}")]
    InvalidSource(String),

    /// The request could not be completed
    #[error("Roster transport failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status
    #[error("Roster server returned HTTP {0}")]
    Status(u16),

    /// The response body could not be read
    #[error("Failed to read roster body: {0}")]
    Body(String),
}

/// Result type alias for `SimConsole` operations
pub type Result<T> = std::result::Result<T, SimConsoleError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for roster operations
pub type RosterResult<T> = std::result::Result<T, RosterError>;
