//! Live session tabs
//!
//! This module provides the pane collaborator interface and the
//! `TabManager`, which hosts panes at the root or inside per-group
//! sub-containers.

mod pane;
mod tabs;

pub use pane::{PaneFactory, SessionPane};
pub use tabs::{GroupContainer, OpenOutcome, PaneTab, TabEntry, TabLocation, TabManager};
