//! Display preferences and window state
//!
//! The window blobs are produced and consumed by the front-end; the core
//! only carries them between sessions.

/// Front-end state persisted next to the address book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSettings {
    /// Main window geometry blob
    pub window_geometry: Vec<u8>,
    /// Main window state blob (toolbars, docks)
    pub window_state: Vec<u8>,
    /// Splitter state blob between the tree and the tabs
    pub split: Option<Vec<u8>>,
    /// Render consoles as black text on a white background
    pub black_on_white: bool,
    /// Use the system font instead of a fixed-width console font
    pub system_font: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            window_geometry: Vec::new(),
            window_state: Vec::new(),
            split: None,
            black_on_white: true,
            system_font: false,
        }
    }
}
