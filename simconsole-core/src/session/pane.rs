//! Session pane collaborator interface
//!
//! A pane is the widget that owns a live console session. The core never
//! talks to the remote host itself; it drives panes through this trait.

use std::net::IpAddr;

use crate::models::Connection;

/// A live console session bound to one connection
pub trait SessionPane {
    /// Starts the login sequence
    fn login(&mut self);

    /// Terminates the live session
    fn close_connection(&mut self);

    /// Returns true once the session has logged in
    fn is_logged_in(&self) -> bool;

    /// Clears the console scrollback
    fn clear_scrollback(&mut self);

    /// Copies the current selection to the clipboard
    fn copy_selection(&mut self);

    /// Asks the remote server to restart
    fn restart_server(&mut self);
}

/// Creates panes for the tab manager
pub trait PaneFactory {
    /// Builds a pane for `connection`, resolving its host through `dns` when set
    fn create_pane(&mut self, connection: &Connection, dns: Option<IpAddr>) -> Box<dyn SessionPane>;
}

impl<F> PaneFactory for F
where
    F: FnMut(&Connection, Option<IpAddr>) -> Box<dyn SessionPane>,
{
    fn create_pane(&mut self, connection: &Connection, dns: Option<IpAddr>) -> Box<dyn SessionPane> {
        self(connection, dns)
    }
}
