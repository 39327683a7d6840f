//! Roster requests, responses and completion delivery
//!
//! Every load of a dynamic group is tagged with the group id and a
//! generation number. Only the response carrying the newest generation for a
//! group is merged; anything older is dropped as stale.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Url;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::RosterFetcher;
use crate::error::RosterResult;

/// Load state of a dynamic group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RosterState {
    /// No load has been issued
    #[default]
    Idle,
    /// A fetch is outstanding
    Fetching,
    /// The latest fetch was merged into the group
    Merged {
        /// Number of connections created from the roster
        entries: usize,
        /// When the merge happened
        at: DateTime<Utc>,
    },
    /// The latest fetch failed and was abandoned
    FetchFailed {
        /// Transport error description
        reason: String,
        /// When the failure was observed
        at: DateTime<Utc>,
    },
}

/// A roster fetch issued for one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRequest {
    /// Group the roster belongs to
    pub group_id: Uuid,
    /// Generation this request was issued with
    pub generation: u64,
    /// Roster URL
    pub url: Url,
}

impl RosterRequest {
    /// Runs the fetch and pairs the result with this request's tags
    pub async fn execute(self, fetcher: &dyn RosterFetcher) -> RosterResponse {
        let result = fetcher.fetch(&self.url).await;
        RosterResponse {
            group_id: self.group_id,
            generation: self.generation,
            result,
        }
    }
}

/// The completed fetch for a `RosterRequest`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterResponse {
    /// Group the roster belongs to
    pub group_id: Uuid,
    /// Generation of the originating request
    pub generation: u64,
    /// Roster body or transport error
    pub result: RosterResult<String>,
}

/// What merging a response did to the address book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The roster replaced the group's children
    Merged {
        /// Number of connections created
        added: usize,
    },
    /// The fetch failed; the group was left untouched
    Failed,
    /// A newer load was issued since; the response was dropped
    Stale,
    /// The group no longer exists or is no longer dynamic
    Discarded,
}

/// Runs roster fetches in the background and hands completions back
///
/// Fetches are spawned on the current Tokio runtime. Completed responses are
/// queued on a channel so the owner of the address book can merge them on its
/// own thread, one at a time.
pub struct RosterDispatcher {
    fetcher: Arc<dyn RosterFetcher>,
    tx: UnboundedSender<RosterResponse>,
    rx: UnboundedReceiver<RosterResponse>,
    pending: usize,
}

impl RosterDispatcher {
    /// Creates a dispatcher over `fetcher`
    #[must_use]
    pub fn new(fetcher: Arc<dyn RosterFetcher>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            fetcher,
            tx,
            rx,
            pending: 0,
        }
    }

    /// Spawns the fetch for `request`
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(&mut self, request: RosterRequest) -> JoinHandle<()> {
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        self.pending += 1;
        tracing::debug!(group = %request.group_id, generation = request.generation, url = %request.url, "Dispatching roster fetch");
        tokio::spawn(async move {
            let response = request.execute(fetcher.as_ref()).await;
            // The receiver lives as long as the dispatcher; a send error only
            // means the dispatcher was dropped and nobody wants the result.
            let _ = tx.send(response);
        })
    }

    /// Returns the number of dispatched fetches not yet received
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.pending
    }

    /// Waits for the next completed fetch
    ///
    /// Returns `None` when nothing is pending.
    pub async fn next_response(&mut self) -> Option<RosterResponse> {
        if self.pending == 0 {
            return None;
        }
        let response = self.rx.recv().await?;
        self.pending -= 1;
        Some(response)
    }

    /// Returns a completed fetch if one is ready
    pub fn try_next_response(&mut self) -> Option<RosterResponse> {
        let response = self.rx.try_recv().ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(response)
    }
}

impl std::fmt::Debug for RosterDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterDispatcher")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
