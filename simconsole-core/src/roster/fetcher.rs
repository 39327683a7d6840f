//! Roster transport
//!
//! The `RosterFetcher` trait is the seam between the loader and the network;
//! `HttpRosterFetcher` is the production implementation over `reqwest`.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Url;

use crate::error::{RosterError, RosterResult};

/// Maximum number of redirects followed for one roster request
const MAX_REDIRECTS: usize = 10;

/// Fetches roster documents
#[async_trait]
pub trait RosterFetcher: Send + Sync {
    /// Fetches the document at `url` and returns its body as text
    ///
    /// # Errors
    /// Returns `RosterError` if the transport fails or the server does not
    /// answer with a success status
    async fn fetch(&self, url: &Url) -> RosterResult<String>;
}

/// Validates a group source as an absolute URL
///
/// # Errors
/// Returns `RosterError::InvalidSource` for empty or relative sources
pub fn source_url(source: &str) -> RosterResult<Url> {
    let source = source.trim();
    if source.is_empty() {
        return Err(RosterError::InvalidSource("empty source".to_string()));
    }
    Url::parse(source).map_err(|e| RosterError::InvalidSource(format!("{source}: {e}")))
}

/// HTTP(S) roster fetcher following redirects
#[derive(Debug, Clone)]
pub struct HttpRosterFetcher {
    client: reqwest::Client,
}

impl HttpRosterFetcher {
    /// Creates a fetcher with a redirect-following client
    ///
    /// # Errors
    /// Returns `RosterError::Transport` if the HTTP client cannot be built
    pub fn new() -> RosterResult<Self> {
        let client = reqwest::Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| RosterError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    /// Creates a fetcher over an existing client
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RosterFetcher for HttpRosterFetcher {
    async fn fetch(&self, url: &Url) -> RosterResult<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| RosterError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RosterError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| RosterError::Body(e.to_string()))
    }
}
