//! Dynamic group rosters
//!
//! A dynamic group publishes its members as a plain-text roster at a URL.
//! This module parses roster documents, fetches them over HTTP and carries
//! the request/response pairs the address book uses to merge results.

mod fetcher;
mod parser;
mod request;

pub use fetcher::{source_url, HttpRosterFetcher, RosterFetcher};
pub use parser::{parse_line, parse_roster, RosterEntry, DEFAULT_ROSTER_PORT};
pub use request::{LoadOutcome, RosterDispatcher, RosterRequest, RosterResponse, RosterState};
