//! Roster document parser
//!
//! Each non-blank line of a roster reads `<host[:port]> <free-text name>`.

/// Console port used when a roster line gives no port
pub const DEFAULT_ROSTER_PORT: u16 = 9000;

/// One parsed roster line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// Display name, first character upper-cased
    pub name: String,
    /// Host part of the address
    pub host: String,
    /// Console port
    pub port: u16,
}

/// Parses a whole roster document, skipping lines that do not form an entry
#[must_use]
pub fn parse_roster(body: &str) -> Vec<RosterEntry> {
    body.lines().filter_map(parse_line).collect()
}

/// Parses a single roster line
///
/// Returns `None` for lines with fewer than two tokens or an empty name.
/// A port that is not a number is read as 0.
#[must_use]
pub fn parse_line(line: &str) -> Option<RosterEntry> {
    let mut tokens = line.split_whitespace();
    let address = tokens.next()?;
    let name = tokens.collect::<Vec<_>>().join(" ");
    if name.trim().is_empty() {
        return None;
    }

    let mut parts = address.split(':');
    let host = parts.next().unwrap_or_default().to_string();
    let port = parts
        .next()
        .map_or(DEFAULT_ROSTER_PORT, |p| p.trim().parse().unwrap_or(0));

    Some(RosterEntry {
        name: capitalize(&name),
        host,
        port,
    })
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
