//! Group and channel link parsing.
//!
//! Users paste group references in many shapes. [`parse_link`] normalizes one
//! line into a [`GroupTarget`]; [`parse_links`] handles a whole multi-line
//! block and keeps the lines it could not understand.
//!
//! | Input | Result |
//! |-------|--------|
//! | `@rustaceans` | `Username("rustaceans")` |
//! | `https://t.me/rustaceans` | `Username("rustaceans")` |
//! | `t.me/rustaceans/1234` | `Username("rustaceans")` |
//! | `https://t.me/joinchat/AAAAAEHbEkejzxUjAUCzYA` | `Invite("AAAAAEHbEkejzxUjAUCzYA")` |
//! | `https://t.me/+AbCdEf123` | `Invite("AbCdEf123")` |
//! | `rustaceans` | `Username("rustaceans")` |
//!
//! No network access happens here.

use serde::{Deserialize, Serialize};

/// Canonical group identifier understood by a history provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum GroupRef {
    /// Public username, without the `@` sigil.
    Username(String),
    /// Invite hash from a `joinchat/` or `+` link.
    Invite(String),
}

impl GroupRef {
    /// Returns the public username, if this reference has one.
    pub fn username(&self) -> Option<&str> {
        match self {
            GroupRef::Username(name) => Some(name),
            GroupRef::Invite(_) => None,
        }
    }
}

impl std::fmt::Display for GroupRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupRef::Username(name) => write!(f, "@{}", name),
            GroupRef::Invite(hash) => write!(f, "+{}", hash),
        }
    }
}

/// A parsed group reference together with the line it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupTarget {
    pub reference: GroupRef,
    pub raw: String,
}

/// Result of parsing a block of links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLinks {
    /// Targets in input order
    pub targets: Vec<GroupTarget>,
    /// Non-blank lines that did not yield a target
    pub rejected: Vec<String>,
}

const HOSTS: &[&str] = &["telegram.me/", "t.me/"];

/// Parses a single group reference.
///
/// Returns `None` for empty input or references with an empty
/// username/hash (e.g. `https://t.me/`, `@`).
///
/// # Example
///
/// ```
/// use chatgrep::link::{parse_link, GroupRef};
///
/// let target = parse_link("https://t.me/+AbCdEf123").unwrap();
/// assert_eq!(target.reference, GroupRef::Invite("AbCdEf123".into()));
///
/// assert!(parse_link("   ").is_none());
/// ```
pub fn parse_link(raw: &str) -> Option<GroupTarget> {
    let line = raw.trim();
    if line.is_empty() {
        return None;
    }

    let reference = if let Some(name) = line.strip_prefix('@') {
        GroupRef::Username(valid_segment(name)?.to_string())
    } else if let Some(path) = after_host(line) {
        parse_path(path)?
    } else {
        GroupRef::Username(valid_segment(line)?.to_string())
    };

    Some(GroupTarget {
        reference,
        raw: line.to_string(),
    })
}

/// Parses newline-separated references.
///
/// Blank lines are separators and skipped silently; other lines that fail to
/// parse are kept in [`ParsedLinks::rejected`].
pub fn parse_links(text: &str) -> ParsedLinks {
    let mut parsed = ParsedLinks::default();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_link(line) {
            Some(target) => parsed.targets.push(target),
            None => parsed.rejected.push(line.trim().to_string()),
        }
    }
    parsed
}

/// Returns the path after the last known host occurrence.
fn after_host(line: &str) -> Option<&str> {
    HOSTS
        .iter()
        .filter_map(|host| line.rfind(host).map(|pos| (pos, pos + host.len())))
        .max_by_key(|(pos, _)| *pos)
        .map(|(_, end)| &line[end..])
}

fn parse_path(path: &str) -> Option<GroupRef> {
    // Drop query string and fragment
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let first = segments.next()?;

    if first == "joinchat" {
        let hash = segments.next()?;
        return Some(GroupRef::Invite(valid_segment(hash)?.to_string()));
    }
    if let Some(hash) = first.strip_prefix('+') {
        return Some(GroupRef::Invite(valid_segment(hash)?.to_string()));
    }
    // Web preview links: t.me/s/<name>
    if first == "s" {
        let name = segments.next()?;
        return Some(GroupRef::Username(valid_segment(name)?.to_string()));
    }

    Some(GroupRef::Username(valid_segment(first)?.to_string()))
}

fn valid_segment(segment: &str) -> Option<&str> {
    let segment = segment.trim();
    if segment.is_empty() || segment.chars().any(char::is_whitespace) {
        None
    } else {
        Some(segment)
    }
}
