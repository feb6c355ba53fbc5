//! Router access log line parsing
//!
//! Extracts structured entries from Heroku router log lines. Each field is
//! matched independently so partially malformed lines still yield an entry
//! as long as a status code is present.

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;

/// Marker that identifies a router log line
const ROUTER_MARKER: &str = "heroku[router]";

static STATUS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"status=(\d+)").unwrap());
static SERVICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"service=(\d+)ms").unwrap());
static CONNECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"connect=(\d+)ms").unwrap());
static HOST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"host=(\S+)").unwrap());
static PATH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"path="([^"]*)""#).unwrap());
// fwd appears quoted (possibly empty) or as a bare IP
static FWD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"fwd="([^"]*)""#).unwrap());
static FWD_BARE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"fwd=([0-9]\S*)").unwrap());

/// One parsed router log observation
///
/// Entries are immutable once created and owned by the store after
/// submission. The timestamp is the arrival time, not the time embedded in
/// the log line, so entries append in chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub timestamp: Instant,
    pub status: u16,
    /// Service time in milliseconds
    pub service_ms: u64,
    /// Connect time in milliseconds
    pub connect_ms: u64,
    pub host: String,
    pub path: String,
    /// First client address from the forwarded-for chain
    pub client_ip: String,
}

/// Parse a router log line into an [`Entry`]
///
/// Returns `None` for lines that are not router logs or carry no status
/// field. Missing optional fields default to zero / empty.
pub fn parse(line: &str) -> Option<Entry> {
    if !line.contains(ROUTER_MARKER) {
        return None;
    }

    let status: u16 = STATUS_RE.captures(line)?.get(1)?.as_str().parse().ok()?;

    let service_ms = capture_u64(&SERVICE_RE, line);
    let connect_ms = capture_u64(&CONNECT_RE, line);

    let host = capture_str(&HOST_RE, line);

    let path = PATH_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| strip_query(m.as_str()).to_string())
        .unwrap_or_default();

    let client_ip = capture_fwd(line);

    Some(Entry {
        timestamp: Instant::now(),
        status,
        service_ms,
        connect_ms,
        host,
        path,
        client_ip,
    })
}

fn capture_u64(re: &Regex, line: &str) -> u64 {
    re.captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

fn capture_str(re: &Regex, line: &str) -> String {
    re.captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Extract the first client address from the fwd chain
///
/// Handles both the quoted form (`fwd="1.2.3.4, 5.6.7.8"`) and the bare
/// form (`fwd=1.2.3.4`). An empty quoted value yields an empty string.
fn capture_fwd(line: &str) -> String {
    let chain = FWD_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            FWD_BARE_RE
                .captures(line)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
        });

    chain
        .and_then(|c| c.split(',').next())
        .map(|ip| ip.trim().to_string())
        .unwrap_or_default()
}

fn strip_query(path: &str) -> &str {
    match path.find('?') {
        Some(idx) => &path[..idx],
        None => path,
    }
}
