//! External IP lookups for the modal overlay
//!
//! Both lookups run as spawned tasks and report back over a channel, so
//! the dashboard keeps refreshing while a slow lookup is in flight.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt::Write as _;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

const IPINFO_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a finished lookup, delivered to the event loop
#[derive(Debug)]
pub struct LookupOutcome {
    pub ip: String,
    /// Formatted display text, or a display-ready error
    pub result: Result<String, String>,
}

/// Spawn a whois lookup for `ip`, reporting on `tx`
pub fn spawn_whois(ip: String, tx: mpsc::Sender<LookupOutcome>) {
    tokio::spawn(async move {
        let result = run_whois(&ip).await.map_err(|e| {
            warn!(ip = %ip, error = %e, "whois lookup failed");
            e.to_string()
        });
        let _ = tx.send(LookupOutcome { ip, result }).await;
    });
}

/// Spawn an ipinfo.io lookup for `ip`, reporting on `tx`
pub fn spawn_ipinfo(ip: String, tx: mpsc::Sender<LookupOutcome>) {
    tokio::spawn(async move {
        let result = run_ipinfo(&ip).await.map_err(|e| {
            warn!(ip = %ip, error = %e, "ipinfo lookup failed");
            e.to_string()
        });
        let _ = tx.send(LookupOutcome { ip, result }).await;
    });
}

async fn run_whois(ip: &str) -> Result<String> {
    let output = tokio::process::Command::new("whois")
        .arg(ip)
        .output()
        .await
        .context("failed to run whois (is it installed?)")?;

    if !output.status.success() {
        anyhow::bail!("whois exited with {}", output.status);
    }

    Ok(clean_whois_output(&String::from_utf8_lossy(&output.stdout)))
}

/// Drop comment and blank lines from raw whois output
fn clean_whois_output(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('%'))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Default, Deserialize)]
struct IpinfoResponse {
    #[serde(default)]
    ip: String,
    #[serde(default)]
    hostname: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    loc: String,
    #[serde(default)]
    org: String,
    #[serde(default)]
    postal: String,
    #[serde(default)]
    timezone: String,
}

async fn run_ipinfo(ip: &str) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(IPINFO_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let info: IpinfoResponse = client
        .get(format!("https://ipinfo.io/{ip}/json"))
        .send()
        .await
        .context("ipinfo.io request failed")?
        .error_for_status()
        .context("ipinfo.io returned an error status")?
        .json()
        .await
        .context("failed to decode ipinfo.io response")?;

    Ok(format_ipinfo(&info))
}

fn format_ipinfo(info: &IpinfoResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "IP:       {}", info.ip);
    if !info.hostname.is_empty() {
        let _ = writeln!(out, "Hostname: {}", info.hostname);
    }
    if !info.org.is_empty() {
        let _ = writeln!(out, "Org:      {}", info.org);
    }
    let location: Vec<&str> = [&info.city, &info.region, &info.country]
        .into_iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    if !location.is_empty() {
        let _ = writeln!(out, "Location: {}", location.join(", "));
    }
    if !info.loc.is_empty() {
        let _ = writeln!(out, "Coords:   {}", info.loc);
    }
    if !info.timezone.is_empty() {
        let _ = writeln!(out, "Timezone: {}", info.timezone);
    }
    if !info.postal.is_empty() {
        let _ = writeln!(out, "Postal:   {}", info.postal);
    }
    out.trim_end().to_string()
}
