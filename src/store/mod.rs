//! Time-windowed aggregation store for parsed router log entries
//!
//! The store ingests entries from a single producer while a UI refresh loop
//! issues read queries, so the whole state sits behind one reader/writer
//! lock: `add` and `prune` take the write lock, every query takes the read
//! lock exactly once and returns owned values. Because `add` appends at the
//! tail and `prune` only removes from the head, any reader sees a
//! contiguous suffix of the append order.
//!
//! Alongside the raw entry ring the store maintains derivative indices
//! (status/host/IP counts, host↔IP co-occurrence, per-label status and path
//! breakdowns) that are incremented on every insert and decremented
//! symmetrically on every eviction. Latency samples are kept in separate
//! sequences aligned to entries by *filtered* position: WebSocket upgrades
//! (status 101) hold the connection open for its lifetime, so their service
//! time is excluded from percentile data.

mod types;

pub use types::{
    CountItem, ErrorRates, Filter, Stats, StatusCountItem, Trend, TrendReading, UniqueCounts,
};

use crate::parser::Entry;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};
use tracing::debug;

/// Hard cap on retained entries, independent of the time window
const MAX_ENTRIES: usize = 100_000;

/// Status code excluded from latency sampling
const WEBSOCKET_UPGRADE: u16 = 101;

/// Label substituted for empty host/IP/path fields
pub const UNKNOWN_LABEL: &str = "(unknown)";

/// Minimum entries per bucket before a trend is considered significant
const TREND_MIN_SAMPLES: u64 = 10;

/// Rate difference (as a fraction) required to report a trend
const TREND_THRESHOLD: f64 = 0.02;

/// Denylist of operational/noise paths hidden from path rankings
///
/// Exact matches and prefix matches are checked separately. The defaults
/// cover health checks and analytics beacons; deployments can override the
/// lists through the config file.
#[derive(Debug, Clone)]
pub struct PathFilter {
    excluded: Vec<String>,
    excluded_prefixes: Vec<String>,
}

impl Default for PathFilter {
    fn default() -> Self {
        Self {
            excluded: ["/ahoy/events", "/ahoy/visits", "/robots.txt"]
                .map(String::from)
                .to_vec(),
            excluded_prefixes: ["/system-status-", "/hirefire"].map(String::from).to_vec(),
        }
    }
}

impl PathFilter {
    pub fn new(excluded: Vec<String>, excluded_prefixes: Vec<String>) -> Self {
        Self {
            excluded,
            excluded_prefixes,
        }
    }

    /// True if the path should be hidden from path rankings
    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded.iter().any(|p| p == path)
            || self.excluded_prefixes.iter().any(|p| path.starts_with(p))
    }
}

/// Time-windowed log statistics store
///
/// Shared between the ingestion task and the UI via `Arc`; all methods take
/// `&self`.
#[derive(Debug)]
pub struct Store {
    /// Retention window; `None` keeps everything up to [`MAX_ENTRIES`]
    window: Option<Duration>,
    paths: PathFilter,
    inner: RwLock<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    /// Source of truth for windowing, in arrival (= chronological) order
    entries: VecDeque<Entry>,
    total_count: u64,
    status_counts: HashMap<u16, u64>,
    host_counts: HashMap<String, u64>,
    ip_counts: HashMap<String, u64>,

    /// Latency samples, one per non-upgrade entry, head-aligned with
    /// `entries` by filtered position
    service_times: Vec<u64>,
    connect_times: Vec<u64>,

    // Cross-indices for filtered views
    host_to_ips: HashMap<String, HashMap<String, u64>>,
    ip_to_hosts: HashMap<String, HashMap<String, u64>>,
    host_to_status: HashMap<String, HashMap<u16, u64>>,
    ip_to_status: HashMap<String, HashMap<u16, u64>>,
    host_to_paths: HashMap<String, HashMap<String, u64>>,
    ip_to_paths: HashMap<String, HashMap<String, u64>>,
}

impl Store {
    /// Create a store with the given retention window and the default path
    /// denylist
    #[must_use]
    pub fn new(window: Option<Duration>) -> Self {
        Self::with_path_filter(window, PathFilter::default())
    }

    #[must_use]
    pub fn with_path_filter(window: Option<Duration>, paths: PathFilter) -> Self {
        Self {
            window,
            paths,
            inner: RwLock::new(StoreInner::default()),
        }
    }

    #[must_use]
    pub fn window(&self) -> Option<Duration> {
        self.window
    }

    /// Ingest one entry
    ///
    /// Empty host/IP/path fields are normalized to [`UNKNOWN_LABEL`] before
    /// any index is touched, so every index and the stored entry agree on
    /// labels. Cannot fail; enforces the hard capacity cap by evicting the
    /// oldest entries.
    pub fn add(&self, mut entry: Entry) {
        normalize(&mut entry.host);
        normalize(&mut entry.client_ip);
        normalize(&mut entry.path);

        let mut inner = self.inner.write();

        inner.total_count += 1;
        *inner.status_counts.entry(entry.status).or_default() += 1;
        *inner.host_counts.entry(entry.host.clone()).or_default() += 1;
        *inner.ip_counts.entry(entry.client_ip.clone()).or_default() += 1;

        if entry.status != WEBSOCKET_UPGRADE {
            inner.service_times.push(entry.service_ms);
            inner.connect_times.push(entry.connect_ms);
        }

        *inner
            .host_to_ips
            .entry(entry.host.clone())
            .or_default()
            .entry(entry.client_ip.clone())
            .or_default() += 1;
        *inner
            .ip_to_hosts
            .entry(entry.client_ip.clone())
            .or_default()
            .entry(entry.host.clone())
            .or_default() += 1;
        *inner
            .host_to_status
            .entry(entry.host.clone())
            .or_default()
            .entry(entry.status)
            .or_default() += 1;
        *inner
            .ip_to_status
            .entry(entry.client_ip.clone())
            .or_default()
            .entry(entry.status)
            .or_default() += 1;
        *inner
            .host_to_paths
            .entry(entry.host.clone())
            .or_default()
            .entry(entry.path.clone())
            .or_default() += 1;
        *inner
            .ip_to_paths
            .entry(entry.client_ip.clone())
            .or_default()
            .entry(entry.path.clone())
            .or_default() += 1;

        inner.entries.push_back(entry);

        if inner.entries.len() > MAX_ENTRIES {
            let excess = inner.entries.len() - MAX_ENTRIES;
            evict_oldest(&mut inner, excess);
        }
    }

    /// Drop entries older than the retention window
    ///
    /// No-op for an unbounded window. Entries are assumed to arrive in
    /// chronological order, so only a leading run can be stale; the scan
    /// stops at the first entry inside the window.
    pub fn prune(&self) {
        let Some(window) = self.window else {
            return;
        };
        let Some(cutoff) = Instant::now().checked_sub(window) else {
            return;
        };

        let mut inner = self.inner.write();
        let stale = inner
            .entries
            .iter()
            .take_while(|e| e.timestamp <= cutoff)
            .count();
        if stale > 0 {
            debug!(count = stale, "pruning entries outside window");
            evict_oldest(&mut inner, stale);
        }
    }

    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.inner.read().total_count
    }

    /// Timestamp of the oldest retained entry, or now for an empty store
    #[must_use]
    pub fn start_time(&self) -> Instant {
        self.inner
            .read()
            .entries
            .front()
            .map_or_else(Instant::now, |e| e.timestamp)
    }

    /// Latency statistics over the current window
    ///
    /// Recomputed from scratch on every call: the sample sequence is copied
    /// and sorted, which is O(n log n) but bounded by the window/cap.
    #[must_use]
    pub fn stats(&self) -> Stats {
        let inner = self.inner.read();

        let mut stats = Stats {
            total_count: inner.total_count,
            ..Stats::default()
        };

        if inner.service_times.is_empty() {
            return stats;
        }

        let mut times = inner.service_times.clone();
        times.sort_unstable();

        stats.sample_count = times.len();
        let sum: u64 = times.iter().sum();
        stats.avg_service_ms = sum / times.len() as u64;
        stats.p50_service_ms = percentile(&times, 50);
        stats.p95_service_ms = percentile(&times, 95);
        stats.p99_service_ms = percentile(&times, 99);
        stats.max_service_ms = times[times.len() - 1];

        // Connect stats need no sort, just sum and running max
        let mut conn_sum = 0u64;
        let mut conn_max = 0u64;
        for &t in &inner.connect_times {
            conn_sum += t;
            conn_max = conn_max.max(t);
        }
        if !inner.connect_times.is_empty() {
            stats.avg_connect_ms = conn_sum / inner.connect_times.len() as u64;
            stats.max_connect_ms = conn_max;
        }

        stats
    }

    /// Status code counts, sorted by status ascending, zero counts omitted
    #[must_use]
    pub fn status_counts(&self, filter: &Filter) -> Vec<StatusCountItem> {
        let inner = self.inner.read();

        let counts = match filter {
            Filter::Host(host) => inner.host_to_status.get(host),
            Filter::Ip(ip) => inner.ip_to_status.get(ip),
            Filter::None => Some(&inner.status_counts),
        };
        let Some(counts) = counts else {
            return Vec::new();
        };

        let mut items: Vec<StatusCountItem> = counts
            .iter()
            .filter(|&(_, &count)| count > 0)
            .map(|(&status, &count)| StatusCountItem { status, count })
            .collect();
        items.sort_unstable_by_key(|item| item.status);
        items
    }

    /// Top N hosts by count
    ///
    /// An IP filter restricts the ranking to hosts seen from that IP; a
    /// host filter does not apply to the host dimension and ranks all
    /// hosts.
    #[must_use]
    pub fn top_hosts(&self, n: usize, filter: &Filter) -> Vec<CountItem> {
        let inner = self.inner.read();
        let counts = match filter {
            Filter::Ip(ip) => inner.ip_to_hosts.get(ip),
            _ => Some(&inner.host_counts),
        };
        counts.map_or_else(Vec::new, |c| rank(collect_positive(c), n))
    }

    /// Top N client IPs by count, symmetric to [`Store::top_hosts`]
    #[must_use]
    pub fn top_ips(&self, n: usize, filter: &Filter) -> Vec<CountItem> {
        let inner = self.inner.read();
        let counts = match filter {
            Filter::Host(host) => inner.host_to_ips.get(host),
            _ => Some(&inner.ip_counts),
        };
        counts.map_or_else(Vec::new, |c| rank(collect_positive(c), n))
    }

    /// Top N paths for a specific host or IP, denylisted paths omitted
    ///
    /// Returns an empty ranking without a filter; use
    /// [`Store::all_paths`] for the cross-host aggregate.
    #[must_use]
    pub fn top_paths(&self, n: usize, filter: &Filter) -> Vec<CountItem> {
        let inner = self.inner.read();
        let counts = match filter {
            Filter::Host(host) => inner.host_to_paths.get(host),
            Filter::Ip(ip) => inner.ip_to_paths.get(ip),
            Filter::None => None,
        };
        let Some(counts) = counts else {
            return Vec::new();
        };

        let items = counts
            .iter()
            .filter(|&(path, &count)| count > 0 && !self.paths.is_excluded(path))
            .map(|(path, &count)| CountItem {
                label: path.clone(),
                count,
            })
            .collect();
        rank(items, n)
    }

    /// Top N paths aggregated across all hosts, denylisted paths omitted
    #[must_use]
    pub fn all_paths(&self, n: usize) -> Vec<CountItem> {
        let inner = self.inner.read();

        let mut path_counts: HashMap<&str, u64> = HashMap::new();
        for paths in inner.host_to_paths.values() {
            for (path, &count) in paths {
                if count > 0 && !self.paths.is_excluded(path) {
                    *path_counts.entry(path).or_default() += count;
                }
            }
        }

        let items = path_counts
            .into_iter()
            .map(|(path, count)| CountItem {
                label: path.to_string(),
                count,
            })
            .collect();
        rank(items, n)
    }

    /// Sum of host counts outside a previously computed top slice
    ///
    /// Membership is recomputed from the slice's label set, so the slice
    /// may come from any earlier query cycle.
    #[must_use]
    pub fn other_hosts(&self, top: &[CountItem]) -> u64 {
        other_count(&self.inner.read().host_counts, top)
    }

    /// Sum of IP counts outside a previously computed top slice
    #[must_use]
    pub fn other_ips(&self, top: &[CountItem]) -> u64 {
        other_count(&self.inner.read().ip_counts, top)
    }

    /// Overall 4xx / 5xx rates as percentages of all entries
    #[must_use]
    pub fn error_rates(&self) -> ErrorRates {
        let inner = self.inner.read();
        rates_from_status_counts(&inner.status_counts, inner.total_count)
    }

    #[must_use]
    pub fn error_rates_for_host(&self, host: &str) -> ErrorRates {
        let inner = self.inner.read();
        inner
            .host_to_status
            .get(host)
            .map_or_else(ErrorRates::default, filtered_rates)
    }

    #[must_use]
    pub fn error_rates_for_ip(&self, ip: &str) -> ErrorRates {
        let inner = self.inner.read();
        inner
            .ip_to_status
            .get(ip)
            .map_or_else(ErrorRates::default, filtered_rates)
    }

    /// 4xx / 5xx rates for a single path
    ///
    /// No path→status index is maintained (paths are queried rarely and on
    /// small working sets), so this scans the entry ring directly.
    #[must_use]
    pub fn error_rates_for_path(&self, path: &str) -> ErrorRates {
        let inner = self.inner.read();

        let mut total = 0u64;
        let mut count_4xx = 0u64;
        let mut count_5xx = 0u64;
        for entry in inner.entries.iter().filter(|e| e.path == path) {
            total += 1;
            if (400..500).contains(&entry.status) {
                count_4xx += 1;
            } else if (500..600).contains(&entry.status) {
                count_5xx += 1;
            }
        }

        percentage_rates(count_4xx, count_5xx, total)
    }

    /// Unique host/IP/path labels with a positive count
    #[must_use]
    pub fn unique_counts(&self) -> UniqueCounts {
        let inner = self.inner.read();

        let positive = |counts: &HashMap<String, u64>| counts.values().filter(|&&c| c > 0).count();

        let mut path_set: HashSet<&str> = HashSet::new();
        for paths in inner.host_to_paths.values() {
            path_set.extend(
                paths
                    .iter()
                    .filter(|&(_, &count)| count > 0)
                    .map(|(path, _)| path.as_str()),
            );
        }

        UniqueCounts {
            hosts: positive(&inner.host_counts),
            ips: positive(&inner.ip_counts),
            paths: path_set.len(),
        }
    }

    /// Requests per second over the trailing window
    ///
    /// Recent entries sit at the tail, so the scan walks backward and stops
    /// at the first entry outside the window.
    #[must_use]
    pub fn current_rate(&self, window: Duration) -> f64 {
        if window.is_zero() {
            return 0.0;
        }
        let inner = self.inner.read();
        let Some(cutoff) = Instant::now().checked_sub(window) else {
            // Process younger than the window: everything counts
            return inner.entries.len() as f64 / window.as_secs_f64();
        };

        let count = inner
            .entries
            .iter()
            .rev()
            .take_while(|e| e.timestamp > cutoff)
            .count();
        count as f64 / window.as_secs_f64()
    }

    /// Error rate trend between the last `period` and the `period` before it
    #[must_use]
    pub fn trend(&self, period: Duration) -> Trend {
        self.trend_with_diff(period).direction
    }

    /// Trend with the raw rate difference, for consumer-side hysteresis
    ///
    /// Buckets with fewer than [`TREND_MIN_SAMPLES`] entries produce an
    /// insufficient reading (direction `Stable`, diff zero).
    #[must_use]
    pub fn trend_with_diff(&self, period: Duration) -> TrendReading {
        let inner = self.inner.read();
        if inner.entries.is_empty() {
            return TrendReading::default();
        }

        let now = Instant::now();
        let recent_cutoff = now.checked_sub(period);
        let old_cutoff = now.checked_sub(period * 2);
        let after = |ts: Instant, cutoff: Option<Instant>| cutoff.is_none_or(|c| ts > c);

        let mut recent_total = 0u64;
        let mut recent_errors = 0u64;
        let mut old_total = 0u64;
        let mut old_errors = 0u64;

        for entry in &inner.entries {
            let is_error = entry.status >= 400;
            if after(entry.timestamp, recent_cutoff) {
                recent_total += 1;
                recent_errors += u64::from(is_error);
            } else if after(entry.timestamp, old_cutoff) {
                old_total += 1;
                old_errors += u64::from(is_error);
            }
        }

        if recent_total < TREND_MIN_SAMPLES || old_total < TREND_MIN_SAMPLES {
            return TrendReading::default();
        }

        let diff = recent_errors as f64 / recent_total as f64 - old_errors as f64 / old_total as f64;
        let direction = if diff > TREND_THRESHOLD {
            Trend::Up
        } else if diff < -TREND_THRESHOLD {
            Trend::Down
        } else {
            Trend::Stable
        };

        TrendReading {
            diff,
            direction,
            sufficient: true,
        }
    }
}

// ============================================================================
// Eviction
// ============================================================================

/// Remove the `count` oldest entries, decrementing every index symmetrically
/// to the increments in `add`
///
/// Latency samples are trimmed by the number of evicted *non-upgrade*
/// entries, not the raw eviction count: upgrade entries never contributed a
/// sample, and trimming by raw count would shift the alignment between the
/// entry ring and the sample sequences.
fn evict_oldest(inner: &mut StoreInner, count: usize) {
    let count = count.min(inner.entries.len());
    if count == 0 {
        return;
    }

    let mut sample_count = 0usize;
    for idx in 0..count {
        let entry = &inner.entries[idx];
        let (host, ip, path, status) = (
            entry.host.clone(),
            entry.client_ip.clone(),
            entry.path.clone(),
            entry.status,
        );

        inner.total_count = inner.total_count.saturating_sub(1);
        decrement(&mut inner.status_counts, &status);
        decrement(&mut inner.host_counts, &host);
        decrement(&mut inner.ip_counts, &ip);

        decrement_nested(&mut inner.host_to_ips, &host, &ip);
        decrement_nested(&mut inner.ip_to_hosts, &ip, &host);
        decrement_nested(&mut inner.host_to_status, &host, &status);
        decrement_nested(&mut inner.ip_to_status, &ip, &status);
        decrement_nested(&mut inner.host_to_paths, &host, &path);
        decrement_nested(&mut inner.ip_to_paths, &ip, &path);

        if status != WEBSOCKET_UPGRADE {
            sample_count += 1;
        }
    }

    inner.entries.drain(..count);
    inner.service_times.drain(..sample_count);
    inner.connect_times.drain(..sample_count);
}

/// Decrement-or-no-op: a missing key is treated as already zero
fn decrement<K: Eq + std::hash::Hash>(map: &mut HashMap<K, u64>, key: &K) {
    if let Some(count) = map.get_mut(key) {
        *count = count.saturating_sub(1);
    }
}

fn decrement_nested<A, B>(map: &mut HashMap<A, HashMap<B, u64>>, outer: &A, inner: &B)
where
    A: Eq + std::hash::Hash,
    B: Eq + std::hash::Hash,
{
    if let Some(nested) = map.get_mut(outer) {
        decrement(nested, inner);
    }
}

// ============================================================================
// Query helpers
// ============================================================================

/// Value at sorted index `len * pct / 100`, clamped for small samples
fn percentile(sorted: &[u64], pct: usize) -> u64 {
    let idx = (sorted.len() * pct / 100).min(sorted.len() - 1);
    sorted[idx]
}

fn collect_positive(counts: &HashMap<String, u64>) -> Vec<CountItem> {
    counts
        .iter()
        .filter(|&(_, &count)| count > 0)
        .map(|(label, &count)| CountItem {
            label: label.clone(),
            count,
        })
        .collect()
}

/// Sort by count descending, ties by label ascending for deterministic
/// output, then truncate to the top N
fn rank(mut items: Vec<CountItem>, n: usize) -> Vec<CountItem> {
    items.sort_unstable_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    items.truncate(n);
    items
}

fn other_count(counts: &HashMap<String, u64>, top: &[CountItem]) -> u64 {
    let top_set: HashSet<&str> = top.iter().map(|item| item.label.as_str()).collect();
    counts
        .iter()
        .filter(|&(label, &count)| count > 0 && !top_set.contains(label.as_str()))
        .map(|(_, &count)| count)
        .sum()
}

fn rates_from_status_counts(counts: &HashMap<u16, u64>, total: u64) -> ErrorRates {
    let mut count_4xx = 0u64;
    let mut count_5xx = 0u64;
    for (&status, &count) in counts {
        if (400..500).contains(&status) {
            count_4xx += count;
        } else if (500..600).contains(&status) {
            count_5xx += count;
        }
    }
    percentage_rates(count_4xx, count_5xx, total)
}

/// Rates over a filtered status map, using the map's own positive total
fn filtered_rates(counts: &HashMap<u16, u64>) -> ErrorRates {
    let total: u64 = counts.values().filter(|&&c| c > 0).sum();
    rates_from_status_counts(counts, total)
}

fn percentage_rates(count_4xx: u64, count_5xx: u64, total: u64) -> ErrorRates {
    if total == 0 {
        return ErrorRates::default();
    }
    ErrorRates {
        rate_4xx: count_4xx as f64 * 100.0 / total as f64,
        rate_5xx: count_5xx as f64 * 100.0 / total as f64,
    }
}

fn normalize(label: &mut String) {
    if label.is_empty() {
        label.push_str(UNKNOWN_LABEL);
    }
}
