//! Result types returned by store queries
//!
//! Everything here is a value copy. Queries never hand out references into
//! the store's internal maps, so callers can hold results across refresh
//! cycles without a lock.

/// Drill-down filter for ranking and breakdown queries
///
/// Host and IP filters are mutually exclusive by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    None,
    Host(String),
    Ip(String),
}

impl Filter {
    #[must_use]
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Filter::None)
    }
}

/// Latency statistics over the current window
///
/// Percentiles are computed over service times of non-upgrade entries
/// (status 101 is excluded). `sample_count` is the number of latency
/// samples behind the percentile fields; when it is zero the latency
/// fields are defaults, not measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_count: u64,
    pub sample_count: usize,
    pub avg_service_ms: u64,
    pub p50_service_ms: u64,
    pub p95_service_ms: u64,
    pub p99_service_ms: u64,
    pub max_service_ms: u64,
    pub avg_connect_ms: u64,
    pub max_connect_ms: u64,
}

/// A labeled count, sorted descending in ranking results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountItem {
    pub label: String,
    pub count: u64,
}

/// Count for a single status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCountItem {
    pub status: u16,
    pub count: u64,
}

/// 4xx / 5xx rates as percentages of the relevant total
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErrorRates {
    pub rate_4xx: f64,
    pub rate_5xx: f64,
}

/// Unique label counts across the current window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniqueCounts {
    pub hosts: usize,
    pub ips: usize,
    pub paths: usize,
}

/// Error rate trend direction between two adjacent time buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Trend {
    #[default]
    Stable,
    /// Error rate increasing (worsening)
    Up,
    /// Error rate decreasing (improving)
    Down,
}

/// Raw trend signal with the underlying rate difference
///
/// `sufficient` is false when either bucket held fewer than the minimum
/// sample count; `direction` is then `Stable` and `diff` is zero. Callers
/// must treat that as "not enough data", not a measured zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrendReading {
    /// Recent-bucket error rate minus previous-bucket error rate, as a
    /// fraction (0.02 = two percentage points)
    pub diff: f64,
    pub direction: Trend,
    pub sufficient: bool,
}
