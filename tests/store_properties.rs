//! Property-based tests for the aggregation store
//!
//! These verify the bookkeeping invariants that must survive any sequence
//! of inserts and prunes: count conservation across all indices, latency
//! sample alignment, ranking determinism, and co-occurrence symmetry.

use proptest::prelude::*;
use std::time::{Duration, Instant};
use tailstat::parser::Entry;
use tailstat::store::{Filter, Store};

const HOSTS: &[&str] = &["api.example.com", "www.example.com", "cdn.example.com", ""];
const IPS: &[&str] = &["10.0.0.1", "10.0.0.2", "192.0.2.7", ""];
const PATHS: &[&str] = &["/", "/api/users", "/login", ""];
const STATUSES: &[u16] = &[101, 200, 201, 204, 301, 304, 400, 404, 429, 500, 502, 503];

#[derive(Debug, Clone)]
struct EntrySpec {
    status_idx: usize,
    host_idx: usize,
    ip_idx: usize,
    path_idx: usize,
    service_ms: u64,
    /// Whole seconds in the past; specs are sorted so arrival stays
    /// chronological
    age_secs: u64,
}

fn entry_spec() -> impl Strategy<Value = EntrySpec> {
    (
        0..STATUSES.len(),
        0..HOSTS.len(),
        0..IPS.len(),
        0..PATHS.len(),
        0u64..5_000,
        0u64..=120,
    )
        .prop_map(
            |(status_idx, host_idx, ip_idx, path_idx, service_ms, age_secs)| EntrySpec {
                status_idx,
                host_idx,
                ip_idx,
                path_idx,
                service_ms,
                age_secs,
            },
        )
}

fn build_entry(spec: &EntrySpec, now: Instant) -> Entry {
    Entry {
        timestamp: now - Duration::from_secs(spec.age_secs),
        status: STATUSES[spec.status_idx],
        service_ms: spec.service_ms,
        connect_ms: spec.service_ms / 10,
        host: HOSTS[spec.host_idx].to_string(),
        path: PATHS[spec.path_idx].to_string(),
        client_ip: IPS[spec.ip_idx].to_string(),
    }
}

/// Fill a store from specs, oldest first
fn populate(store: &Store, specs: &mut Vec<EntrySpec>) {
    let now = Instant::now();
    specs.sort_by(|a, b| b.age_secs.cmp(&a.age_secs));
    for spec in specs.iter() {
        store.add(build_entry(spec, now));
    }
}

proptest! {
    #[test]
    fn prop_count_conservation(mut specs in prop::collection::vec(entry_spec(), 0..200)) {
        let store = Store::new(None);
        populate(&store, &mut specs);

        let total = store.total_count();
        prop_assert_eq!(total, specs.len() as u64);

        let status_sum: u64 = store
            .status_counts(&Filter::None)
            .iter()
            .map(|item| item.count)
            .sum();
        prop_assert_eq!(status_sum, total);

        let host_sum: u64 = store
            .top_hosts(usize::MAX, &Filter::None)
            .iter()
            .map(|item| item.count)
            .sum();
        prop_assert_eq!(host_sum, total);

        let ip_sum: u64 = store
            .top_ips(usize::MAX, &Filter::None)
            .iter()
            .map(|item| item.count)
            .sum();
        prop_assert_eq!(ip_sum, total);
    }

    #[test]
    fn prop_latency_alignment_after_prune(mut specs in prop::collection::vec(entry_spec(), 0..200)) {
        // Window chosen off the whole-second grid so the prune boundary
        // cannot race the test's own clock reads
        let window = Duration::from_millis(60_500);
        let store = Store::new(Some(window));
        populate(&store, &mut specs);

        store.prune();

        let remaining: Vec<&EntrySpec> =
            specs.iter().filter(|s| s.age_secs <= 60).collect();
        let expected_samples = remaining
            .iter()
            .filter(|s| STATUSES[s.status_idx] != 101)
            .count();

        prop_assert_eq!(store.total_count(), remaining.len() as u64);
        prop_assert_eq!(store.stats().sample_count, expected_samples);
    }

    #[test]
    fn prop_top_n_idempotent(mut specs in prop::collection::vec(entry_spec(), 0..100), n in 1usize..10) {
        let store = Store::new(None);
        populate(&store, &mut specs);

        let first = store.top_hosts(n, &Filter::None);
        let second = store.top_hosts(n, &Filter::None);
        prop_assert_eq!(first, second);

        let first = store.top_ips(n, &Filter::None);
        let second = store.top_ips(n, &Filter::None);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_other_count_complement(mut specs in prop::collection::vec(entry_spec(), 0..200), n in 1usize..5) {
        let store = Store::new(None);
        populate(&store, &mut specs);

        let top = store.top_hosts(n, &Filter::None);
        let top_sum: u64 = top.iter().map(|item| item.count).sum();
        prop_assert_eq!(top_sum + store.other_hosts(&top), store.total_count());

        let top = store.top_ips(n, &Filter::None);
        let top_sum: u64 = top.iter().map(|item| item.count).sum();
        prop_assert_eq!(top_sum + store.other_ips(&top), store.total_count());
    }

    #[test]
    fn prop_filter_symmetry(mut specs in prop::collection::vec(entry_spec(), 1..150)) {
        let store = Store::new(None);
        populate(&store, &mut specs);

        // Every host seen from an IP must report that IP with the same
        // co-occurrence count, and vice versa
        for host_item in store.top_hosts(usize::MAX, &Filter::None) {
            let ips = store.top_ips(usize::MAX, &Filter::Host(host_item.label.clone()));
            for ip_item in &ips {
                let hosts_back =
                    store.top_hosts(usize::MAX, &Filter::Ip(ip_item.label.clone()));
                let back = hosts_back
                    .iter()
                    .find(|h| h.label == host_item.label)
                    .map(|h| h.count);
                prop_assert_eq!(back, Some(ip_item.count));
            }
        }
    }

    #[test]
    fn prop_status_counts_sorted_and_positive(mut specs in prop::collection::vec(entry_spec(), 0..200)) {
        let store = Store::new(None);
        populate(&store, &mut specs);

        let counts = store.status_counts(&Filter::None);
        prop_assert!(counts.windows(2).all(|w| w[0].status < w[1].status));
        prop_assert!(counts.iter().all(|item| item.count > 0));
    }
}
