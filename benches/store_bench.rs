//! Benchmarks for the aggregation store hot paths

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::{Duration, Instant};
use tailstat::parser::Entry;
use tailstat::store::{Filter, Store};

fn sample_entry(i: usize) -> Entry {
    Entry {
        timestamp: Instant::now(),
        status: [200u16, 200, 200, 404, 500][i % 5],
        service_ms: (i % 500) as u64,
        connect_ms: 1,
        host: format!("host-{}.example.com", i % 20),
        path: format!("/api/resource/{}", i % 50),
        client_ip: format!("10.0.{}.{}", i % 8, i % 250),
    }
}

fn populated_store(n: usize) -> Store {
    let store = Store::new(None);
    for i in 0..n {
        store.add(sample_entry(i));
    }
    store
}

fn bench_add(c: &mut Criterion) {
    c.bench_function("store_add", |b| {
        let store = Store::new(Some(Duration::from_secs(300)));
        let mut i = 0;
        b.iter(|| {
            store.add(black_box(sample_entry(i)));
            i += 1;
        });
    });
}

fn bench_stats(c: &mut Criterion) {
    let store = populated_store(10_000);
    c.bench_function("store_stats_10k", |b| {
        b.iter(|| black_box(store.stats()));
    });
}

fn bench_top_hosts(c: &mut Criterion) {
    let store = populated_store(10_000);
    c.bench_function("store_top_hosts_10k", |b| {
        b.iter(|| black_box(store.top_hosts(15, &Filter::None)));
    });
}

fn bench_trend(c: &mut Criterion) {
    let store = populated_store(10_000);
    c.bench_function("store_trend_10k", |b| {
        b.iter(|| black_box(store.trend_with_diff(Duration::from_secs(60))));
    });
}

criterion_group!(benches, bench_add, bench_stats, bench_top_hosts, bench_trend);
criterion_main!(benches);
