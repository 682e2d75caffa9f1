//! Criterion benchmarks for txgraph-core query paths.
//!
//! Covers: top-k ranking, point-in-time wealth snapshots, shortest path with
//! both solvers, and cycle detection.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use txgraph_core::config::EngineConfig;
use txgraph_core::explorer::Explorer;
use txgraph_core::path::{shortest_path, PathAlgorithm};
use txgraph_core::ranking::{rank, Metric};

const USERS: usize = 2_000;
const BLOCKS: u64 = 200;
const TXS_PER_BLOCK: u64 = 50;

/// Random acyclic ledger: transfers only go from lower to higher user ids.
fn random_explorer(seed: u64) -> Explorer {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ex = Explorer::new(EngineConfig {
        user_buckets: 4_096,
        snapshot_buckets: 1_024,
        ..EngineConfig::default()
    });
    let mut tx_id = 0;
    for block in 0..BLOCKS {
        ex.ingest_block(block, format!("{block:064x}"), 1_000 + block * 10)
            .expect("fresh block");
        for _ in 0..TXS_PER_BLOCK {
            let a = rng.gen_range(0..USERS - 1);
            let b = rng.gen_range(a + 1..USERS);
            let amount = rng.gen_range(0.01..100.0);
            ex.ingest_transaction(tx_id, block, format!("u{a}"), amount, format!("u{b}"))
                .expect("known block");
            tx_id += 1;
        }
    }
    ex
}

fn bench_rankings(c: &mut Criterion) {
    let ex = random_explorer(1);

    c.bench_function("rank_net_wealth_top10", |b| {
        b.iter(|| rank(ex.graph(), Metric::NetWealth, black_box(10)))
    });
    c.bench_function("top_degree_top10", |b| b.iter(|| ex.top_degree(black_box(10))));
    c.bench_function("top_wealth_at_midpoint", |b| {
        b.iter(|| ex.top_wealth_at(black_box(1_000 + BLOCKS * 5), 10))
    });
}

fn bench_shortest_path(c: &mut Criterion) {
    let ex = random_explorer(2);
    let last = format!("u{}", USERS - 1);

    c.bench_function("shortest_path_dijkstra", |b| {
        b.iter(|| shortest_path(ex.graph(), black_box("u0"), &last, PathAlgorithm::Dijkstra))
    });
    c.bench_function("shortest_path_label_correcting", |b| {
        b.iter(|| {
            shortest_path(ex.graph(), black_box("u0"), &last, PathAlgorithm::LabelCorrecting)
        })
    });
}

fn bench_cycle(c: &mut Criterion) {
    let ex = random_explorer(3);

    c.bench_function("find_cycle_acyclic", |b| b.iter(|| ex.find_cycle()));
}

criterion_group!(benches, bench_rankings, bench_shortest_path, bench_cycle);
criterion_main!(benches);
