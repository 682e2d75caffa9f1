//! Shared builders and reference implementations for integration tests.

use std::collections::VecDeque;

use txgraph_core::{EngineConfig, Explorer, Timestamp};

/// One randomly generated transfer between numbered accounts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSpec {
    pub from: usize,
    pub to: usize,
    pub amount: f64,
    /// Index into the block list; reduced modulo its length.
    pub block: usize,
}

/// Account name for node `i`.
pub fn account(i: usize) -> String {
    format!("acct-{i}")
}

/// Engine sizing small enough that buckets collide in tests.
pub fn small_config() -> EngineConfig {
    EngineConfig {
        user_buckets: 7,
        snapshot_buckets: 5,
        ..EngineConfig::default()
    }
}

/// Block `i` gets id `i + 1` and the `i`-th smallest timestamp.
pub fn sorted_timestamps(mut timestamps: Vec<Timestamp>) -> Vec<Timestamp> {
    timestamps.sort_unstable();
    timestamps
}

/// Ingest the given blocks (timestamps must be sorted) and transfers.
pub fn build_explorer(config: EngineConfig, timestamps: &[Timestamp], edges: &[EdgeSpec]) -> Explorer {
    let mut explorer = Explorer::new(config);
    for (i, ts) in timestamps.iter().enumerate() {
        explorer
            .ingest_block(i as u64 + 1, format!("hash-{i}"), *ts)
            .expect("sorted timestamps and unique ids");
    }
    for (i, edge) in edges.iter().enumerate() {
        let block = (edge.block % timestamps.len().max(1)) as u64 + 1;
        explorer
            .ingest_transaction(i as u64, block, account(edge.from), edge.amount, account(edge.to))
            .expect("block exists and amount is valid");
    }
    explorer
}

/// Timestamp of the block an edge lands in.
pub fn edge_timestamp(timestamps: &[Timestamp], edge: &EdgeSpec) -> Timestamp {
    timestamps[edge.block % timestamps.len()]
}

/// `(count, total_in, total_out)` of `node` over edges with block timestamp at most `end`.
pub fn reference_balance(
    timestamps: &[Timestamp],
    edges: &[EdgeSpec],
    node: usize,
    end: Timestamp,
) -> (usize, f64, f64) {
    let mut count = 0;
    let (mut total_in, mut total_out) = (0.0, 0.0);
    for edge in edges.iter().filter(|e| edge_timestamp(timestamps, e) <= end) {
        if edge.from != node && edge.to != node {
            continue;
        }
        count += 1;
        if edge.to == node {
            total_in += edge.amount;
        }
        if edge.from == node {
            total_out += edge.amount;
        }
    }
    (count, total_in, total_out)
}

/// Bellman-Ford distances from `source` over `nodes` numbered accounts.
pub fn reference_distances(nodes: usize, edges: &[EdgeSpec], source: usize) -> Vec<Option<f64>> {
    let mut dist: Vec<Option<f64>> = vec![None; nodes];
    dist[source] = Some(0.0);
    for _ in 0..nodes {
        let mut changed = false;
        for edge in edges {
            if let Some(base) = dist[edge.from] {
                let candidate = base + edge.amount;
                if dist[edge.to].is_none_or(|d| candidate < d) {
                    dist[edge.to] = Some(candidate);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    dist
}

/// Kahn's algorithm: a cycle exists iff some node is never freed.
pub fn reference_has_cycle(nodes: usize, edges: &[EdgeSpec]) -> bool {
    let mut indegree = vec![0usize; nodes];
    let mut out: Vec<Vec<usize>> = vec![Vec::new(); nodes];
    for edge in edges {
        indegree[edge.to] += 1;
        out[edge.from].push(edge.to);
    }
    let mut queue: VecDeque<usize> = (0..nodes).filter(|n| indegree[*n] == 0).collect();
    let mut freed = 0;
    while let Some(node) = queue.pop_front() {
        freed += 1;
        for &next in &out[node] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }
    freed < nodes
}

/// Whether node `i` appears as an endpoint of any edge.
pub fn is_registered(edges: &[EdgeSpec], node: usize) -> bool {
    edges.iter().any(|e| e.from == node || e.to == node)
}
