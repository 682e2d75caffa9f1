//! Bounded top-k selection over per-user metrics.
//!
//! [`TopK`] keeps at most `k` entries sorted by descending metric. A candidate
//! is placed before the first entry whose metric is strictly lower, looking
//! at no more than `k` positions; if none qualifies it is not a top-k member.
//! Ties therefore keep the earlier candidate ahead. One pass over `n` users
//! costs O(n·k).

use serde::{Deserialize, Serialize};

use crate::directory::UserNode;
use crate::graph::TransactionGraph;
use crate::types::AccountId;

/// Descending bounded list of `(metric, item)` pairs.
#[derive(Debug, Clone)]
pub struct TopK<T> {
    k: usize,
    entries: Vec<(f64, T)>,
}

impl<T> TopK<T> {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            entries: Vec::with_capacity(k.min(1024) + 1),
        }
    }

    /// Offer a candidate. Returns whether it entered the list.
    pub fn offer(&mut self, metric: f64, item: T) -> bool {
        for position in 0..self.k {
            match self.entries.get(position) {
                None => {
                    self.entries.push((metric, item));
                    return true;
                }
                Some((current, _)) if *current < metric => {
                    self.entries.insert(position, (metric, item));
                    self.entries.truncate(self.k);
                    return true;
                }
                Some(_) => {}
            }
        }
        false
    }

    /// Entries in descending order.
    pub fn entries(&self) -> &[(f64, T)] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<(f64, T)> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.k
    }
}

/// One row of a ranking result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub account: AccountId,
    pub metric: f64,
}

/// Per-user quantities the ranking queries order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    InDegree,
    OutDegree,
    WeightedIn,
    WeightedOut,
    /// Weighted in minus weighted out.
    NetWealth,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::InDegree,
        Metric::OutDegree,
        Metric::WeightedIn,
        Metric::WeightedOut,
        Metric::NetWealth,
    ];

    pub fn value(&self, node: &UserNode) -> f64 {
        match self {
            Metric::InDegree => node.in_degree() as f64,
            Metric::OutDegree => node.out_degree() as f64,
            Metric::WeightedIn => node.in_edges.total(),
            Metric::WeightedOut => node.out_edges.total(),
            Metric::NetWealth => node.net_wealth(),
        }
    }
}

/// Top `k` users of `graph` by `metric`.
pub fn rank(graph: &TransactionGraph, metric: Metric, k: usize) -> Vec<RankingEntry> {
    rank_by(graph, k, |node| metric.value(node))
}

/// Top `k` users of `graph` by an arbitrary extractor.
pub fn rank_by<F>(graph: &TransactionGraph, k: usize, extract: F) -> Vec<RankingEntry>
where
    F: Fn(&UserNode) -> f64,
{
    let mut top = TopK::new(k);
    for (_, node) in graph.users() {
        top.offer(extract(node), node);
    }
    into_ranking(top)
}

fn into_ranking(top: TopK<&UserNode>) -> Vec<RankingEntry> {
    top.into_entries()
        .into_iter()
        .map(|(metric, node)| RankingEntry {
            account: node.id.clone(),
            metric,
        })
        .collect()
}

/// The four degree rankings, computed in one pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DegreeRankings {
    pub in_degree: Vec<RankingEntry>,
    pub out_degree: Vec<RankingEntry>,
    pub weighted_in: Vec<RankingEntry>,
    pub weighted_out: Vec<RankingEntry>,
}

pub fn rank_degrees(graph: &TransactionGraph, k: usize) -> DegreeRankings {
    let mut in_degree = TopK::new(k);
    let mut out_degree = TopK::new(k);
    let mut weighted_in = TopK::new(k);
    let mut weighted_out = TopK::new(k);
    for (_, node) in graph.users() {
        in_degree.offer(Metric::InDegree.value(node), node);
        out_degree.offer(Metric::OutDegree.value(node), node);
        weighted_in.offer(Metric::WeightedIn.value(node), node);
        weighted_out.offer(Metric::WeightedOut.value(node), node);
    }
    DegreeRankings {
        in_degree: into_ranking(in_degree),
        out_degree: into_ranking(out_degree),
        weighted_in: into_ranking(weighted_in),
        weighted_out: into_ranking(weighted_out),
    }
}
