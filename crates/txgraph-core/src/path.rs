//! Minimum-weight directed paths between accounts.
//!
//! Edge weight is the transferred amount, which the ledger guarantees to be
//! finite and non-negative. Two solvers are provided and must agree on the
//! distance:
//!
//! - [`PathAlgorithm::Dijkstra`]: binary-heap Dijkstra with early exit at the target.
//! - [`PathAlgorithm::LabelCorrecting`]: repeated full relaxation passes over
//!   every labelled user until a pass changes nothing.
//!
//! Neither touches the graph: all per-run marks live in a [`RunState`]
//! allocated by the call, so concurrent readers never observe each other.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::directory::UserIdx;
use crate::error::GraphError;
use crate::graph::TransactionGraph;
use crate::types::{AccountId, Amount, TxRef};

/// Shortest-path solver selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathAlgorithm {
    #[default]
    Dijkstra,
    LabelCorrecting,
}

/// A minimum-weight walk and its total amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    /// Sum of the amounts along the walk.
    pub distance: Amount,
    /// Accounts visited, source first and target last.
    pub accounts: Vec<AccountId>,
    /// Ledger records of the traversed transfers, one fewer than `accounts`.
    pub transactions: Vec<TxRef>,
}

impl PathResult {
    pub fn hops(&self) -> usize {
        self.transactions.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Labeled,
    /// The source: distance 0, never relabelled.
    Origin,
}

/// Per-run overlay of node labels, indexed by [`UserIdx`].
struct RunState {
    mark: Vec<Mark>,
    distance: Vec<Amount>,
    parent: Vec<Option<(UserIdx, TxRef)>>,
}

impl RunState {
    fn new(nodes: usize, origin: UserIdx) -> Self {
        let mut state = Self {
            mark: vec![Mark::Unvisited; nodes],
            distance: vec![0.0; nodes],
            parent: vec![None; nodes],
        };
        state.mark[origin.0] = Mark::Origin;
        state
    }

    /// Label `node` with `candidate` if it is unlabelled or strictly improved.
    fn relax(&mut self, node: UserIdx, candidate: Amount, via: (UserIdx, TxRef)) -> bool {
        let improved = match self.mark[node.0] {
            Mark::Origin => false,
            Mark::Unvisited => true,
            Mark::Labeled => candidate < self.distance[node.0],
        };
        if improved {
            self.mark[node.0] = Mark::Labeled;
            self.distance[node.0] = candidate;
            self.parent[node.0] = Some(via);
        }
        improved
    }

    fn reached(&self, node: UserIdx) -> bool {
        self.mark[node.0] != Mark::Unvisited
    }
}

/// Minimum total amount over directed walks from `from` to `to`.
///
/// Returns `Ok(None)` when `to` is not reachable. A walk from an account to
/// itself has distance 0 and no hops.
///
/// # Errors
///
/// [`GraphError::UserNotFound`] if either account is not registered.
pub fn shortest_path(
    graph: &TransactionGraph,
    from: &str,
    to: &str,
    algorithm: PathAlgorithm,
) -> Result<Option<PathResult>, GraphError> {
    let source = graph.index_of(from)?;
    let target = graph.index_of(to)?;

    let state = match algorithm {
        PathAlgorithm::Dijkstra => dijkstra(graph, source, target),
        PathAlgorithm::LabelCorrecting => label_correcting(graph, source),
    };

    if !state.reached(target) {
        return Ok(None);
    }
    Ok(Some(reconstruct(graph, &state, source, target)))
}

fn dijkstra(graph: &TransactionGraph, source: UserIdx, target: UserIdx) -> RunState {
    let mut state = RunState::new(graph.node_count(), source);
    let mut settled = vec![false; graph.node_count()];
    let mut heap = BinaryHeap::new();
    heap.push(Reverse((OrderedFloat(0.0), source)));
    let mut relaxations = 0usize;

    while let Some(Reverse((OrderedFloat(dist), node))) = heap.pop() {
        if settled[node.0] {
            continue;
        }
        settled[node.0] = true;
        if node == target {
            break;
        }
        for edge in graph.out_edges(node) {
            let candidate = dist + edge.amount;
            if state.relax(edge.peer, candidate, (node, edge.tx)) {
                relaxations += 1;
                heap.push(Reverse((OrderedFloat(candidate), edge.peer)));
            }
        }
    }

    debug!(
        settled = settled.iter().filter(|s| **s).count(),
        relaxations,
        "dijkstra finished"
    );
    state
}

fn label_correcting(graph: &TransactionGraph, source: UserIdx) -> RunState {
    let mut state = RunState::new(graph.node_count(), source);
    let mut passes = 0usize;

    loop {
        passes += 1;
        let mut updates = 0usize;
        for (node, user) in graph.users() {
            if !state.reached(node) {
                continue;
            }
            let base = state.distance[node.0];
            for edge in user.out_edges.edges() {
                if state.relax(edge.peer, base + edge.amount, (node, edge.tx)) {
                    updates += 1;
                }
            }
        }
        if updates == 0 {
            break;
        }
    }

    debug!(passes, "label-correcting relaxation converged");
    state
}

fn reconstruct(
    graph: &TransactionGraph,
    state: &RunState,
    source: UserIdx,
    target: UserIdx,
) -> PathResult {
    let mut accounts = vec![graph.node(target).id.clone()];
    let mut transactions = Vec::new();
    let mut current = target;

    while current != source {
        let Some((parent, tx)) = state.parent[current.0] else {
            break;
        };
        transactions.push(tx);
        accounts.push(graph.node(parent).id.clone());
        current = parent;
    }

    accounts.reverse();
    transactions.reverse();
    PathResult {
        distance: state.distance[target.0],
        accounts,
        transactions,
    }
}
