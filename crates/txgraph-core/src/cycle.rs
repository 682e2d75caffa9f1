//! Directed cycle detection.
//!
//! Iterative depth-first search with white/gray/black coloring and an
//! explicit stack, so deep transfer chains cannot overflow the call stack.
//! An edge into a gray node closes a cycle; the gray portion of the stack
//! from that node onward is returned as the witness. Self-transfers are
//! cycles of length one.

use tracing::debug;

use crate::directory::UserIdx;
use crate::graph::TransactionGraph;
use crate::types::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    /// On the current DFS stack.
    Gray,
    Black,
}

/// Whether any directed cycle exists.
pub fn has_cycle(graph: &TransactionGraph) -> bool {
    find_cycle(graph).is_some()
}

/// One directed cycle, if any.
///
/// The accounts are listed in traversal order; the last one transfers back
/// to the first.
pub fn find_cycle(graph: &TransactionGraph) -> Option<Vec<AccountId>> {
    let mut color = vec![Color::White; graph.node_count()];
    // (node, index of the next out-edge to explore)
    let mut stack: Vec<(UserIdx, usize)> = Vec::new();
    let mut visited = 0usize;

    for (root, _) in graph.users() {
        if color[root.0] != Color::White {
            continue;
        }
        color[root.0] = Color::Gray;
        stack.push((root, 0));
        visited += 1;

        while let Some(frame) = stack.last_mut() {
            let (node, position) = *frame;
            let edges = graph.out_edges(node);
            let Some(edge) = edges.get(position) else {
                color[node.0] = Color::Black;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match color[edge.peer.0] {
                Color::White => {
                    color[edge.peer.0] = Color::Gray;
                    stack.push((edge.peer, 0));
                    visited += 1;
                }
                Color::Gray => {
                    if let Some(start) = stack.iter().position(|(n, _)| *n == edge.peer) {
                        let witness: Vec<AccountId> = stack[start..]
                            .iter()
                            .map(|(n, _)| graph.node(*n).id.clone())
                            .collect();
                        debug!(visited, length = witness.len(), "cycle found");
                        return Some(witness);
                    }
                }
                Color::Black => {}
            }
        }
    }

    debug!(visited, "graph is acyclic");
    None
}
