//! Directed transaction multigraph over the user directory.
//!
//! Every ledger transaction becomes one edge, stored twice: in the sender's
//! out-list and in the receiver's in-list. Both entries reference the single
//! ledger record by [`TxRef`] and cache the peer index and amount needed by
//! traversals. Parallel edges and self-loops are kept as-is.

use serde::Serialize;

use crate::directory::{UserDirectory, UserIdx, UserNode};
use crate::error::GraphError;
use crate::types::{Amount, Transaction, TxRef};

/// One endpoint's view of a transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Ledger record of the transfer.
    pub tx: TxRef,
    /// The other endpoint: receiver for out-edges, sender for in-edges.
    pub peer: UserIdx,
    /// Transferred amount, used as the edge weight.
    pub amount: Amount,
}

/// Adjacency list with running count and amount total.
#[derive(Debug, Clone, Default)]
pub struct EdgeList {
    edges: Vec<Edge>,
    total: Amount,
}

impl EdgeList {
    fn push(&mut self, edge: Edge) {
        self.total += edge.amount;
        self.edges.push(edge);
    }

    /// Number of edges (the degree in this direction).
    pub fn count(&self) -> usize {
        self.edges.len()
    }

    /// Sum of edge amounts (the weighted degree in this direction).
    pub fn total(&self) -> Amount {
        self.total
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Average degrees over all registered users.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DegreeStats {
    pub avg_in: f64,
    pub avg_out: f64,
    pub avg_weighted_in: f64,
    pub avg_weighted_out: f64,
}

/// The user directory plus the edges between its users.
#[derive(Debug, Clone, Default)]
pub struct TransactionGraph {
    directory: UserDirectory,
    edge_count: usize,
}

impl TransactionGraph {
    /// Empty graph whose directory has `bucket_count` buckets.
    pub fn with_buckets(bucket_count: usize) -> Self {
        Self {
            directory: UserDirectory::with_buckets(bucket_count),
            edge_count: 0,
        }
    }

    /// Build a throwaway graph from a stream of ledger records.
    pub fn replay<'a, I>(records: I, bucket_count: usize) -> Self
    where
        I: IntoIterator<Item = (TxRef, &'a Transaction)>,
    {
        let mut graph = Self::with_buckets(bucket_count);
        for (tx_ref, tx) in records {
            graph.connect(tx_ref, tx);
        }
        graph
    }

    /// Register an account, returning its index. Idempotent.
    pub fn register(&mut self, id: &str) -> UserIdx {
        self.directory.insert(id).0
    }

    /// Add the edge for `tx`. Both endpoints must already be registered.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownEndpoint`] naming the first missing endpoint.
    pub fn insert_edge(&mut self, tx_ref: TxRef, tx: &Transaction) -> Result<(), GraphError> {
        let from = self
            .directory
            .find(&tx.from)
            .ok_or_else(|| GraphError::UnknownEndpoint(tx.from.clone()))?;
        let to = self
            .directory
            .find(&tx.to)
            .ok_or_else(|| GraphError::UnknownEndpoint(tx.to.clone()))?;
        self.link(from, to, tx_ref, tx.amount);
        Ok(())
    }

    /// Register both endpoints of `tx` and add its edge.
    pub fn connect(&mut self, tx_ref: TxRef, tx: &Transaction) {
        let from = self.register(&tx.from);
        let to = self.register(&tx.to);
        self.link(from, to, tx_ref, tx.amount);
    }

    fn link(&mut self, from: UserIdx, to: UserIdx, tx: TxRef, amount: Amount) {
        self.directory
            .node_mut(from)
            .out_edges
            .push(Edge { tx, peer: to, amount });
        self.directory
            .node_mut(to)
            .in_edges
            .push(Edge { tx, peer: from, amount });
        self.edge_count += 1;
    }

    /// The node for `id`.
    ///
    /// # Errors
    ///
    /// [`GraphError::UserNotFound`] if `id` is not registered.
    pub fn user(&self, id: &str) -> Result<&UserNode, GraphError> {
        self.directory.lookup(id)
    }

    /// Index for `id`.
    ///
    /// # Errors
    ///
    /// [`GraphError::UserNotFound`] if `id` is not registered.
    pub fn index_of(&self, id: &str) -> Result<UserIdx, GraphError> {
        self.directory
            .find(id)
            .ok_or_else(|| GraphError::UserNotFound(id.to_owned()))
    }

    pub fn node(&self, idx: UserIdx) -> &UserNode {
        self.directory.node(idx)
    }

    /// Outgoing edges of `idx`.
    pub fn out_edges(&self, idx: UserIdx) -> &[Edge] {
        self.directory.node(idx).out_edges.edges()
    }

    /// Incoming edges of `idx`.
    pub fn in_edges(&self, idx: UserIdx) -> &[Edge] {
        self.directory.node(idx).in_edges.edges()
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// Users in directory iteration order.
    pub fn users(&self) -> impl Iterator<Item = (UserIdx, &UserNode)> {
        self.directory.iter()
    }

    pub fn node_count(&self) -> usize {
        self.directory.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Average in/out degree and weighted degree per user.
    ///
    /// All zeros when no user is registered.
    pub fn degree_stats(&self) -> DegreeStats {
        let users = self.node_count();
        if users == 0 {
            return DegreeStats::default();
        }
        let (mut deg_in, mut deg_out, mut amount_in, mut amount_out) = (0usize, 0usize, 0.0, 0.0);
        for (_, node) in self.users() {
            deg_in += node.in_degree();
            deg_out += node.out_degree();
            amount_in += node.in_edges.total();
            amount_out += node.out_edges.total();
        }
        let n = users as f64;
        DegreeStats {
            avg_in: deg_in as f64 / n,
            avg_out: deg_out as f64 / n,
            avg_weighted_in: amount_in / n,
            avg_weighted_out: amount_out / n,
        }
    }
}
