//! Query composition over the ledger and the live transaction graph.
//!
//! [`Explorer`] owns both stores and keeps them consistent: every accepted
//! transaction is in the ledger arena, in its block, and in the adjacency
//! lists of both endpoints. Queries never mutate either store.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::cycle;
use crate::error::{GraphError, LedgerError, TxGraphError};
use crate::graph::{DegreeStats, TransactionGraph};
use crate::ledger::Ledger;
use crate::path::{self, PathResult};
use crate::ranking::{self, DegreeRankings, Metric, RankingEntry, TopK};
use crate::types::{AccountId, Amount, BlockId, Timestamp, Transaction, TxId, TxRef};

/// Activity of one account over a timestamp window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountHistory {
    pub account: AccountId,
    /// Transactions the account sent or received in the window.
    pub total_count: usize,
    pub total_in: Amount,
    pub total_out: Amount,
    /// Largest transfers in the window, descending by amount, ledger order on ties.
    pub top_transfers: Vec<Transaction>,
}

/// Totals of one account up to a cutoff timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountBalance {
    pub account: AccountId,
    pub count: usize,
    pub total_in: Amount,
    pub total_out: Amount,
    /// `total_in - total_out`.
    pub balance: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub blocks: usize,
    pub transactions: usize,
    pub users: usize,
}

/// Running totals for one account over a stream of transactions.
#[derive(Default)]
struct Tally {
    count: usize,
    total_in: Amount,
    total_out: Amount,
}

impl Tally {
    /// Fold `tx` in if it touches `account`. Returns whether it did.
    fn add(&mut self, account: &str, tx: &Transaction) -> bool {
        if !tx.touches(account) {
            return false;
        }
        self.count += 1;
        if tx.to == account {
            self.total_in += tx.amount;
        }
        if tx.from == account {
            self.total_out += tx.amount;
        }
        true
    }
}

/// In-memory ledger plus transaction graph, with the analytical queries.
#[derive(Debug)]
pub struct Explorer {
    ledger: Ledger,
    graph: TransactionGraph,
    config: EngineConfig,
}

impl Default for Explorer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Explorer {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            ledger: Ledger::new(),
            graph: TransactionGraph::with_buckets(config.user_buckets),
            config,
        }
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    /// Append a block.
    ///
    /// # Errors
    ///
    /// [`LedgerError::DuplicateBlock`] or [`LedgerError::TimestampRegression`].
    pub fn ingest_block(
        &mut self,
        id: BlockId,
        hash: impl Into<String>,
        timestamp: Timestamp,
    ) -> Result<(), LedgerError> {
        self.ledger.append_block(id, hash, timestamp)
    }

    /// Record a transfer in the ledger and the graph.
    ///
    /// # Errors
    ///
    /// See [`ingest`](Self::ingest).
    pub fn ingest_transaction(
        &mut self,
        tx_id: TxId,
        block_id: BlockId,
        from: impl Into<AccountId>,
        amount: Amount,
        to: impl Into<AccountId>,
    ) -> Result<TxRef, TxGraphError> {
        self.ingest(Transaction::new(tx_id, block_id, from, amount, to))
    }

    /// Record `tx`: ledger append, endpoint registration, then edge insertion.
    ///
    /// The transaction is validated before anything is written, so a rejected
    /// record leaves the ledger, the directory and the graph unchanged.
    ///
    /// # Errors
    ///
    /// [`LedgerError::BlockNotFound`] or [`LedgerError::InvalidAmount`].
    pub fn ingest(&mut self, tx: Transaction) -> Result<TxRef, TxGraphError> {
        self.ledger.check_transaction(&tx)?;
        let tx_ref = self.ledger.append_transaction(tx)?;
        let record = &self.ledger.transactions()[tx_ref.index()];
        self.graph.register(&record.from);
        self.graph.register(&record.to);
        self.graph.insert_edge(tx_ref, record)?;
        Ok(tx_ref)
    }

    // ------------------------------------------------------------------
    // Account queries
    // ------------------------------------------------------------------

    /// Counts, totals and the `k` largest transfers of `account` with block
    /// timestamp in `[start, end]`.
    ///
    /// # Errors
    ///
    /// - [`QueryError::InvalidRange`](crate::error::QueryError::InvalidRange) if `start > end`
    /// - [`GraphError::UserNotFound`] if `account` never transacted
    pub fn account_history(
        &self,
        account: &str,
        start: Timestamp,
        end: Timestamp,
        k: usize,
    ) -> Result<AccountHistory, TxGraphError> {
        let scan = self.ledger.scan_range(start, end)?;
        self.graph.user(account)?;

        let mut tally = Tally::default();
        let mut top = TopK::new(k);
        for tx in scan {
            if tally.add(account, tx) {
                top.offer(tx.amount, tx);
            }
        }

        debug!(account, start, end, count = tally.count, "account history");
        Ok(AccountHistory {
            account: account.to_owned(),
            total_count: tally.count,
            total_in: tally.total_in,
            total_out: tally.total_out,
            top_transfers: top
                .into_entries()
                .into_iter()
                .map(|(_, tx)| tx.clone())
                .collect(),
        })
    }

    /// Totals of `account` over every block with timestamp at most `end`.
    ///
    /// # Errors
    ///
    /// [`GraphError::UserNotFound`] if `account` never transacted.
    pub fn account_balance(&self, account: &str, end: Timestamp) -> Result<AccountBalance, GraphError> {
        self.graph.user(account)?;

        let mut tally = Tally::default();
        for tx in self.ledger.scan_until(end) {
            tally.add(account, tx);
        }

        Ok(AccountBalance {
            account: account.to_owned(),
            count: tally.count,
            total_in: tally.total_in,
            total_out: tally.total_out,
            balance: tally.total_in - tally.total_out,
        })
    }

    // ------------------------------------------------------------------
    // Rankings
    // ------------------------------------------------------------------

    /// Top `k` accounts by net wealth as of `end`.
    ///
    /// Replays the ledger prefix into a snapshot graph sized by
    /// `snapshot_buckets`; the snapshot is dropped before returning.
    pub fn top_wealth_at(&self, end: Timestamp, k: usize) -> Vec<RankingEntry> {
        let started = Instant::now();
        let snapshot = TransactionGraph::replay(
            self.ledger.scan_until(end).with_refs(),
            self.config.snapshot_buckets,
        );
        let ranking = ranking::rank(&snapshot, Metric::NetWealth, k);
        info!(
            end,
            users = snapshot.node_count(),
            edges = snapshot.edge_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "wealth snapshot ranked"
        );
        ranking
    }

    /// Top `k` accounts by net wealth over the whole ledger.
    pub fn top_wealth(&self, k: usize) -> Vec<RankingEntry> {
        ranking::rank(&self.graph, Metric::NetWealth, k)
    }

    pub fn degree_stats(&self) -> DegreeStats {
        self.graph.degree_stats()
    }

    /// In, out, weighted-in and weighted-out rankings of the top `k` accounts.
    pub fn top_degree(&self, k: usize) -> DegreeRankings {
        ranking::rank_degrees(&self.graph, k)
    }

    // ------------------------------------------------------------------
    // Path analysis
    // ------------------------------------------------------------------

    pub fn has_cycle(&self) -> bool {
        let started = Instant::now();
        let found = cycle::has_cycle(&self.graph);
        info!(found, elapsed_ms = started.elapsed().as_millis() as u64, "cycle search");
        found
    }

    /// Accounts of one directed cycle, if any.
    pub fn find_cycle(&self) -> Option<Vec<AccountId>> {
        cycle::find_cycle(&self.graph)
    }

    /// Minimum-amount directed path using the configured algorithm.
    ///
    /// # Errors
    ///
    /// [`GraphError::UserNotFound`] if either account never transacted.
    pub fn shortest_path(&self, from: &str, to: &str) -> Result<Option<PathResult>, GraphError> {
        let started = Instant::now();
        let result = path::shortest_path(&self.graph, from, to, self.config.path_algorithm)?;
        info!(
            from,
            to,
            algorithm = ?self.config.path_algorithm,
            distance = result.as_ref().map(|p| p.distance),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "shortest path"
        );
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn summary(&self) -> Summary {
        Summary {
            blocks: self.ledger.block_count(),
            transactions: self.ledger.transaction_count(),
            users: self.graph.node_count(),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn graph(&self) -> &TransactionGraph {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ledger record for an arena reference, e.g. one step of a [`PathResult`].
    pub fn transaction(&self, tx_ref: TxRef) -> Option<&Transaction> {
        self.ledger.transaction(tx_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::path::PathAlgorithm;

    fn small_config() -> EngineConfig {
        EngineConfig {
            user_buckets: 64,
            snapshot_buckets: 16,
            ..EngineConfig::default()
        }
    }

    /// A→B 100 at ts 10, B→C 40 at ts 20.
    fn scenario() -> Explorer {
        let mut ex = Explorer::new(small_config());
        ex.ingest_block(1, "h1", 10).unwrap();
        ex.ingest_block(2, "h2", 20).unwrap();
        ex.ingest_transaction(1, 1, "A", 100.0, "B").unwrap();
        ex.ingest_transaction(2, 2, "B", 40.0, "C").unwrap();
        ex
    }

    // --- ingestion ---

    #[test]
    fn ingest_populates_ledger_and_graph() {
        let ex = scenario();
        assert_eq!(
            ex.summary(),
            Summary { blocks: 2, transactions: 2, users: 3 }
        );
        assert_eq!(ex.graph().edge_count(), 2);
        assert_eq!(ex.ledger().blocks()[1].transaction_count(), 1);
    }

    #[test]
    fn rejected_transaction_leaves_state_untouched() {
        let mut ex = scenario();
        let err = ex.ingest_transaction(3, 99, "X", 1.0, "Y").unwrap_err();
        assert!(matches!(err, TxGraphError::Ledger(LedgerError::BlockNotFound(99))));
        let err = ex.ingest_transaction(4, 1, "X", -1.0, "Y").unwrap_err();
        assert!(matches!(err, TxGraphError::Ledger(LedgerError::InvalidAmount { .. })));
        assert_eq!(ex.summary().transactions, 2);
        assert!(ex.graph().user("X").is_err());
        assert!(ex.graph().user("Y").is_err());
    }

    #[test]
    fn duplicate_block_is_rejected() {
        let mut ex = scenario();
        assert_eq!(ex.ingest_block(1, "again", 30), Err(LedgerError::DuplicateBlock(1)));
    }

    // --- account queries ---

    #[test]
    fn balance_in_scenario() {
        let ex = scenario();
        let b = ex.account_balance("B", 20).unwrap();
        assert_eq!(b.count, 2);
        assert_eq!(b.total_in, 100.0);
        assert_eq!(b.total_out, 40.0);
        assert_eq!(b.balance, 60.0);

        let early = ex.account_balance("B", 15).unwrap();
        assert_eq!(early.balance, 100.0);
        assert_eq!(early.count, 1);
    }

    #[test]
    fn balance_before_first_block_is_zero() {
        let ex = scenario();
        let c = ex.account_balance("C", 5).unwrap();
        assert_eq!(c.count, 0);
        assert_eq!(c.balance, 0.0);
    }

    #[test]
    fn history_window_and_top_k() {
        let mut ex = scenario();
        ex.ingest_block(3, "h3", 30).unwrap();
        ex.ingest_transaction(3, 3, "C", 5.0, "B").unwrap();
        ex.ingest_transaction(4, 3, "B", 70.0, "A").unwrap();

        let h = ex.account_history("B", 20, 30, 2).unwrap();
        assert_eq!(h.total_count, 3);
        assert_eq!(h.total_in, 5.0);
        assert_eq!(h.total_out, 110.0);
        let amounts: Vec<f64> = h.top_transfers.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![70.0, 40.0]);
    }

    #[test]
    fn history_ties_keep_ledger_order() {
        let mut ex = Explorer::new(small_config());
        ex.ingest_block(1, "h", 1).unwrap();
        for id in 1..=3 {
            ex.ingest_transaction(id, 1, "A", 10.0, "B").unwrap();
        }
        let h = ex.account_history("A", 0, 1, 2).unwrap();
        let ids: Vec<u64> = h.top_transfers.iter().map(|t| t.tx_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn self_transfer_counts_once_both_directions() {
        let mut ex = Explorer::new(small_config());
        ex.ingest_block(1, "h", 1).unwrap();
        ex.ingest_transaction(1, 1, "A", 7.0, "A").unwrap();
        let b = ex.account_balance("A", 1).unwrap();
        assert_eq!(b.count, 1);
        assert_eq!(b.total_in, 7.0);
        assert_eq!(b.total_out, 7.0);
        assert_eq!(b.balance, 0.0);
    }

    #[test]
    fn query_errors() {
        let ex = scenario();
        assert!(matches!(
            ex.account_history("A", 20, 10, 3),
            Err(TxGraphError::Query(QueryError::InvalidRange { start: 20, end: 10 }))
        ));
        assert!(matches!(
            ex.account_history("Z", 0, 10, 3),
            Err(TxGraphError::Graph(GraphError::UserNotFound(_)))
        ));
        assert_eq!(
            ex.account_balance("Z", 10),
            Err(GraphError::UserNotFound("Z".into()))
        );
    }

    // --- rankings ---

    #[test]
    fn top_wealth_at_scenario() {
        let ex = scenario();
        assert_eq!(
            ex.top_wealth_at(20, 1),
            vec![RankingEntry { account: "B".into(), metric: 60.0 }]
        );
        // At ts 10 only A→B exists.
        let at_ten = ex.top_wealth_at(10, 3);
        assert_eq!(at_ten.len(), 2);
        assert_eq!(at_ten[0], RankingEntry { account: "B".into(), metric: 100.0 });
        assert_eq!(at_ten[1].metric, -100.0);
        assert!(ex.top_wealth_at(5, 3).is_empty());
    }

    #[test]
    fn top_wealth_matches_snapshot_at_tail() {
        let ex = scenario();
        assert_eq!(ex.top_wealth(3).len(), 3);
        assert_eq!(ex.top_wealth(1), ex.top_wealth_at(20, 1));
        assert!(ex.top_wealth(0).is_empty());
    }

    #[test]
    fn degree_queries() {
        let ex = scenario();
        let stats = ex.degree_stats();
        assert!((stats.avg_out - 2.0 / 3.0).abs() < 1e-12);
        let top = ex.top_degree(1);
        assert_eq!(top.weighted_in[0], RankingEntry { account: "B".into(), metric: 100.0 });
        assert_eq!(top.weighted_out[0].account, "A");
    }

    // --- path analysis ---

    #[test]
    fn shortest_path_scenario() {
        let ex = scenario();
        let path = ex.shortest_path("A", "C").unwrap().unwrap();
        assert_eq!(path.distance, 140.0);
        let ids: Vec<u64> = path
            .transactions
            .iter()
            .map(|r| ex.transaction(*r).unwrap().tx_id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(ex.shortest_path("C", "A").unwrap(), None);
    }

    #[test]
    fn label_correcting_config_gives_same_distance() {
        let mut ex = Explorer::new(small_config().with_path_algorithm(PathAlgorithm::LabelCorrecting));
        ex.ingest_block(1, "h", 10).unwrap();
        ex.ingest_transaction(1, 1, "A", 100.0, "B").unwrap();
        ex.ingest_transaction(2, 1, "B", 40.0, "C").unwrap();
        assert_eq!(ex.shortest_path("A", "C").unwrap().unwrap().distance, 140.0);
    }

    #[test]
    fn cycle_round_trip() {
        let mut ex = Explorer::new(small_config());
        ex.ingest_block(1, "h", 1).unwrap();
        ex.ingest_transaction(1, 1, "A", 10.0, "B").unwrap();
        ex.ingest_transaction(2, 1, "B", 5.0, "C").unwrap();
        assert!(!ex.has_cycle());
        ex.ingest_transaction(3, 1, "C", 3.0, "A").unwrap();
        assert!(ex.has_cycle());
        assert_eq!(ex.find_cycle().unwrap().len(), 3);
    }
}
