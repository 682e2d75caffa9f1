//! Append-only ledger of blocks and the transactions they own.
//!
//! Every transaction record lives exactly once in the ledger's arena; blocks
//! hold [`TxRef`]s into it, and so do the per-user adjacency lists of the
//! transaction graph. The ledger performs only the checks needed to keep its
//! own invariants:
//!
//! - block ids are unique
//! - block timestamps are non-decreasing in append order
//! - a transaction's block exists before the transaction is appended
//! - amounts are finite and non-negative

use std::collections::HashSet;

use tracing::debug;

use crate::constants::{BLOCK_PROGRESS_INTERVAL, TX_PROGRESS_INTERVAL};
use crate::error::{LedgerError, QueryError};
use crate::types::{Block, BlockId, Timestamp, Transaction, TxRef};

/// Ordered, in-memory store of blocks and transactions.
///
/// Not thread-safe for mutation; see [`SharedExplorer`](crate::shared::SharedExplorer)
/// for the reader/writer wrapper.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Blocks in append order.
    blocks: Vec<Block>,
    /// Ids of all appended blocks, for duplicate and existence checks.
    block_ids: HashSet<BlockId>,
    /// Transaction arena in append order.
    transactions: Vec<Transaction>,
    /// Position of the block the last transaction was appended to.
    cursor: usize,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block at the tail.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::DuplicateBlock`] if `id` was already appended
    /// - [`LedgerError::TimestampRegression`] if `timestamp` is below the tail block's
    pub fn append_block(
        &mut self,
        id: BlockId,
        hash: impl Into<String>,
        timestamp: Timestamp,
    ) -> Result<(), LedgerError> {
        if self.block_ids.contains(&id) {
            return Err(LedgerError::DuplicateBlock(id));
        }
        if let Some(previous) = self.last_timestamp() {
            if timestamp < previous {
                return Err(LedgerError::TimestampRegression {
                    block: id,
                    timestamp,
                    previous,
                });
            }
        }

        self.block_ids.insert(id);
        self.blocks.push(Block::new(id, hash, timestamp));

        if self.blocks.len() % BLOCK_PROGRESS_INTERVAL == 0 {
            debug!(blocks = self.blocks.len(), "ledger progress");
        }
        Ok(())
    }

    /// Append a transaction to its owning block and return its arena reference.
    ///
    /// Nothing is modified when an error is returned.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if the amount is negative or not finite
    /// - [`LedgerError::BlockNotFound`] if `tx.block_id` was never appended
    pub fn append_transaction(&mut self, tx: Transaction) -> Result<TxRef, LedgerError> {
        if !tx.amount.is_finite() || tx.amount < 0.0 {
            return Err(LedgerError::InvalidAmount {
                tx_id: tx.tx_id,
                amount: tx.amount,
            });
        }
        let position = self.locate(tx.block_id)?;

        let tx_ref = TxRef(self.transactions.len());
        self.transactions.push(tx);
        self.blocks[position].transactions.push(tx_ref);

        if self.transactions.len() % TX_PROGRESS_INTERVAL == 0 {
            debug!(transactions = self.transactions.len(), "ledger progress");
        }
        Ok(tx_ref)
    }

    /// Check that a transaction would be accepted by [`append_transaction`](Self::append_transaction).
    pub fn check_transaction(&self, tx: &Transaction) -> Result<(), LedgerError> {
        if !tx.amount.is_finite() || tx.amount < 0.0 {
            return Err(LedgerError::InvalidAmount {
                tx_id: tx.tx_id,
                amount: tx.amount,
            });
        }
        if !self.block_ids.contains(&tx.block_id) {
            return Err(LedgerError::BlockNotFound(tx.block_id));
        }
        Ok(())
    }

    /// Find the position of block `id`.
    ///
    /// Streams are expected to be grouped by block, so the search starts at the
    /// cursor and only moves it forward. A block behind the cursor is found by
    /// a bounded scan of the prefix without moving the cursor.
    fn locate(&mut self, id: BlockId) -> Result<usize, LedgerError> {
        if !self.block_ids.contains(&id) {
            return Err(LedgerError::BlockNotFound(id));
        }
        if let Some(offset) = self.blocks[self.cursor..].iter().position(|b| b.id == id) {
            self.cursor += offset;
            return Ok(self.cursor);
        }
        self.blocks[..self.cursor]
            .iter()
            .position(|b| b.id == id)
            .ok_or(LedgerError::BlockNotFound(id))
    }

    /// Lazily iterate transactions whose block timestamp lies in `[start, end]`.
    ///
    /// # Errors
    ///
    /// [`QueryError::InvalidRange`] if `start > end`.
    pub fn scan_range(&self, start: Timestamp, end: Timestamp) -> Result<RangeScan<'_>, QueryError> {
        if start > end {
            return Err(QueryError::InvalidRange { start, end });
        }
        // Timestamps are non-decreasing, so the first block at or after
        // `start` can be found by bisection.
        let first = self.blocks.partition_point(|b| b.timestamp < start);
        Ok(RangeScan::new(self, first, end))
    }

    /// Iterate all transactions whose block timestamp is at most `end`.
    pub fn scan_until(&self, end: Timestamp) -> RangeScan<'_> {
        RangeScan::new(self, 0, end)
    }

    /// Get a transaction by arena reference.
    pub fn transaction(&self, tx_ref: TxRef) -> Option<&Transaction> {
        self.transactions.get(tx_ref.0)
    }

    /// Get a block by id.
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        if !self.block_ids.contains(&id) {
            return None;
        }
        self.blocks.iter().find(|b| b.id == id)
    }

    /// All blocks in append order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// All transactions in append order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Timestamp of the tail block, if any.
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.blocks.last().map(|b| b.timestamp)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Whether no blocks have been appended.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Forward-only scan over the transactions of a timestamp window.
///
/// Cloning a scan or calling [`restart`](RangeScan::restart) replays the window
/// from its first transaction.
#[derive(Debug, Clone)]
pub struct RangeScan<'a> {
    ledger: &'a Ledger,
    first_block: usize,
    block: usize,
    slot: usize,
    end: Timestamp,
}

impl<'a> RangeScan<'a> {
    fn new(ledger: &'a Ledger, first_block: usize, end: Timestamp) -> Self {
        Self {
            ledger,
            first_block,
            block: first_block,
            slot: 0,
            end,
        }
    }

    /// Rewind to the first transaction of the window.
    pub fn restart(&mut self) {
        self.block = self.first_block;
        self.slot = 0;
    }

    /// Like [`Iterator::next`] but also yields the arena reference.
    pub fn next_with_ref(&mut self) -> Option<(TxRef, &'a Transaction)> {
        let ledger = self.ledger;
        loop {
            let block = ledger.blocks.get(self.block)?;
            if block.timestamp > self.end {
                return None;
            }
            if let Some(&tx_ref) = block.transactions.get(self.slot) {
                self.slot += 1;
                return Some((tx_ref, &ledger.transactions[tx_ref.0]));
            }
            self.block += 1;
            self.slot = 0;
        }
    }

    /// Adapt into an iterator over `(TxRef, &Transaction)` pairs.
    pub fn with_refs(self) -> impl Iterator<Item = (TxRef, &'a Transaction)> {
        let mut scan = self;
        std::iter::from_fn(move || scan.next_with_ref())
    }
}

impl<'a> Iterator for RangeScan<'a> {
    type Item = &'a Transaction;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_with_ref().map(|(_, tx)| tx)
    }
}
