//! Core ledger types: blocks, transactions, arena references.
//!
//! Amounts are non-negative decimals carried as `f64`. Account identifiers
//! are opaque strings compared by byte equality.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Externally assigned block identifier.
pub type BlockId = u64;

/// Externally assigned transaction identifier. Not unique: repeated ids are kept.
pub type TxId = u64;

/// Block timestamp (seconds). Non-decreasing in ledger order.
pub type Timestamp = u64;

/// Transferred value.
pub type Amount = f64;

/// Account identifier as it appears in the ledger.
pub type AccountId = String;

/// Stable index of a transaction record in the ledger arena.
///
/// Block transaction lists and per-user adjacency lists hold these instead of
/// owning copies of the record.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxRef(pub(crate) usize);

impl TxRef {
    /// Position of the record in ingestion order.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A value transfer between two accounts, recorded in exactly one block.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Transaction {
    /// Transaction identifier.
    pub tx_id: TxId,
    /// Owning block.
    pub block_id: BlockId,
    /// Sending account.
    pub from: AccountId,
    /// Transferred value (non-negative, finite).
    pub amount: Amount,
    /// Receiving account.
    pub to: AccountId,
}

impl Transaction {
    pub fn new(
        tx_id: TxId,
        block_id: BlockId,
        from: impl Into<AccountId>,
        amount: Amount,
        to: impl Into<AccountId>,
    ) -> Self {
        Self {
            tx_id,
            block_id,
            from: from.into(),
            amount,
            to: to.into(),
        }
    }

    /// Whether the sender and receiver are the same account.
    pub fn is_self_transfer(&self) -> bool {
        self.from == self.to
    }

    /// Whether `account` is the sender or the receiver.
    pub fn touches(&self, account: &str) -> bool {
        self.from == account || self.to == account
    }
}

/// A ledger block and the transactions it owns, in append order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Block identifier, unique within a ledger.
    pub id: BlockId,
    /// Opaque block hash.
    pub hash: String,
    /// Block timestamp.
    pub timestamp: Timestamp,
    /// Arena references of the transactions recorded in this block.
    pub transactions: Vec<TxRef>,
}

impl Block {
    pub fn new(id: BlockId, hash: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            id,
            hash: hash.into(),
            timestamp,
            transactions: Vec::new(),
        }
    }

    /// Number of transactions recorded in this block.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}
