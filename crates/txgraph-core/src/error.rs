//! Error types for the txgraph engine.
use thiserror::Error;

use crate::types::{BlockId, Timestamp, TxId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("duplicate block: {0}")] DuplicateBlock(BlockId),
    #[error("block not found: {0}")] BlockNotFound(BlockId),
    #[error("timestamp regression at block {block}: {timestamp} < {previous}")] TimestampRegression { block: BlockId, timestamp: Timestamp, previous: Timestamp },
    #[error("invalid amount on tx {tx_id}: {amount}")] InvalidAmount { tx_id: TxId, amount: f64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("user not found: {0}")] UserNotFound(String),
    #[error("edge endpoint not registered: {0}")] UnknownEndpoint(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid range: start {start} > end {end}")] InvalidRange { start: Timestamp, end: Timestamp },
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("malformed record at line {line}: {reason}")] MalformedRecord { line: u64, reason: String },
    #[error("io: {0}")] Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum TxGraphError {
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Graph(#[from] GraphError),
    #[error(transparent)] Query(#[from] QueryError),
    #[error(transparent)] Ingest(#[from] IngestError),
}
