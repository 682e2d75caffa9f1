//! # txgraph-core
//! In-memory ledger and transaction graph analytics.
//!
//! Blocks and transfers are ingested into an append-only [`Ledger`]; each
//! transfer also becomes an edge of the [`TransactionGraph`] between two
//! accounts of the [`UserDirectory`]. The [`Explorer`] composes both into
//! account histories, balances, rankings, shortest paths and cycle checks.

pub mod config;
pub mod constants;
pub mod cycle;
pub mod directory;
pub mod error;
pub mod explorer;
pub mod graph;
pub mod ingest;
pub mod ledger;
pub mod path;
pub mod ranking;
pub mod shared;
pub mod types;

pub use config::EngineConfig;
pub use directory::{UserDirectory, UserIdx, UserNode};
pub use error::{GraphError, IngestError, LedgerError, QueryError, TxGraphError};
pub use explorer::{AccountBalance, AccountHistory, Explorer, Summary};
pub use graph::{DegreeStats, TransactionGraph};
pub use ingest::IngestReport;
pub use ledger::Ledger;
pub use path::{PathAlgorithm, PathResult};
pub use ranking::{DegreeRankings, Metric, RankingEntry, TopK};
pub use shared::SharedExplorer;
pub use types::{AccountId, Amount, Block, BlockId, Timestamp, Transaction, TxId, TxRef};
