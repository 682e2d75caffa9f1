//! CSV loaders for block and transaction files.
//!
//! Columns are positional and the first row is a header:
//!
//! - blocks: `block_id, hash, timestamp`
//! - transactions: `tx_id, block_id, from, amount, to`
//!
//! A row with the wrong number of columns, an unparseable number or an empty
//! text column is malformed. Malformed rows and rows the explorer rejects are
//! logged, counted and skipped; loading continues with the next row. Only I/O
//! failures abort.

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::IngestError;
use crate::explorer::Explorer;
use crate::types::{AccountId, Amount, BlockId, Timestamp, Transaction, TxId};

/// One row of a block file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockRecord {
    pub block_id: BlockId,
    pub hash: String,
    pub timestamp: Timestamp,
}

/// One row of a transaction file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionRecord {
    pub tx_id: TxId,
    pub block_id: BlockId,
    pub from: AccountId,
    pub amount: Amount,
    pub to: AccountId,
}

/// A positional CSV row.
trait Row: DeserializeOwned {
    const COLUMNS: usize;

    /// Name of the first text column left empty, if any.
    fn blank_column(&self) -> Option<&'static str>;
}

impl Row for BlockRecord {
    const COLUMNS: usize = 3;

    fn blank_column(&self) -> Option<&'static str> {
        self.hash.is_empty().then_some("hash")
    }
}

impl Row for TransactionRecord {
    const COLUMNS: usize = 5;

    fn blank_column(&self) -> Option<&'static str> {
        if self.from.is_empty() {
            Some("from")
        } else if self.to.is_empty() {
            Some("to")
        } else {
            None
        }
    }
}

impl From<TransactionRecord> for Transaction {
    fn from(r: TransactionRecord) -> Self {
        Transaction::new(r.tx_id, r.block_id, r.from, r.amount, r.to)
    }
}

/// Outcome of loading one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Rows applied to the explorer.
    pub accepted: usize,
    /// Well-formed rows the explorer rejected.
    pub skipped: usize,
    /// Rows that could not be decoded.
    pub malformed: usize,
}

impl IngestReport {
    fn record(&mut self, accepted: bool) {
        if accepted {
            self.accepted += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Decode `raw` as `T`, checking the column count and empty text columns.
fn decode<T: Row>(raw: &csv::StringRecord, line: u64) -> Result<T, IngestError> {
    let malformed = |reason: String| IngestError::MalformedRecord { line, reason };
    if raw.len() != T::COLUMNS {
        return Err(malformed(format!("expected {} columns, found {}", T::COLUMNS, raw.len())));
    }
    let row: T = raw.deserialize(None).map_err(|err| malformed(err.to_string()))?;
    match row.blank_column() {
        Some(column) => Err(malformed(format!("empty {column}"))),
        None => Ok(row),
    }
}

fn reader<R: io::Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source)
}

/// Decode every row of `source` as `T` and hand it to `apply`.
///
/// `apply` returns whether the row was accepted.
fn for_each_row<R, T, F>(source: R, kind: &'static str, mut apply: F) -> Result<IngestReport, IngestError>
where
    R: io::Read,
    T: Row,
    F: FnMut(T, u64) -> bool,
{
    let mut report = IngestReport::default();
    let mut rows = reader(source);
    let mut raw = csv::StringRecord::new();

    loop {
        match rows.read_record(&mut raw) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                let line = err.position().map_or(0, |p| p.line());
                if let csv::ErrorKind::Io(io_err) = err.into_kind() {
                    return Err(IngestError::Io(io_err));
                }
                warn!(kind, line, "unreadable row skipped");
                report.malformed += 1;
                continue;
            }
        }
        let line = raw.position().map_or(0, |p| p.line());
        match decode::<T>(&raw, line) {
            Ok(row) => report.record(apply(row, line)),
            Err(err) => {
                warn!(kind, %err, "row skipped");
                report.malformed += 1;
            }
        }
    }
    Ok(report)
}

/// Load block rows from `source` into `explorer`.
///
/// # Errors
///
/// [`IngestError::Io`] if reading `source` fails.
pub fn load_blocks<R: io::Read>(explorer: &mut Explorer, source: R) -> Result<IngestReport, IngestError> {
    for_each_row(source, "block", |row: BlockRecord, line| {
        match explorer.ingest_block(row.block_id, row.hash, row.timestamp) {
            Ok(()) => true,
            Err(err) => {
                warn!(line, %err, "block rejected");
                false
            }
        }
    })
}

/// Load transaction rows from `source` into `explorer`.
///
/// May be called again on a populated explorer to append more transfers.
///
/// # Errors
///
/// [`IngestError::Io`] if reading `source` fails.
pub fn load_transactions<R: io::Read>(
    explorer: &mut Explorer,
    source: R,
) -> Result<IngestReport, IngestError> {
    for_each_row(source, "transaction", |row: TransactionRecord, line| {
        match explorer.ingest(row.into()) {
            Ok(_) => true,
            Err(err) => {
                warn!(line, %err, "transaction rejected");
                false
            }
        }
    })
}

/// [`load_blocks`] over a file path.
///
/// # Errors
///
/// [`IngestError::Io`] if the file cannot be opened or read.
pub fn load_blocks_file(explorer: &mut Explorer, path: impl AsRef<Path>) -> Result<IngestReport, IngestError> {
    let path = path.as_ref();
    let started = Instant::now();
    let report = load_blocks(explorer, File::open(path)?)?;
    info!(
        path = %path.display(),
        accepted = report.accepted,
        skipped = report.skipped,
        malformed = report.malformed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "blocks loaded"
    );
    Ok(report)
}

/// [`load_transactions`] over a file path.
///
/// # Errors
///
/// [`IngestError::Io`] if the file cannot be opened or read.
pub fn load_transactions_file(
    explorer: &mut Explorer,
    path: impl AsRef<Path>,
) -> Result<IngestReport, IngestError> {
    let path = path.as_ref();
    let started = Instant::now();
    let report = load_transactions(explorer, File::open(path)?)?;
    info!(
        path = %path.display(),
        accepted = report.accepted,
        skipped = report.skipped,
        malformed = report.malformed,
        users = explorer.graph().node_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "transactions loaded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::config::EngineConfig;

    const BLOCKS: &str = "\
block_id,hash,timestamp
1,00000000839a8e6886ab5951d76f411475428afc90947ee320161bbf18eb6048,1231469665
2, 000000006a625f06636b8bb6ac7b960a8d03705d1ace08b1a19da3fdcc99ddbd ,1231469744
";

    const TXS: &str = "\
tx_id,block_id,from,amount,to
10,1,alice,50.5,bob
11,2,bob,20,carol
";

    fn explorer() -> Explorer {
        Explorer::new(EngineConfig {
            user_buckets: 64,
            snapshot_buckets: 16,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn loads_blocks_and_transactions() {
        let mut ex = explorer();
        let blocks = load_blocks(&mut ex, BLOCKS.as_bytes()).unwrap();
        assert_eq!(blocks, IngestReport { accepted: 2, ..IngestReport::default() });
        let txs = load_transactions(&mut ex, TXS.as_bytes()).unwrap();
        assert_eq!(txs, IngestReport { accepted: 2, ..IngestReport::default() });

        assert_eq!(ex.ledger().blocks()[1].hash.len(), 64);
        assert_eq!(ex.account_balance("bob", u64::MAX).unwrap().balance, 30.5);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let mut ex = explorer();
        load_blocks(&mut ex, BLOCKS.as_bytes()).unwrap();
        let input = "\
tx_id,block_id,from,amount,to
1,1,alice,not-a-number,bob
2,1,alice
3,1,alice,5,bob
";
        let report = load_transactions(&mut ex, input.as_bytes()).unwrap();
        assert_eq!(report, IngestReport { accepted: 1, skipped: 0, malformed: 2 });
        assert_eq!(ex.summary().transactions, 1);
    }

    #[test]
    fn empty_and_extra_columns_are_malformed() {
        let mut ex = explorer();
        let blocks = "block_id,hash,timestamp\n1,,10\n2,h2,20,extra\n3,h3,30\n";
        assert_eq!(
            load_blocks(&mut ex, blocks.as_bytes()).unwrap(),
            IngestReport { accepted: 1, skipped: 0, malformed: 2 }
        );
        assert_eq!(ex.summary().blocks, 1);

        let txs = "\
tx_id,block_id,from,amount,to
1,3,,5,bob
2,3,alice,5,
3,3,alice,5,bob,extra
4,3,alice,5,bob
";
        assert_eq!(
            load_transactions(&mut ex, txs.as_bytes()).unwrap(),
            IngestReport { accepted: 1, skipped: 0, malformed: 3 }
        );
        assert_eq!(ex.summary().users, 2);
        assert!(ex.graph().user("").is_err());
    }

    #[test]
    fn decode_reports_line_and_reason() {
        let raw = csv::StringRecord::from(vec!["7", "1", "alice", "5"]);
        match decode::<TransactionRecord>(&raw, 4) {
            Err(IngestError::MalformedRecord { line, reason }) => {
                assert_eq!(line, 4);
                assert_eq!(reason, "expected 5 columns, found 4");
            }
            other => panic!("expected a malformed record, got {other:?}"),
        }

        let raw = csv::StringRecord::from(vec!["7", "", "10"]);
        assert!(matches!(
            decode::<BlockRecord>(&raw, 2),
            Err(IngestError::MalformedRecord { line: 2, .. })
        ));
        let raw = csv::StringRecord::from(vec!["7", "h", "10"]);
        assert_eq!(
            decode::<BlockRecord>(&raw, 2).unwrap(),
            BlockRecord { block_id: 7, hash: "h".into(), timestamp: 10 }
        );
    }

    #[test]
    fn rejected_rows_are_skipped() {
        let mut ex = explorer();
        load_blocks(&mut ex, BLOCKS.as_bytes()).unwrap();
        // Duplicate block id and a timestamp regression.
        let again = "block_id,hash,timestamp\n1,dup,1231469999\n3,old,5\n";
        assert_eq!(
            load_blocks(&mut ex, again.as_bytes()).unwrap(),
            IngestReport { accepted: 0, skipped: 2, malformed: 0 }
        );
        // Unknown block and a negative amount.
        let txs = "tx_id,block_id,from,amount,to\n1,42,a,1,b\n2,1,a,-3,b\n";
        assert_eq!(
            load_transactions(&mut ex, txs.as_bytes()).unwrap(),
            IngestReport { accepted: 0, skipped: 2, malformed: 0 }
        );
        assert_eq!(ex.summary().users, 0);
    }

    #[test]
    fn header_only_file_is_empty() {
        let mut ex = explorer();
        let report = load_blocks(&mut ex, "block_id,hash,timestamp\n".as_bytes()).unwrap();
        assert_eq!(report, IngestReport::default());
    }

    #[test]
    fn appending_a_second_transaction_file() {
        let mut ex = explorer();
        load_blocks(&mut ex, BLOCKS.as_bytes()).unwrap();
        load_transactions(&mut ex, TXS.as_bytes()).unwrap();
        let more = "tx_id,block_id,from,amount,to\n12,1,carol,1,alice\n";
        load_transactions(&mut ex, more.as_bytes()).unwrap();
        assert_eq!(ex.summary().transactions, 3);
        assert!(ex.has_cycle());
    }

    #[test]
    fn file_helpers_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let blocks_path = dir.path().join("blocks.csv");
        let txs_path = dir.path().join("txs.csv");
        File::create(&blocks_path).unwrap().write_all(BLOCKS.as_bytes()).unwrap();
        File::create(&txs_path).unwrap().write_all(TXS.as_bytes()).unwrap();

        let mut ex = explorer();
        assert_eq!(load_blocks_file(&mut ex, &blocks_path).unwrap().accepted, 2);
        assert_eq!(load_transactions_file(&mut ex, &txs_path).unwrap().accepted, 2);
        assert_eq!(ex.summary().users, 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut ex = explorer();
        let err = load_blocks_file(&mut ex, dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, IngestError::Io(_)));
    }
}
