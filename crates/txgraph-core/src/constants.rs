//! Engine constants.

/// Initial value of the directory's rolling string hash.
pub const HASH_SEED: u32 = 5381;

/// Multiplier of the directory's rolling string hash (`h * 33 + byte`).
pub const HASH_MULTIPLIER: u32 = 33;

/// Bucket count of the primary user directory.
pub const DEFAULT_USER_BUCKETS: usize = 100_000;

/// Bucket count of the directory rebuilt for point-in-time rankings.
pub const DEFAULT_SNAPSHOT_BUCKETS: usize = 10_000;

/// Ingestion progress is logged every this many blocks.
pub const BLOCK_PROGRESS_INTERVAL: usize = 1_000;

/// Ingestion progress is logged every this many transactions.
pub const TX_PROGRESS_INTERVAL: usize = 100_000;

/// Default number of entries returned by ranking queries.
pub const DEFAULT_TOP_K: usize = 10;
