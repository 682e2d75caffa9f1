//! Engine configuration.
//!
//! [`EngineConfig`] deserializes from any serde source with every field
//! optional, so a partial TOML table only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SNAPSHOT_BUCKETS, DEFAULT_USER_BUCKETS};
use crate::path::PathAlgorithm;

/// Sizing and algorithm choices for an [`Explorer`](crate::explorer::Explorer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bucket count of the primary user directory.
    pub user_buckets: usize,
    /// Bucket count of the throwaway directory built by `top_wealth_at`.
    pub snapshot_buckets: usize,
    /// Solver used by `shortest_path`.
    pub path_algorithm: PathAlgorithm,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_buckets: DEFAULT_USER_BUCKETS,
            snapshot_buckets: DEFAULT_SNAPSHOT_BUCKETS,
            path_algorithm: PathAlgorithm::Dijkstra,
        }
    }
}

impl EngineConfig {
    pub fn with_path_algorithm(mut self, algorithm: PathAlgorithm) -> Self {
        self.path_algorithm = algorithm;
        self
    }
}
