//! CLI configuration: TOML file, then `TXGRAPH_*` environment, then flags.

use std::path::{Path, PathBuf};

use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use txgraph_core::constants::DEFAULT_TOP_K;
use txgraph_core::EngineConfig;

/// Settings for one CLI run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Block CSV loaded first.
    pub blocks: PathBuf,
    /// Transaction CSV loaded after the blocks.
    pub transactions: PathBuf,
    /// Extra transaction files appended after `transactions`.
    pub append: Vec<PathBuf>,
    /// Ranking size when a subcommand does not give `-k`.
    pub top_k: usize,
    /// Log level filter string (e.g. "info", "txgraph_core=debug").
    pub log_level: String,
    /// Log output format ("text" or "json").
    pub log_format: String,
    pub engine: EngineConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            blocks: PathBuf::from("block_part1.csv"),
            transactions: PathBuf::from("tx_data_part1_v2.csv"),
            append: Vec::new(),
            top_k: DEFAULT_TOP_K,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl CliConfig {
    /// `<config_dir>/txgraph/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("txgraph").join("config.toml"))
    }

    /// Load from `path` (required to exist) or from [`default_path`](Self::default_path)
    /// (optional), with `TXGRAPH_*` variables layered on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => builder = builder.add_source(File::from(path).required(true)),
            None => {
                if let Some(path) = Self::default_path() {
                    builder = builder.add_source(File::from(path).required(false));
                }
            }
        }

        // TXGRAPH_TOP_K=5, TXGRAPH_ENGINE__PATH_ALGORITHM=label-correcting
        builder = builder.add_source(
            Environment::with_prefix("TXGRAPH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use txgraph_core::PathAlgorithm;

    use super::*;

    #[test]
    fn default_data_file_names() {
        let cfg = CliConfig::default();
        assert_eq!(cfg.blocks, PathBuf::from("block_part1.csv"));
        assert_eq!(cfg.transactions, PathBuf::from("tx_data_part1_v2.csv"));
        assert_eq!(cfg.top_k, 10);
        assert_eq!(cfg.log_format, "text");
    }

    #[test]
    fn toml_file_overrides_named_keys_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "top_k = 3\nblocks = \"b.csv\"\n\n[engine]\npath_algorithm = \"label-correcting\"\n",
        )
        .unwrap();

        let cfg = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.top_k, 3);
        assert_eq!(cfg.blocks, PathBuf::from("b.csv"));
        assert_eq!(cfg.transactions, PathBuf::from("tx_data_part1_v2.csv"));
        assert_eq!(cfg.engine.path_algorithm, PathAlgorithm::LabelCorrecting);
        assert_eq!(cfg.engine.user_buckets, 100_000);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn default_path_ends_with_config_toml() {
        if let Some(path) = CliConfig::default_path() {
            assert!(path.ends_with("txgraph/config.toml"));
        }
    }
}
