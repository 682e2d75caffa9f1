//! txgraph — ledger analytics from the command line.
//!
//! Loads a block CSV and a transaction CSV (plus any `--append` files) into
//! an in-memory explorer, then answers one query and exits.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use txgraph_core::ingest::{load_blocks_file, load_transactions_file};
use txgraph_core::{Explorer, PathAlgorithm, Timestamp};

mod config;
mod output;

use config::CliConfig;

/// In-memory block and transaction graph explorer.
#[derive(Parser, Debug)]
#[command(name = "txgraph", version, about = "Query a ledger of blocks and transfers")]
struct Cli {
    /// Configuration file (default: <config_dir>/txgraph/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Block CSV (block_id, hash, timestamp)
    #[arg(long, global = true)]
    blocks: Option<PathBuf>,

    /// Transaction CSV (tx_id, block_id, from, amount, to)
    #[arg(long, global = true)]
    transactions: Option<PathBuf>,

    /// Extra transaction CSV appended after the main one; repeatable
    #[arg(long = "append", global = true)]
    append: Vec<PathBuf>,

    /// Shortest-path solver
    #[arg(long, global = true, value_enum)]
    path_algorithm: Option<AlgorithmArg>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format ("text" or "json")
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Block, transaction and user counts.
    Summary,
    /// Transfers of one account in a timestamp window.
    History {
        account: String,
        /// Window start (inclusive)
        #[arg(long, default_value_t = 0)]
        from: Timestamp,
        /// Window end (inclusive)
        #[arg(long, default_value_t = Timestamp::MAX)]
        to: Timestamp,
        /// Number of largest transfers to list
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Totals and balance of one account up to a timestamp.
    Balance {
        account: String,
        /// Cutoff timestamp (inclusive); defaults to the whole ledger
        #[arg(long)]
        at: Option<Timestamp>,
    },
    /// Richest accounts as of a timestamp.
    RichList {
        /// Cutoff timestamp (inclusive)
        at: Timestamp,
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Richest accounts over the whole ledger.
    Wealth {
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Average degrees and the top accounts by degree.
    Degrees {
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Look for a directed cycle of transfers.
    Cycle,
    /// Cheapest chain of transfers between two accounts.
    Path { from: String, to: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlgorithmArg {
    Dijkstra,
    LabelCorrecting,
}

impl From<AlgorithmArg> for PathAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Dijkstra => PathAlgorithm::Dijkstra,
            AlgorithmArg::LabelCorrecting => PathAlgorithm::LabelCorrecting,
        }
    }
}

impl Cli {
    /// Layer command-line flags over the loaded configuration.
    fn apply(&self, mut config: CliConfig) -> CliConfig {
        if let Some(blocks) = &self.blocks {
            config.blocks = blocks.clone();
        }
        if let Some(transactions) = &self.transactions {
            config.transactions = transactions.clone();
        }
        config.append.extend(self.append.iter().cloned());
        if let Some(algorithm) = self.path_algorithm {
            config.engine.path_algorithm = algorithm.into();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = CliConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let config = cli.apply(loaded);

    init_logging(&config.log_level, &config.log_format);
    info!("txgraph v{}", env!("CARGO_PKG_VERSION"));

    let explorer = load(&config)?;
    run(&cli.command, &explorer, &config, cli.json)
}

/// Build the explorer from the configured files.
fn load(config: &CliConfig) -> Result<Explorer> {
    let started = Instant::now();
    let mut explorer = Explorer::new(config.engine.clone());

    load_blocks_file(&mut explorer, &config.blocks)
        .with_context(|| format!("failed to read blocks from {}", config.blocks.display()))?;
    load_transactions_file(&mut explorer, &config.transactions).with_context(|| {
        format!("failed to read transactions from {}", config.transactions.display())
    })?;
    for extra in &config.append {
        load_transactions_file(&mut explorer, extra)
            .with_context(|| format!("failed to append transactions from {}", extra.display()))?;
    }

    let summary = explorer.summary();
    info!(
        blocks = summary.blocks,
        transactions = summary.transactions,
        users = summary.users,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "ledger ready"
    );
    Ok(explorer)
}

fn run(command: &Command, explorer: &Explorer, config: &CliConfig, json: bool) -> Result<()> {
    let top_k = |k: &Option<usize>| k.unwrap_or(config.top_k);

    match command {
        Command::Summary => output::summary(&explorer.summary(), json),
        Command::History { account, from, to, k } => {
            let history = explorer
                .account_history(account, *from, *to, top_k(k))
                .with_context(|| format!("history of {account}"))?;
            output::history(&history, json)
        }
        Command::Balance { account, at } => {
            let balance = explorer
                .account_balance(account, at.unwrap_or(Timestamp::MAX))
                .with_context(|| format!("balance of {account}"))?;
            output::balance(&balance, json)
        }
        Command::RichList { at, k } => {
            output::ranking("net wealth", &explorer.top_wealth_at(*at, top_k(k)), json)
        }
        Command::Wealth { k } => output::ranking("net wealth", &explorer.top_wealth(top_k(k)), json),
        Command::Degrees { k } => {
            output::degrees(&explorer.degree_stats(), &explorer.top_degree(top_k(k)), json)
        }
        Command::Cycle => output::cycle(explorer.find_cycle().as_deref(), json),
        Command::Path { from, to } => {
            let path = explorer
                .shortest_path(from, to)
                .with_context(|| format!("path from {from} to {to}"))?;
            output::path(explorer, from, to, path.as_ref(), json)
        }
    }
}

/// Initialize the tracing subscriber. Logs go to stderr so that query output
/// on stdout stays machine-readable.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
