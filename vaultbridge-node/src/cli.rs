//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

/// Cross-chain vault settlement devnet.
#[derive(Parser, Debug, Clone)]
#[command(name = "vaultbridge-node")]
#[command(about = "Runs a multi-chain settlement devnet with a polling keeper")]
#[command(version)]
pub struct Cli {
    /// Comma-separated chain ids to deploy.
    #[arg(long, value_delimiter = ',', default_values_t = [1u64, 2])]
    pub chains: Vec<u64>,

    /// Keeper polling interval in milliseconds.
    #[arg(long, default_value_t = 200)]
    pub tick_ms: u64,

    /// Stop after this many ticks even if the scenario has not settled.
    #[arg(long, default_value_t = 100)]
    pub max_ticks: u64,

    /// Bridge fee in basis points.
    #[arg(long, default_value_t = 0)]
    pub bridge_fee_bps: u16,

    /// Deliver every message twice.
    #[arg(long)]
    pub duplicate_delivery: bool,

    /// Shuffle delivery order with this seed.
    #[arg(long)]
    pub shuffle_seed: Option<u64>,

    /// Amount the scenario deposits cross-chain.
    #[arg(long, default_value_t = 10_000)]
    pub deposit_amount: u64,

    /// Slippage tolerance of the deposit, in basis points.
    #[arg(long, default_value_t = 100)]
    pub slippage_bps: u16,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON summary to this file.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
