//! Node configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::devnet::DevnetConfig;
use crate::network::NetworkConfig;

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Devnet to deploy.
    pub devnet: DevnetConfig,

    /// Keeper polling interval.
    pub tick_interval: Duration,

    /// Upper bound on keeper ticks.
    pub max_ticks: u64,

    /// Amount the scenario deposits.
    pub deposit_amount: u64,

    /// Slippage tolerance of the scenario deposit.
    pub slippage_bps: u16,

    /// Print JSON instead of text.
    pub json: bool,

    /// Where to write the JSON summary.
    pub report_path: Option<PathBuf>,

    /// Log level.
    pub log_level: String,
}

impl NodeConfig {
    /// Create a node configuration from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        let devnet = DevnetConfig {
            chain_ids: cli.chains.clone(),
            network: NetworkConfig {
                bridge_fee_bps: cli.bridge_fee_bps,
                duplicate_delivery: cli.duplicate_delivery,
                shuffle_seed: cli.shuffle_seed,
                ..NetworkConfig::default()
            },
            ..DevnetConfig::default()
        };

        Self {
            devnet,
            tick_interval: Duration::from_millis(cli.tick_ms.max(1)),
            max_ticks: cli.max_ticks,
            deposit_amount: cli.deposit_amount,
            slippage_bps: cli.slippage_bps,
            json: cli.json,
            report_path: cli.report.clone(),
            log_level: cli.log_level.clone(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            devnet: DevnetConfig::default(),
            tick_interval: Duration::from_millis(200),
            max_ticks: 100,
            deposit_amount: 10_000,
            slippage_bps: 100,
            json: false,
            report_path: None,
            log_level: "info".to_string(),
        }
    }
}
