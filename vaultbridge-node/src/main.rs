//! Vault settlement devnet binary.
//!
//! Deploys a multi-chain devnet, runs a deposit and withdrawal through the
//! transport and bridge with a polling keeper, and prints a summary.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use vaultbridge_node::cli::Cli;
use vaultbridge_node::config::NodeConfig;
use vaultbridge_node::node::Node;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Set up logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    tracing::info!("VaultBridge Node v{}", env!("CARGO_PKG_VERSION"));

    let config = NodeConfig::from_cli(&cli);
    let json = config.json;
    let report_path = config.report_path.clone();

    let node = Node::new(config).context("devnet deployment failed")?;
    let summary = node.run().await?;

    let rendered = serde_json::to_string_pretty(&summary)?;
    if let Some(path) = report_path {
        std::fs::write(&path, &rendered)
            .with_context(|| format!("writing report to {}", path.display()))?;
    }
    if json {
        println!("{rendered}");
    } else {
        print!("{summary}");
    }

    if !summary.settled {
        anyhow::bail!("scenario did not settle within {} ticks", summary.ticks);
    }
    Ok(())
}
