//! careledger: run a registry of ledger nodes, or talk to one.

use anyhow::{bail, Context};
use careledger_ledger::validate_chain;
use careledger_node::{init_logging, LogFormat, NodeRegistry, RegistryConfig};
use careledger_store::ChainStore;
use careledger_store_json::JsonFileStore;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "careledger", about = "Permissioned multi-node healthcare ledger")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "CARELEDGER_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for ledger files.
    #[arg(long, env = "CARELEDGER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Interface the nodes bind to.
    #[arg(long, env = "CARELEDGER_HOST")]
    host: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CARELEDGER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CARELEDGER_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Start every configured node and serve until SIGINT/SIGTERM.
    Run,

    /// Send one raw JSON request to a node and print its response.
    Request {
        /// Node address, e.g. 127.0.0.1:5001.
        #[arg(long)]
        addr: String,

        /// Request body, e.g. '{"action":"get_chain"}'.
        json: String,
    },

    /// Check the hash chain stored in a ledger file.
    Verify {
        /// Path to a `<node_id>_ledger.json` file.
        file: PathBuf,
    },

    /// Print the effective configuration as TOML.
    PrintConfig,
}

fn load_config(cli: &Cli) -> anyhow::Result<RegistryConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            RegistryConfig::from_toml_file(&path)
                .with_context(|| format!("loading config from {path}"))?
        }
        None => RegistryConfig::default(),
    };

    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn run(config: RegistryConfig) -> anyhow::Result<()> {
    tracing::info!(
        data_dir = %config.data_dir.display(),
        nodes = config.nodes.len(),
        "starting careledger"
    );

    let registry = NodeRegistry::start(&config)
        .await
        .context("starting node registry")?;
    for node in registry.nodes() {
        tracing::info!(node = %node.node_id, addr = %node.local_addr, "serving");
    }

    registry.run_until_signal().await?;
    tracing::info!("careledger exited cleanly");
    Ok(())
}

fn verify(file: PathBuf) -> anyhow::Result<()> {
    let store = JsonFileStore::at_path(&file);
    let Some(blocks) = store.load()? else {
        bail!("no ledger at {}", file.display());
    };
    validate_chain(&blocks).with_context(|| format!("{} failed verification", file.display()))?;

    let head = blocks.last().map(|b| b.hash.to_string()).unwrap_or_default();
    println!("{}: {} blocks, head {head}", file.display(), blocks.len());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::Run => {
            init_logging(config.log_format.parse::<LogFormat>()?, &config.log_level);
            run(config).await
        }
        Command::Request { addr, json } => {
            let response = careledger_rpc::send_raw(addr.as_str(), &json)
                .await
                .with_context(|| format!("request to {addr}"))?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Command::Verify { file } => verify(file),
        Command::PrintConfig => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}
