//! ecsdrain — drain an ECS container instance ahead of EC2 termination.
//!
//! Runs the drain against a control-plane inventory snapshot, either for a
//! lifecycle event (as the autoscaling hook handler would) or for a single
//! instance. The outcome is printed to stdout as JSON; logs go to stderr.
//!
//! # Usage
//!
//! ```text
//! ecsdrain --inventory plane.json handle --event event.json
//! cat event.json | ecsdrain --inventory plane.json handle --event -
//! ecsdrain --inventory plane.json --dry-run drain --instance-id i-0c315bd8daf18cf20
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use ecsdrain_lifecycle::LifecycleHandler;
use ecsdrain_orchestrator::{DrainConfig, DrainContext, DrainOrchestrator};
use ecsdrain_plane::Inventory;

#[derive(Parser)]
#[command(
    name = "ecsdrain",
    about = "Drain ECS container instances before their hosts terminate",
    version
)]
struct Cli {
    /// Path to ecsdrain.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Discover and poll only; never deregister or complete lifecycle actions.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Control-plane inventory snapshot (JSON). Required by every command.
    #[arg(long, global = true)]
    inventory: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn inventory_path(&self) -> anyhow::Result<&Path> {
        self.inventory
            .as_deref()
            .context("--inventory is required")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Handle an autoscaling lifecycle event (SNS envelope or bare message).
    Handle {
        /// Event file, or `-` for stdin.
        #[arg(long)]
        event: String,
    },
    /// Drain one EC2 instance outside any lifecycle hook.
    Drain {
        #[arg(long)]
        instance_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let mut config = DrainConfig::load(cli.config.as_deref())?;
    if cli.dry_run {
        config.dry_run = true;
    }

    let inventory = cli.inventory_path()?;
    let plane = Inventory::from_file(inventory)
        .with_context(|| format!("failed to load inventory {}", inventory.display()))?;
    info!(inventory = %inventory.display(), dry_run = config.dry_run, "ecsdrain starting");

    let output = match cli.command {
        Command::Handle { event } => {
            let raw = read_event(&event)?;
            let outcome = LifecycleHandler::new(&plane, config).handle(&raw).await?;
            serde_json::to_string_pretty(&outcome)?
        }
        Command::Drain { instance_id } => {
            let ctx = DrainContext::local(&instance_id);
            let outcome = DrainOrchestrator::new(&plane, config).run(&ctx).await?;
            serde_json::to_string_pretty(&outcome)?
        }
    };

    println!("{output}");
    Ok(())
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,ecsdrain=debug"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

fn read_event(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read event from stdin")?;
        return Ok(raw);
    }
    let path = Path::new(source);
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read event {}", path.display()))
}
