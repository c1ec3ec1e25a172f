use std::path::PathBuf;

use anyhow::{Context, Result};
use bourse::scheduler::{run_scheduler, DailySchedule};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bourse", about = "Multi-agent LLM trading orchestrator")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/bourse.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long)]
    json: bool,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the daily market review on schedule until Ctrl-C
    Serve,
    /// Run one daily market review now
    Review,
    /// Publish a news event and let every agent react to it
    News {
        #[arg(long)]
        headline: String,
        #[arg(long)]
        content: String,
    },
    /// Register a new trading agent with the ledger
    CreateAgent {
        #[arg(long)]
        name: String,
        #[arg(long)]
        persona: String,
        /// Model identifier; defaults to the configured default model
        #[arg(long)]
        model: Option<String>,
    },
    /// List the agent roster
    Agents,
}

fn init_tracing(json: bool) {
    // RUST_LOG overrides the info default; logs go to stderr so stdout stays machine-readable
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(bourse::log_filter(rust_log.as_deref()))
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let config = bourse::load_config(&cli.config)?;

    match cli.command {
        Command::Serve => {
            let schedule = DailySchedule::from_config(&config.schedule)
                .context("Invalid [schedule] configuration")?;
            let orchestrator =
                bourse::build_orchestrator(&config).context("Failed to build orchestrator")?;

            let cancel = CancellationToken::new();
            let shutdown = cancel.clone();
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Received shutdown signal");
                shutdown.cancel();
            });

            run_scheduler(orchestrator, schedule, cancel).await;
        }
        Command::Review => {
            let orchestrator =
                bourse::build_orchestrator(&config).context("Failed to build orchestrator")?;
            let report = orchestrator
                .trigger_daily_market_review()
                .await
                .map_err(|e| anyhow::anyhow!("Daily review failed: {e}"))?;
            print_json(&report, cli.pretty)?;
        }
        Command::News { headline, content } => {
            let orchestrator =
                bourse::build_orchestrator(&config).context("Failed to build orchestrator")?;
            let report = bourse::publish_news(&orchestrator, &headline, &content)
                .await
                .map_err(|e| anyhow::anyhow!("News cycle failed: {e}"))?;
            print_json(&report, cli.pretty)?;
        }
        Command::CreateAgent {
            name,
            persona,
            model,
        } => {
            let ledger = bourse::build_ledger(&config)?;
            let created = bourse::register_agent(
                ledger.as_ref(),
                &name,
                &persona,
                model.as_deref(),
                &config.llm.default_model,
            )
            .await?;
            print_json(&created, cli.pretty)?;
        }
        Command::Agents => {
            let ledger = bourse::build_ledger(&config)?;
            let agents = ledger
                .list_agents()
                .await
                .context("Failed to list agents")?;
            print_json(&agents, cli.pretty)?;
        }
    }

    Ok(())
}
