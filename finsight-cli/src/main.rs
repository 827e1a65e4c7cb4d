use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use finsight_core::{GENERIC_FAILURE_MESSAGE, RATE_LIMIT_MESSAGE};
use finsight_gateway::{categorize, insights, render_outcome};
use finsight_ingest::parse_statement;

mod config;
mod state;
mod tui;
mod worker;

#[derive(Parser, Debug)]
#[command(name = "finsight", version, about = "Personal-finance dashboard with an LLM copilot")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a CSV statement (Date,Description,Amount) into the store
    Import {
        #[arg(long)]
        csv: PathBuf,
    },

    /// Ask the model to categorize every uncategorized transaction
    Categorize,

    /// Ask the model for spending insights
    Insights,

    /// Open the terminal dashboard
    Dashboard,

    /// Open the dashboard on the chat tab
    Chat,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default ~/.finsight/config.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Import { csv } => run_import(&csv)?,
        Command::Categorize => run_categorize().await?,
        Command::Insights => run_insights().await?,
        Command::Dashboard => tui::run_dashboard(tui::Tab::Overview)?,
        Command::Chat => tui::run_dashboard(tui::Tab::Chat)?,
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
        },
    }

    Ok(())
}

fn run_import(csv: &PathBuf) -> Result<()> {
    let text =
        std::fs::read_to_string(csv).with_context(|| format!("read {}", csv.display()))?;
    let rows = parse_statement(&text, chrono::Local::now().date_naive());

    let mut store = state::load_store()?;
    let n = store.append_rows(rows);
    state::save_store(&store)?;

    println!("Imported {n} transactions from {}", csv.display());
    println!("Store now holds {} transactions", store.len());
    Ok(())
}

async fn run_categorize() -> Result<()> {
    let cfg = config::load_config()?;
    let client = config::build_client(&cfg)?;

    let mut store = state::load_store()?;
    let pending = store.uncategorized();
    if pending.is_empty() {
        println!("Nothing left to categorize.");
        return Ok(());
    }

    println!("Categorizing {} transactions with {}…", pending.len(), client.model());
    match categorize(&client, &pending).await {
        Ok(assignments) => {
            let n = store.apply_assignments(&assignments, cfg.categorize.on_unknown_category);
            state::save_store(&store)?;
            println!("Updated {n} transactions");
            for a in assignments.iter().filter(|a| a.is_anomaly) {
                println!("  anomaly: {} ({})", a.id, a.category);
            }
        }
        Err(e) if e.is_rate_limited() => println!("{RATE_LIMIT_MESSAGE}"),
        Err(e) => {
            log::warn!("categorize failed: {e}");
            println!("{GENERIC_FAILURE_MESSAGE}");
            println!("No transactions were updated.");
        }
    }
    Ok(())
}

async fn run_insights() -> Result<()> {
    let cfg = config::load_config()?;
    let client = config::build_client(&cfg)?;
    let store = state::load_store()?;

    println!("Asking {} for insights…", client.model());
    let view = render_outcome(insights(&client, store.transactions()).await);
    println!("\n{}", view.text);
    Ok(())
}
