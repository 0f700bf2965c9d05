use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::database;

#[derive(Parser)]
#[command(name = "causeway")]
#[command(about = "Causeway CLI - operations tooling for the Causeway API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply database migrations and seed reference data")]
    Migrate,

    #[command(about = "Probe a running server's health endpoint")]
    Health {
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        url: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Migrate => migrate().await,
        Commands::Health { url } => health(&url).await,
    }
}

/// Connecting runs the idempotent migration set; nothing else to do.
async fn migrate() -> anyhow::Result<()> {
    database::init().await?;
    database::close().await;
    println!("Migrations applied");
    Ok(())
}

async fn health(url: &str) -> anyhow::Result<()> {
    let endpoint = format!("{}/health", url.trim_end_matches('/'));
    let resp = reqwest::get(&endpoint).await?;
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(Value::Null);

    println!("{} {}", status, body);
    anyhow::ensure!(status.is_success(), "server reported unhealthy");
    Ok(())
}
