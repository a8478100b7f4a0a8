//! Standings dump tool - fetches the active session, standings, and player
//! statistics for diagnostics.
//!
//! Usage:
//!   cargo run --release --bin standings-dump -- --url http://localhost:8000/api

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tilescore_client::Client;
use tilescore_types::{Player, PlayerStats, Session};

#[derive(Parser, Debug)]
#[command(author, version, about = "Dump standings and statistics for diagnostics")]
struct Args {
    #[arg(short, long, default_value = "http://localhost:8000/api")]
    url: String,

    /// Skip the statistics query.
    #[arg(long)]
    no_statistics: bool,
}

#[derive(Serialize)]
struct StandingsDump {
    active_session: Option<Session>,
    standings: Vec<Player>,
    #[serde(skip_serializing_if = "Option::is_none")]
    statistics: Option<Vec<PlayerStats>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let client = Client::new(&args.url)?;
    let active_session = client.active_session().await?;
    let standings = client.standings().await?;
    let statistics = if args.no_statistics {
        None
    } else {
        Some(client.statistics().await?)
    };

    let output = StandingsDump {
        active_session,
        standings,
        statistics,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
