//! Submit a single round from the command line.
//!
//! Usage:
//!   cargo run --release --bin round-submit -- --recorder 1 -- 2=8000 3=-8000

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tilescore_client::Client;
use tilescore_types::{
    api::{CreateRound, ScoreDelta},
    PlayerId,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Submit one round of (player, delta) pairs")]
struct Args {
    #[arg(short, long, default_value = "http://localhost:8000/api")]
    url: String,

    /// Player id attributed as the round's recorder.
    #[arg(short, long)]
    recorder: Option<u64>,

    /// Deltas as player_id=delta pairs, e.g. `2=8000 3=-8000`.
    #[arg(required = true)]
    scores: Vec<String>,
}

fn parse_score(raw: &str) -> Result<ScoreDelta> {
    let (player, delta) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected player_id=delta, got {raw:?}"))?;
    Ok(ScoreDelta {
        player_id: PlayerId(player.parse().context("invalid player id")?),
        delta: delta.parse().context("invalid delta")?,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let scores = args
        .scores
        .iter()
        .map(|raw| parse_score(raw))
        .collect::<Result<Vec<_>>>()?;
    let request = CreateRound {
        scores,
        recorder_id: args.recorder.map(PlayerId),
    };
    if request.total() != 0 {
        bail!("deltas sum to {}, expected 0", request.total());
    }

    let client = Client::new(&args.url)?;
    let round = client.create_round(&request).await?;
    println!(
        "committed round {} with {} scores",
        round.id,
        round.scores.len()
    );
    Ok(())
}
