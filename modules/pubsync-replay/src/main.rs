mod offline;
mod replay;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pubsync_common::Config;
use pubsync_core::DefaultSchema;
use pubsync_store::SyncClient;

use crate::offline::OfflineApi;

#[derive(Parser)]
#[command(name = "replay", about = "Replay recorded stream events into an offline store")]
struct Cli {
    /// JSON-lines file of stream events. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Print the recorded action log as JSON lines.
    #[arg(long)]
    actions: bool,

    /// Print the final summary as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(config.log_directive.parse()?))
        .with_writer(std::io::stderr)
        .init();
    config.log_summary();

    let client = SyncClient::<DefaultSchema>::new(Arc::new(OfflineApi), &config);

    let stats = match &cli.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Cannot open {}", path.display()))?;
            replay::replay(&client, BufReader::new(file)).await?
        }
        None => replay::replay(&client, BufReader::new(tokio::io::stdin())).await?,
    };

    info!(
        events = stats.events,
        actions = stats.actions,
        skipped = stats.skipped,
        "Replay finished"
    );

    if cli.actions {
        for action in client.action_log().actions() {
            println!("{}", serde_json::to_string(&action)?);
        }
    }

    let summary = client.snapshot().await.summary();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("\n=== Replay {} ===", client.run_id());
        println!(
            "Events: {}  |  Actions: {}  |  Skipped: {}",
            stats.events, stats.actions, stats.skipped
        );
        println!(
            "Users: {}  |  Spaces: {}  |  Memberships: {}  |  Members: {}",
            summary.users, summary.spaces, summary.memberships, summary.members
        );
        println!(
            "Messages: {}  |  Presence channels: {}  |  Connection: {:?}",
            summary.messages, summary.channels_with_presence, summary.connection
        );
    }

    Ok(())
}
