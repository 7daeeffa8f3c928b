//! TenderLens search client
//!
//! Signs in to a running gateway, runs one search through its two proxy
//! routes and prints the combined snapshot as JSON.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tenderlens_search::{
    partition::today_local, HttpBackend, SearchController, SearchQuery, SearchSnapshot,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Search contract awards and company research through a TenderLens gateway.
#[derive(Parser)]
#[command(name = "search")]
#[command(about = "Run one TenderLens search from the command line", long_about = None)]
struct Cli {
    /// Company name to search for
    #[arg(short, long, default_value = "")]
    corporation: String,

    /// Representative name to search for
    #[arg(short, long, default_value = "")]
    representative: String,

    /// Gateway base URL
    #[arg(long, env = "TENDERLENS_GATEWAY_URL", default_value = "http://localhost:8080")]
    gateway: String,

    /// Shared access password
    #[arg(long, env = "TENDERLENS_PASSWORD", hide_env_values = true)]
    password: String,

    /// Seconds to wait for each upstream
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout_secs);

    let backend = HttpBackend::new(&cli.gateway, timeout)?
        .login(&cli.password)
        .await?;
    let controller = SearchController::new(Arc::new(backend), timeout);

    let mut updates = controller.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let view = updates.borrow_and_update().clone();
            info!(
                generation = view.generation,
                contracts = ?view.contracts.status(),
                research = ?view.research.status(),
                "Search progress"
            );
        }
    });

    let query = SearchQuery::new(&cli.corporation, &cli.representative);
    let view = controller.submit(&query).await?;

    for error in view.errors() {
        tracing::warn!("{}", error);
    }

    let snapshot = SearchSnapshot::from_view(&view, today_local());
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
