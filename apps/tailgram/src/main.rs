use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tailgram_client::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the timeline on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tailgram_client::run(cli).await
}
