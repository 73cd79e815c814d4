//! Loupe CLI binary.

use anyhow::Result;
use loupe::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the loupe CLI.
///
/// Uses tokio's current_thread runtime for simplicity and lower overhead.
/// This is appropriate for CLI applications with sequential I/O-bound operations.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    // Can be controlled via RUST_LOG environment variable
    // Example: RUST_LOG=loupe=debug,loupe_query=trace cargo run
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("loupe=info,loupe_query=info")),
        )
        .with_target(false)
        .init();

    tracing::debug!("Starting loupe CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Loupe CLI completed successfully");
    Ok(())
}
