use anyhow::Result;
use clap::Parser;
use dstrace::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in a .env file next to the repository
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result
}
