// Entrypoint for the migration tool.
// - Keeps `main` small: set up logging, load config, run the pipeline.
// - Any failure is logged and turned into exit status 1.

use docmigrate::{config::Config, pipeline, pipeline::RunSummary};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match try_main().await {
        Ok(summary) => {
            tracing::info!(
                uploaded = summary.uploaded.len(),
                transferred = summary.transferred.len(),
                verified = summary.verified,
                "migration from {} to {} finished",
                summary.source_project,
                summary.target_project
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("An error occurred: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn try_main() -> anyhow::Result<RunSummary> {
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");
    pipeline::run(&config).await
}
