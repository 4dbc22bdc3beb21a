mod adaptation;
mod config;
mod errors;
mod llm_client;
mod pipeline;
mod sections;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Args, Config};
use crate::errors::PipelineError;
use crate::llm_client::GeminiClient;
use crate::pipeline::RunReport;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before clap reads env fallbacks; ignore if missing
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize structured logging (stderr, so --dry-run output stays clean)
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting cv-matcher v{}", env!("CARGO_PKG_VERSION"));

    match run(args).await {
        Ok(report) => {
            summarize(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(stage = e.stage(), "{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: Args) -> Result<RunReport, PipelineError> {
    let config = Config::from_args(args)?;

    let llm = GeminiClient::from_config(&config)?;
    info!("LLM client initialized (model: {})", llm.model());

    pipeline::run(&config, &llm).await
}

fn summarize(report: &RunReport) {
    for change in &report.sections {
        let state = if change.changed { "adapted" } else { "unchanged" };
        info!("Section '{}': {}", change.id, state);
    }

    match &report.output_path {
        Some(path) => info!("CV adaptation complete: {}", path.display()),
        None => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(report.adapted_document.as_bytes()) {
                error!("Failed to print adapted CV: {e}");
            }
        }
    }
}
