use std::process::ExitCode;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use contrail_cli::{CliArgs, ContrailApp, ContrailConfig, LogFiles, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("contrail: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = ContrailConfig::load(args.config.as_deref()).context("loading configuration")?;
    let debug = args.debug;
    let app = ContrailApp::new(config, args);

    let files = LogFiles::for_start(&app.log_dir(), Local::now());
    logging::init(&files, debug).context("initializing logs")?;
    tracing::info!(log = %files.session.display(), "logging to file");

    let result = app.run().await;
    match &result {
        Ok(summary) => {
            println!(
                "processed {} record(s), archived {}",
                summary.total_processed(),
                summary.archived
            );
            for failed in summary.results.iter().filter(|r| r.error.is_some()) {
                println!("  {}: failed", failed.record_type);
            }
        }
        Err(e) => tracing::error!(error = %e, "embedding sync aborted"),
    }
    if files.has_errors() {
        eprintln!("errors were logged to {}", files.errors.display());
    }
    result.map(|_| ()).context("running embedding sync")
}
