//! confuscan - dependency confusion auditor for npm manifests.
//!
//! CLI entry point.

use clap::{CommandFactory, Parser};
use confuscan::report::ConsoleReport;
use confuscan::{ApiLimiter, Config, GitdorkerDriver, Manifest, Mode, NpmChecker, Scanner};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Set up logging
    let filter = if config.verbose {
        EnvFilter::new("confuscan=debug,info")
    } else {
        EnvFilter::new("confuscan=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mode = match config.mode() {
        Ok(m) => m,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let limiter = Arc::new(ApiLimiter::new(config.rate_limit));

    match mode {
        Mode::Single(path) => run_single(&path, &config, limiter).await,
        Mode::Bulk { results, token } => run_bulk(&results, &token, &config, limiter).await,
        Mode::Help => {
            let _ = Config::command().print_long_help();
            ExitCode::SUCCESS
        }
    }
}

async fn run_single(path: &Path, config: &Config, limiter: Arc<ApiLimiter>) -> ExitCode {
    let console = ConsoleReport::new();
    console.print_reading(path);

    let manifest = match Manifest::load(path) {
        Ok(m) => m,
        Err(e) => {
            error!("failed to read package.json: {}", e);
            return ExitCode::FAILURE;
        }
    };
    console.print_parsed(manifest.len());

    let scanner = match make_scanner(config, limiter) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to create checker: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let summary = scanner.check_manifest(&manifest).await;
    console.print_summary(&summary);
    ExitCode::SUCCESS
}

async fn run_bulk(
    results: &Path,
    token: &str,
    config: &Config,
    limiter: Arc<ApiLimiter>,
) -> ExitCode {
    let console = ConsoleReport::new();

    let driver = match make_scanner(config, limiter.clone())
        .and_then(|scanner| GitdorkerDriver::new(token, config.timeout, limiter, scanner))
    {
        Ok(d) => d,
        Err(e) => {
            error!("failed to create driver: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match driver.run(results).await {
        Ok(summary) => {
            console.print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("failed to process GitDorker results: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn make_scanner(config: &Config, limiter: Arc<ApiLimiter>) -> confuscan::Result<Scanner> {
    let checker = NpmChecker::new(config.timeout, limiter)?;
    Ok(Scanner::new(checker, ConsoleReport::new()))
}
