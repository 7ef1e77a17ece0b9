//! CLI entry point for bookfetch.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use bookfetch_core::report::render_failure;
use bookfetch_core::{FileSink, HttpFetcher, Pipeline, Settings, load_default_file_config};
use clap::Parser;
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let loaded = load_default_file_config().context("failed to load configuration")?;
    if loaded.loaded_from_file {
        info!(path = ?loaded.path, "configuration loaded");
    }

    let mut settings = Settings::from_process_env(loaded.config.as_ref());
    if let Some(dir) = &args.output_dir {
        settings.output_dir.clone_from(dir);
    }
    debug!(output_dir = %settings.output_dir.display(), "settings resolved");

    let sources = match settings.sources() {
        Ok(sources) => sources,
        Err(error) => {
            println!("{}", render_failure(&error));
            return Ok(ExitCode::FAILURE);
        }
    };

    let fetcher = HttpFetcher::new().context("failed to build HTTP client")?;
    let sink = FileSink::new(settings.output_dir.clone());
    let pipeline = Pipeline::new(
        Arc::new(fetcher),
        sources,
        Arc::new(sink),
        settings.pipeline_settings(),
    );

    let request = args.to_request(settings.result_limit, settings.auto_open);
    let response = pipeline.respond(&request).await;

    println!("{}", response.message);
    if let Some(payload) = &response.debug {
        eprintln!("{payload}");
    }

    Ok(if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
