//! ustar - sequential USTAR archiver

use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;
use ustar_rs::{Config, Extractor, Packer};

mod cli;
use cli::{Action, Cli};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Returns `false` if the run completed but some entries failed
fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => Config::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    let config = config
        .clone()
        .with_verbose(config.verbose || cli.mode.verbose)
        .with_log_headers(config.log_headers || cli.mode.log_headers);

    match cli.mode.action {
        Action::Create => {
            if cli.inputs.is_empty() {
                bail!("create mode needs at least one input path");
            }

            let report = Packer::new()
                .with_base_dir(&cli.directory)
                .with_config(config)
                .create(&cli.archive, &cli.inputs)
                .with_context(|| format!("Failed to create {}", cli.archive.display()))?;

            if !report.is_success() {
                tracing::error!(
                    failed = report.failures.len(),
                    archive = %cli.archive.display(),
                    "archive created with missing entries"
                );
            }
            Ok(report.is_success())
        }
        Action::Extract => {
            let report = Extractor::new(&cli.directory)
                .with_config(config)
                .extract(&cli.archive)
                .with_context(|| format!("Failed to extract {}", cli.archive.display()))?;

            if report.skipped > 0 {
                tracing::warn!(skipped = report.skipped, "unsupported entries were not extracted");
            }
            Ok(true)
        }
    }
}
