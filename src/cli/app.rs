use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::info;

use super::env::CliArgs;
use super::output::{exit_code, render};
use super::runtime::{describe_config_source, init_logging, load_dotenv, DotenvOutcome};
use crate::config::AppConfig;
use crate::runner::{RunRequest, Runner};
use crate::workflow::Credentials;
use cdp_adapter::ChromeLauncher;

/// Binary entry point. Failures print their error chain and exit 1.
pub async fn run() -> ExitCode {
    let dotenv = load_dotenv();
    let cli = CliArgs::parse();

    match execute(cli, dotenv).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: CliArgs, dotenv: DotenvOutcome) -> Result<ExitCode> {
    init_logging(&cli.log_level, cli.debug)?;
    dotenv.log();
    info!("Starting portal-fetch v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(cli.config.as_deref()).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            describe_config_source(cli.config.as_deref())
        )
    })?;
    let settings = config
        .run_settings()
        .context("Invalid configuration")?;

    let request = RunRequest {
        credentials: Credentials::new(cli.username.clone(), cli.password.clone()),
        key: cli.key.clone(),
        download_dir: cli.download_dir.clone(),
        headless: cli.headless,
    };

    let runner = Runner::new(ChromeLauncher::default(), settings);
    let report = runner
        .run(&request)
        .await
        .with_context(|| format!("Lookup of key {} failed", request.key))?;

    println!(
        "{}",
        render(&report, cli.format()).context("Failed to render report")?
    );
    Ok(exit_code(&report.result))
}
