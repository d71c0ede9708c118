use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// What happened to `.env`. Loading runs before argument parsing, so the
/// outcome is kept and logged once the subscriber exists.
#[derive(Debug)]
pub enum DotenvOutcome {
    Loaded(PathBuf),
    Absent,
    Failed(dotenvy::Error),
}

impl DotenvOutcome {
    fn from_result(result: dotenvy::Result<PathBuf>) -> Self {
        match result {
            Ok(path) => DotenvOutcome::Loaded(path),
            Err(err) if err.not_found() => DotenvOutcome::Absent,
            Err(err) => DotenvOutcome::Failed(err),
        }
    }

    pub fn log(&self) {
        match self {
            DotenvOutcome::Loaded(path) => {
                debug!(path = %path.display(), "Loaded environment from .env")
            }
            DotenvOutcome::Absent => {}
            DotenvOutcome::Failed(err) => warn!(error = %err, "Failed to read .env"),
        }
    }
}

/// Load `.env` from the working directory; variables already set win.
pub fn load_dotenv() -> DotenvOutcome {
    DotenvOutcome::from_result(dotenvy::dotenv())
}

/// Install the global subscriber. Logs go to stderr; stdout carries the outcome.
pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

pub fn describe_config_source(explicit: Option<&Path>) -> String {
    match explicit {
        Some(path) => path.display().to_string(),
        None => "defaults".to_string(),
    }
}
