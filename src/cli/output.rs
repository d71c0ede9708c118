use clap::ValueEnum;
use std::process::ExitCode;

use crate::runner::{RunReport, RunResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Stdout line for a finished run.
pub fn render(report: &RunReport, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report),
        OutputFormat::Human => Ok(match &report.result {
            RunResult::Downloaded(path) => path.display().to_string(),
            RunResult::NoResults => "NO_RESULTS".to_string(),
            RunResult::DownloadTimedOut => "DOWNLOAD_NOT_FOUND".to_string(),
        }),
    }
}

/// 0 downloaded, 3 no results, 4 download timed out. Usage errors exit 2 and
/// failures exit 1.
pub fn exit_status(result: &RunResult) -> u8 {
    match result {
        RunResult::Downloaded(_) => 0,
        RunResult::NoResults => 3,
        RunResult::DownloadTimedOut => 4,
    }
}

pub fn exit_code(result: &RunResult) -> ExitCode {
    ExitCode::from(exit_status(result))
}
