//! Run controller: one browser session per lookup, always torn down.

use crate::download::{DownloadResult, DownloadWatcher, DEFAULT_IN_PROGRESS_SUFFIXES};
use crate::errors::RunError;
use crate::workflow::{Credentials, QueryOutcome, StepTimeouts, Workflow};
use action_primitives::{Clock, LocatorTable, Primitives, TokioClock, DEFAULT_POLL_INTERVAL};
use cdp_adapter::{CdpConfig, Launcher, PageDriver};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Inputs of a single run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub credentials: Credentials,
    pub key: String,
    pub download_dir: PathBuf,
    pub headless: bool,
}

/// Terminal outcome of a run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    Downloaded(PathBuf),
    NoResults,
    DownloadTimedOut,
}

impl RunResult {
    pub fn label(&self) -> &'static str {
        match self {
            RunResult::Downloaded(_) => "downloaded",
            RunResult::NoResults => "no_results",
            RunResult::DownloadTimedOut => "download_timed_out",
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            RunResult::Downloaded(path) => Some(path),
            _ => None,
        }
    }
}

/// Summary of one run, printed by `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub key: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub outcome: &'static str,
    pub path: Option<PathBuf>,
    #[serde(skip)]
    pub result: RunResult,
}

/// Everything a run needs besides the request itself.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub entry_url: String,
    pub locators: Arc<LocatorTable>,
    pub timeouts: StepTimeouts,
    pub poll_interval: Duration,
    pub download_timeout: Duration,
    pub download_poll: Duration,
    pub extension: String,
    pub in_progress_suffixes: Vec<String>,
    pub browser: CdpConfig,
}

impl RunSettings {
    pub fn new(entry_url: impl Into<String>) -> Self {
        Self {
            entry_url: entry_url.into(),
            locators: Arc::new(LocatorTable::builtin()),
            timeouts: StepTimeouts::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            download_timeout: Duration::from_secs(120),
            download_poll: Duration::from_secs(1),
            extension: "pdf".to_string(),
            in_progress_suffixes: DEFAULT_IN_PROGRESS_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            browser: CdpConfig::default(),
        }
    }
}

pub struct Runner<L> {
    launcher: L,
    settings: RunSettings,
    clock: Arc<dyn Clock>,
}

impl<L: Launcher> Runner<L> {
    pub fn new(launcher: L, settings: RunSettings) -> Self {
        Self {
            launcher,
            settings,
            clock: Arc::new(TokioClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Execute the request inside a `run` span and summarise it.
    pub async fn run(&self, request: &RunRequest) -> Result<RunReport, RunError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = self.clock.now();
        let span = info_span!("run", %run_id, key = %request.key);

        let result = self.execute(request).instrument(span).await?;
        let elapsed_ms = self.clock.now().saturating_duration_since(started).as_millis() as u64;

        Ok(RunReport {
            run_id,
            key: request.key.clone(),
            started_at,
            elapsed_ms,
            outcome: result.label(),
            path: result.path().map(Path::to_path_buf),
            result,
        })
    }

    /// Provision a session, drive the lookup, tear the session down.
    ///
    /// Shutdown happens exactly once on every path, panics included; a panic
    /// inside the flow is resumed after the browser is gone.
    pub async fn execute(&self, request: &RunRequest) -> Result<RunResult, RunError> {
        tokio::fs::create_dir_all(&request.download_dir).await?;
        let since = whole_seconds(SystemTime::now());

        let config = self
            .settings
            .browser
            .clone()
            .with_download_dir(&request.download_dir)
            .with_headless(request.headless);
        info!(
            download_dir = %request.download_dir.display(),
            headless = request.headless,
            "Launching browser"
        );
        let driver = Arc::new(self.launcher.launch(&config).await.map_err(RunError::Launch)?);

        let outcome = AssertUnwindSafe(self.drive(Arc::clone(&driver), request, since))
            .catch_unwind()
            .await;

        if let Err(err) = driver.shutdown().await {
            warn!(error = %err, "Browser shutdown failed");
        }

        match outcome {
            Ok(result) => {
                match &result {
                    Ok(done) => info!(outcome = done.label(), "Run finished"),
                    Err(err) => warn!(error = %err, "Run failed"),
                }
                result
            }
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    async fn drive(
        &self,
        driver: Arc<L::Driver>,
        request: &RunRequest,
        since: SystemTime,
    ) -> Result<RunResult, RunError> {
        let primitives = Primitives::with_clock(driver, Arc::clone(&self.clock))
            .with_poll_interval(self.settings.poll_interval);
        let workflow = Workflow::new(
            primitives,
            Arc::clone(&self.settings.locators),
            self.settings.entry_url.as_str(),
            self.settings.timeouts,
        );

        if workflow.lookup(&request.credentials, &request.key).await? == QueryOutcome::NoResults {
            return Ok(RunResult::NoResults);
        }
        workflow.request_document().await?;

        let watcher = DownloadWatcher::new(&request.download_dir)
            .with_extension(&self.settings.extension)
            .with_markers(self.settings.in_progress_suffixes.iter().cloned())
            .with_interval(self.settings.download_poll)
            .with_clock(Arc::clone(&self.clock))
            .since(since);

        Ok(match watcher.wait(self.settings.download_timeout).await? {
            DownloadResult::Completed(download) => RunResult::Downloaded(download.path),
            DownloadResult::NotFound => RunResult::DownloadTimedOut,
        })
    }
}

/// Truncate to the second; some filesystems store coarse modification times.
/// Files modified up to 1 s before the run started therefore still count.
fn whole_seconds(time: SystemTime) -> SystemTime {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since_epoch) => UNIX_EPOCH + Duration::from_secs(since_epoch.as_secs()),
        Err(_) => time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_paths() {
        let done = RunResult::Downloaded(PathBuf::from("/tmp/doc.pdf"));
        assert_eq!(done.label(), "downloaded");
        assert_eq!(done.path(), Some(Path::new("/tmp/doc.pdf")));
        assert_eq!(RunResult::NoResults.label(), "no_results");
        assert!(RunResult::DownloadTimedOut.path().is_none());
    }

    #[test]
    fn since_is_truncated_to_whole_seconds() {
        let time = UNIX_EPOCH + Duration::from_millis(12_345);
        assert_eq!(whole_seconds(time), UNIX_EPOCH + Duration::from_secs(12));
    }

    #[test]
    fn truncation_admits_files_from_the_starting_second() {
        let started = UNIX_EPOCH + Duration::from_millis(12_900);
        let modified = UNIX_EPOCH + Duration::from_millis(12_100);
        assert!(modified < started);
        assert!(modified >= whole_seconds(started));
        assert!(UNIX_EPOCH + Duration::from_millis(11_999) < whole_seconds(started));
    }

    #[test]
    fn default_settings_match_portal_timings() {
        let settings = RunSettings::new("http://portal.local");
        assert_eq!(settings.timeouts.results, Duration::from_secs(20));
        assert_eq!(settings.download_timeout, Duration::from_secs(120));
        assert_eq!(settings.in_progress_suffixes, vec![".crdownload", ".part"]);
    }

    #[test]
    fn report_serialises_outcome_label() {
        let report = RunReport {
            run_id: Uuid::nil(),
            key: "87654321".into(),
            started_at: Utc::now(),
            elapsed_ms: 10,
            outcome: RunResult::NoResults.label(),
            path: None,
            result: RunResult::NoResults,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "no_results");
        assert_eq!(json["key"], "87654321");
        assert!(json.get("result").is_none());
    }
}
