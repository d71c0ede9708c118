//! Download completion detection
//!
//! The browser saves the generated document on its own schedule and gives
//! no handle to it, so completion is observed on disk: the newest file with
//! the expected extension counts as finished once its download manager has
//! removed the in-progress sibling.

use action_primitives::{poll_until, Clock, PollSchedule, TokioClock};
use serde::Serialize;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

/// Markers Chromium and Firefox-style managers append to a file mid-transfer.
pub const DEFAULT_IN_PROGRESS_SUFFIXES: [&str; 2] = [".crdownload", ".part"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedDownload {
    pub path: PathBuf,
    #[serde(skip)]
    pub modified: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadResult {
    Completed(CompletedDownload),
    NotFound,
}

/// Polls one directory for a finished download.
#[derive(Clone)]
pub struct DownloadWatcher {
    dir: PathBuf,
    extension: String,
    markers: Vec<String>,
    interval: Duration,
    clock: Arc<dyn Clock>,
    since: Option<SystemTime>,
}

impl DownloadWatcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: "pdf".to_string(),
            markers: DEFAULT_IN_PROGRESS_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            interval: Duration::from_secs(1),
            clock: Arc::new(TokioClock),
            since: None,
        }
    }

    /// Extension to match, with or without the leading dot.
    pub fn with_extension(mut self, extension: impl AsRef<str>) -> Self {
        self.extension = extension.as_ref().trim_start_matches('.').to_string();
        self
    }

    pub fn with_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Ignore files last modified before `since`.
    ///
    /// The runner passes its start time truncated to the whole second, so a
    /// file modified up to 1 s before the run started is still accepted.
    pub fn since(mut self, since: SystemTime) -> Self {
        self.since = Some(since);
        self
    }

    /// Poll until a completed file shows up or `timeout` elapses.
    pub async fn wait(&self, timeout: Duration) -> io::Result<DownloadResult> {
        info!(
            dir = %self.dir.display(),
            extension = %self.extension,
            timeout_ms = timeout.as_millis() as u64,
            "Waiting for download"
        );

        let schedule = PollSchedule::new(timeout, self.interval);
        let found = poll_until(self.clock.as_ref(), schedule, move || self.check()).await?;

        Ok(match found {
            Some(download) => {
                info!(path = %download.path.display(), "Download completed");
                DownloadResult::Completed(download)
            }
            None => {
                info!(dir = %self.dir.display(), "No completed download before deadline");
                DownloadResult::NotFound
            }
        })
    }

    /// One detection pass: the newest candidate, if its transfer has finished.
    pub async fn check(&self) -> io::Result<Option<CompletedDownload>> {
        let Some(candidate) = self.newest_candidate().await? else {
            return Ok(None);
        };

        for marker in &self.markers {
            let sibling = marker_path(&candidate.path, marker);
            if tokio::fs::metadata(&sibling).await.is_ok() {
                debug!(
                    path = %candidate.path.display(),
                    marker = %sibling.display(),
                    "Download still in progress"
                );
                return Ok(None);
            }
        }
        Ok(Some(candidate))
    }

    /// Most recently modified matching file; ties go to the greatest path.
    pub async fn newest_candidate(&self) -> io::Result<Option<CompletedDownload>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };

        let mut newest: Option<CompletedDownload> = None;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !self.matches_extension(&path) {
                continue;
            }
            // The file may be renamed or removed between listing and stat.
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            if self.since.is_some_and(|since| modified < since) {
                continue;
            }

            let newer = match &newest {
                Some(current) => (modified, &path) > (current.modified, &current.path),
                None => true,
            };
            if newer {
                newest = Some(CompletedDownload { path, modified });
            }
        }
        Ok(newest)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

/// `<file><suffix>`: the full file name with the marker appended.
fn marker_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
