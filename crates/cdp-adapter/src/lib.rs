//! Chromium DevTools Protocol adapter for portal-fetch.
//!
//! Higher layers talk to the browser through [`PageDriver`], an XPath-addressed
//! surface small enough to be implemented both by the real Chromium session
//! ([`ChromeDriver`]) and by the in-memory [`ScriptedDriver`] used in tests.

use std::{env, path::PathBuf};
use which::which;

mod chrome;
mod driver;
mod scripted;
mod scripts;

pub use chrome::{ChromeDriver, ChromeLauncher};
pub use driver::{ElementState, Launcher, PageDriver};
pub use error::{AdapterError, AdapterErrorKind};
pub use scripted::{DriverCall, ScriptedDriver, ScriptedElement, ScriptedLauncher};

pub mod error {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use thiserror::Error;

    /// High-level error categories surfaced by the adapter.
    #[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
    pub enum AdapterErrorKind {
        #[error("navigation timed out")]
        NavTimeout,
        #[error("cdp i/o failure")]
        CdpIo,
        #[error("target element not found")]
        TargetNotFound,
        #[error("click intercepted by another element")]
        ClickIntercepted,
        #[error("internal error")]
        Internal,
    }

    /// Enriched error metadata passed back to higher layers.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AdapterError {
        pub kind: AdapterErrorKind,
        pub hint: Option<String>,
    }

    impl fmt::Display for AdapterError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.kind)?;
            if let Some(hint) = &self.hint {
                write!(f, ": {}", hint)?;
            }
            Ok(())
        }
    }

    impl std::error::Error for AdapterError {}

    impl AdapterError {
        pub fn new(kind: AdapterErrorKind) -> Self {
            Self { kind, hint: None }
        }

        pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
            self.hint = Some(hint.into());
            self
        }

        pub fn is_intercepted(&self) -> bool {
            self.kind == AdapterErrorKind::ClickIntercepted
        }
    }

    impl From<chromiumoxide::error::CdpError> for AdapterError {
        fn from(err: chromiumoxide::error::CdpError) -> Self {
            AdapterError::new(AdapterErrorKind::CdpIo).with_hint(err.to_string())
        }
    }
}

pub mod config {
    use crate::detect_chrome_executable;
    use serde::{Deserialize, Serialize};
    use std::path::PathBuf;

    /// Configuration for launching one browser session.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct CdpConfig {
        /// Browser binary; empty lets chromiumoxide search on its own.
        pub executable: PathBuf,
        pub headless: bool,
        /// Directory the browser saves downloads into, without prompting.
        pub download_dir: PathBuf,
        pub no_sandbox: bool,
        pub window_width: u32,
        pub window_height: u32,
        pub request_timeout_ms: u64,
        pub launch_timeout_ms: u64,
    }

    impl Default for CdpConfig {
        fn default() -> Self {
            Self {
                executable: detect_chrome_executable().unwrap_or_default(),
                headless: true,
                download_dir: PathBuf::from("downloads"),
                no_sandbox: false,
                window_width: 1920,
                window_height: 1080,
                request_timeout_ms: 30_000,
                launch_timeout_ms: 20_000,
            }
        }
    }

    impl CdpConfig {
        pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
            self.download_dir = dir.into();
            self
        }

        pub fn with_headless(mut self, headless: bool) -> Self {
            self.headless = headless;
            self
        }
    }
}

pub use config::CdpConfig;

/// Locate a Chromium-family binary: `PORTAL_FETCH_CHROME` first, then `PATH`.
pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("PORTAL_FETCH_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    chrome_executable_names()
        .iter()
        .find_map(|name| which(name).ok())
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}
