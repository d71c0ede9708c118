//! Layered settings: embedded defaults, an optional TOML file, then
//! `PORTAL_FETCH__SECTION__KEY` environment variables.

use crate::runner::RunSettings;
use crate::workflow::StepTimeouts;
use action_primitives::{LocatorError, LocatorTable, Target};
use cdp_adapter::CdpConfig;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// File consulted when `--config` is not given.
pub const LOCAL_CONFIG: &str = "config/portal-fetch.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("configuration file not found: {0}")]
    MissingFile(PathBuf),

    #[error("unknown locator '{0}'")]
    UnknownLocator(String),

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortalSettings {
    pub entry_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutSettings {
    pub login_secs: u64,
    pub navigation_secs: u64,
    pub element_secs: u64,
    pub results_secs: u64,
    pub detail_secs: u64,
    pub document_secs: u64,
    pub download_secs: u64,
    pub poll_interval_ms: u64,
    pub download_poll_ms: u64,
}

impl TimeoutSettings {
    pub fn steps(&self) -> StepTimeouts {
        StepTimeouts {
            login: Duration::from_secs(self.login_secs),
            navigation: Duration::from_secs(self.navigation_secs),
            element: Duration::from_secs(self.element_secs),
            results: Duration::from_secs(self.results_secs),
            detail: Duration::from_secs(self.detail_secs),
            document: Duration::from_secs(self.document_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    #[serde(default)]
    pub executable: Option<PathBuf>,
    pub no_sandbox: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub request_timeout_secs: u64,
    pub launch_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadSettings {
    pub extension: String,
    pub in_progress_suffixes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub portal: PortalSettings,
    pub timeouts: TimeoutSettings,
    pub browser: BrowserSettings,
    pub download: DownloadSettings,
    /// Path overrides keyed by target name (`lookup_input`, ...)
    #[serde(default)]
    pub locators: BTreeMap<String, String>,
}

impl AppConfig {
    /// Load settings, reading `explicit` if given, else the first default
    /// location that exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(SettingsError::MissingFile(path.to_path_buf()));
                }
                debug!(path = %path.display(), "Using configuration file");
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
            None => {
                if let Some(path) = default_locations().into_iter().find(|p| p.is_file()) {
                    debug!(path = %path.display(), "Using configuration file");
                    builder = builder.add_source(File::from(path).format(FileFormat::Toml));
                }
            }
        }

        let config = builder
            .add_source(
                Environment::with_prefix("PORTAL_FETCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("download.in_progress_suffixes"),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Built-in defaults only.
    pub fn builtin() -> Result<Self, SettingsError> {
        let config = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn locator_table(&self) -> Result<LocatorTable, SettingsError> {
        let mut overrides = BTreeMap::new();
        for (name, path) in &self.locators {
            let target = Target::ALL
                .iter()
                .copied()
                .find(|t| t.as_str() == name.as_str())
                .ok_or_else(|| SettingsError::UnknownLocator(name.clone()))?;
            overrides.insert(target, path.clone());
        }
        Ok(LocatorTable::builtin().with_overrides(&overrides)?)
    }

    pub fn cdp_config(&self) -> CdpConfig {
        let mut cdp = CdpConfig::default();
        if let Some(executable) = &self.browser.executable {
            cdp.executable = executable.clone();
        }
        cdp.no_sandbox = self.browser.no_sandbox;
        cdp.window_width = self.browser.window_width;
        cdp.window_height = self.browser.window_height;
        cdp.request_timeout_ms = self.browser.request_timeout_secs * 1_000;
        cdp.launch_timeout_ms = self.browser.launch_timeout_secs * 1_000;
        cdp
    }

    pub fn run_settings(&self) -> Result<RunSettings, SettingsError> {
        let mut settings = RunSettings::new(self.portal.entry_url.clone());
        settings.locators = Arc::new(self.locator_table()?);
        settings.timeouts = self.timeouts.steps();
        settings.poll_interval = interval("poll_interval_ms", self.timeouts.poll_interval_ms)?;
        settings.download_timeout = Duration::from_secs(self.timeouts.download_secs);
        settings.download_poll = interval("download_poll_ms", self.timeouts.download_poll_ms)?;
        settings.extension = self.download.extension.clone();
        settings.in_progress_suffixes = self.download.in_progress_suffixes.clone();
        settings.browser = self.cdp_config();
        Ok(settings)
    }
}

/// A zero interval would spin the poll loops.
fn interval(name: &'static str, millis: u64) -> Result<Duration, SettingsError> {
    if millis == 0 {
        return Err(SettingsError::ZeroInterval(name));
    }
    Ok(Duration::from_millis(millis))
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(LOCAL_CONFIG)];
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("portal-fetch").join("config.toml"));
    }
    locations
}
