//! portal-fetch library
//!
//! Signs in to the portal, looks up one key and collects the generated
//! document. Exposes modules for integration testing.

pub mod cli;
pub mod config;
pub mod download;
pub mod errors;
pub mod runner;
pub mod workflow;

// Re-export commonly used types for external use
pub use config::{AppConfig, SettingsError};
pub use download::{CompletedDownload, DownloadResult, DownloadWatcher};
pub use errors::RunError;
pub use runner::{RunReport, RunRequest, RunResult, RunSettings, Runner};
pub use workflow::{Credentials, QueryOutcome, StepTimeouts, Workflow};
