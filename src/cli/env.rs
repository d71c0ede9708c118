use clap::Parser;
use std::path::PathBuf;

use super::output::OutputFormat;

/// Sign in to the portal, look up a key and download its document.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Lookup key (national ID number)
    #[arg(short, long, visible_alias = "dni", value_name = "KEY")]
    pub key: String,

    /// Portal username
    #[arg(short, long, env = "PORTAL_FETCH_USERNAME")]
    pub username: String,

    /// Portal password
    #[arg(short, long, env = "PORTAL_FETCH_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Directory the document is saved into (created if missing)
    #[arg(long, value_name = "DIR", default_value = "downloads")]
    pub download_dir: PathBuf,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// Output format
    #[arg(short, long, default_value = "human")]
    pub output: OutputFormat,

    /// Shorthand for `--output json`
    #[arg(long, conflicts_with = "output")]
    pub json: bool,
}

impl CliArgs {
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.output
        }
    }
}
