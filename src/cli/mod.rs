//! Command-line front end: argument parsing, `.env` loading, logging setup
//! and outcome printing around one [`Runner`](crate::runner::Runner) run.

mod app;
mod env;
mod output;
mod runtime;

pub use app::run;
pub use env::CliArgs;
pub use output::{exit_code, exit_status, render, OutputFormat};
pub use runtime::{init_logging, load_dotenv, DotenvOutcome};
