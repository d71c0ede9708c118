//! Error handling module
//!
//! Failures that end a run without one of its three terminal outcomes.

use action_primitives::ActionError;
use cdp_adapter::AdapterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    /// The browser session could not be provisioned
    #[error("failed to provision browser session")]
    Launch(#[source] AdapterError),

    /// A step of the page flow failed (missing element, protocol failure)
    #[error(transparent)]
    Action(#[from] ActionError),

    /// Download directory could not be prepared or scanned
    #[error("download directory error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    /// A required element never appeared: the page changed or login failed.
    pub fn is_element_not_found(&self) -> bool {
        matches!(self, RunError::Action(err) if err.is_element_not_found())
    }
}
