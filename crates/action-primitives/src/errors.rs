//! Error types for action primitives

use cdp_adapter::{AdapterError, AdapterErrorKind};
use thiserror::Error;

use crate::types::WaitCondition;

/// Error types for action primitive operations
#[derive(Debug, Error, Clone)]
pub enum ActionError {
    /// A required element never reached the awaited condition
    #[error("Element '{name}' not {condition} after {waited_ms}ms ({path})")]
    ElementNotFound {
        name: String,
        path: String,
        condition: WaitCondition,
        waited_ms: u64,
    },

    /// Element vanished between being found and being acted on
    #[error("Element detached: {0}")]
    Detached(String),

    /// Navigation timed out waiting for page load
    #[error("Navigation timeout: {0}")]
    NavTimeout(String),

    /// CDP communication or protocol error
    #[error("CDP I/O error: {0}")]
    CdpIo(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    pub fn is_element_not_found(&self) -> bool {
        matches!(self, ActionError::ElementNotFound { .. })
    }
}

impl From<AdapterError> for ActionError {
    fn from(err: AdapterError) -> Self {
        let message = err.to_string();
        match err.kind {
            AdapterErrorKind::TargetNotFound => ActionError::Detached(message),
            AdapterErrorKind::NavTimeout => ActionError::NavTimeout(message),
            AdapterErrorKind::CdpIo => ActionError::CdpIo(message),
            AdapterErrorKind::ClickIntercepted | AdapterErrorKind::Internal => {
                ActionError::Internal(message)
            }
        }
    }
}
