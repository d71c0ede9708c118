//! Core data types for action primitives

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::locator::Locator;

/// Condition a wait polls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitCondition {
    /// Element exists in the document
    Present,

    /// Element exists, is visible and is enabled
    Clickable,
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitCondition::Present => write!(f, "present"),
            WaitCondition::Clickable => write!(f, "clickable"),
        }
    }
}

/// Handle to an element that was present at the time it was resolved.
///
/// Holds the locator rather than a live node reference; each later operation
/// resolves the path again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    pub name: String,
    pub path: String,
}

impl From<&Locator> for ElementRef {
    fn from(locator: &Locator) -> Self {
        Self {
            name: locator.name().to_string(),
            path: locator.path().to_string(),
        }
    }
}

/// How a click was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickMethod {
    /// Simulated pointer input
    Native,

    /// Script activation after the pointer click was intercepted
    Scripted,
}

/// Outcome of a successful click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickReport {
    pub method: ClickMethod,
    pub latency_ms: u64,
}
