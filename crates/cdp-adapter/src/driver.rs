use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{config::CdpConfig, error::AdapterError};

/// Snapshot of one element as seen by a single probe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    pub present: bool,
    pub visible: bool,
    pub enabled: bool,
}

impl ElementState {
    pub fn missing() -> Self {
        Self::default()
    }

    /// Present, rendered and not disabled. Obstruction is only known at click time.
    pub fn is_interactable(&self) -> bool {
        self.present && self.visible && self.enabled
    }
}

/// Browser operations addressed by structural path (XPath).
///
/// Implementations never wait: every call is a single round trip. Waiting and
/// retry policy live in the layer above.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load `url` in the session's page.
    async fn navigate(&self, url: &str) -> Result<(), AdapterError>;

    /// Inspect the element at `path` without failing when it is absent.
    async fn probe(&self, path: &str) -> Result<ElementState, AdapterError>;

    /// Native pointer click. Fails with `ClickIntercepted` when another element
    /// sits on top of the target's centre point.
    async fn click(&self, path: &str) -> Result<(), AdapterError>;

    /// Activate the element from script, ignoring pointer geometry.
    async fn scripted_click(&self, path: &str) -> Result<(), AdapterError>;

    /// Strip hidden/disabled presentation so the element can be activated.
    async fn reveal(&self, path: &str) -> Result<(), AdapterError>;

    /// Clear the field and type `text` into it.
    async fn fill(&self, path: &str, text: &str) -> Result<(), AdapterError>;

    /// Submit the form that owns the element.
    async fn submit_form(&self, path: &str) -> Result<(), AdapterError>;

    /// Terminate the browser. Calling it again is a no-op.
    async fn shutdown(&self) -> Result<(), AdapterError>;
}

/// Provisions browser sessions.
#[async_trait]
pub trait Launcher: Send + Sync {
    type Driver: PageDriver + 'static;

    async fn launch(&self, config: &CdpConfig) -> Result<Self::Driver, AdapterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_element_is_not_interactable() {
        assert!(!ElementState::missing().is_interactable());
    }

    #[test]
    fn hidden_or_disabled_element_is_not_interactable() {
        let hidden = ElementState {
            present: true,
            visible: false,
            enabled: true,
        };
        let disabled = ElementState {
            present: true,
            visible: true,
            enabled: false,
        };
        assert!(!hidden.is_interactable());
        assert!(!disabled.is_interactable());
    }
}
