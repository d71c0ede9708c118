//! Navigate primitive - Load a URL

use crate::{errors::ActionError, primitives::Primitives};
use cdp_adapter::PageDriver;
use tracing::{info, warn};

pub(crate) async fn execute_navigate<D: PageDriver>(
    primitives: &Primitives<D>,
    url: &str,
) -> Result<(), ActionError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ActionError::Internal("Empty navigation URL".to_string()));
    }

    info!(url = trimmed, "Navigating");
    primitives.driver().navigate(trimmed).await.map_err(|err| {
        warn!("navigation to {} failed: {}", trimmed, err);
        ActionError::from(err)
    })
}
