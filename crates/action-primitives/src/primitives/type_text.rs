//! Type text primitive - Fill fields and submit forms

use crate::{errors::ActionError, primitives::Primitives, types::ElementRef};
use cdp_adapter::PageDriver;
use tracing::debug;

pub(crate) async fn execute_fill<D: PageDriver>(
    primitives: &Primitives<D>,
    element: &ElementRef,
    text: &str,
) -> Result<(), ActionError> {
    // Field contents may be secrets; log only the length.
    debug!(target_name = %element.name, chars = text.chars().count(), "Filling field");
    primitives.driver().fill(&element.path, text).await?;
    Ok(())
}

pub(crate) async fn execute_submit<D: PageDriver>(
    primitives: &Primitives<D>,
    element: &ElementRef,
) -> Result<(), ActionError> {
    debug!(target_name = %element.name, "Submitting enclosing form");
    primitives.driver().submit_form(&element.path).await?;
    Ok(())
}
