//! Wait primitive - Presence waits and optional lookup

use crate::{
    errors::ActionError,
    locator::Locator,
    primitives::Primitives,
    types::{ElementRef, WaitCondition},
    waiting::poll_until,
};
use cdp_adapter::PageDriver;
use std::time::Duration;
use tracing::{debug, info};

pub(crate) async fn execute_wait_for<D: PageDriver>(
    primitives: &Primitives<D>,
    locator: &Locator,
    timeout: Duration,
) -> Result<Option<ElementRef>, ActionError> {
    debug!(
        target_name = locator.name(),
        timeout_ms = timeout.as_millis() as u64,
        "Waiting for element presence"
    );

    let driver = primitives.driver();
    let found = poll_until(
        primitives.clock().as_ref(),
        primitives.schedule(timeout),
        move || async move {
            let state = driver.probe(locator.path()).await?;
            Ok::<_, ActionError>(state.present.then(|| ElementRef::from(locator)))
        },
    )
    .await?;

    if found.is_some() {
        debug!(target_name = locator.name(), "Element present");
    }
    Ok(found)
}

pub(crate) async fn execute_wait_present<D: PageDriver>(
    primitives: &Primitives<D>,
    locator: &Locator,
    timeout: Duration,
) -> Result<ElementRef, ActionError> {
    match execute_wait_for(primitives, locator, timeout).await? {
        Some(element) => Ok(element),
        None => {
            info!(
                target_name = locator.name(),
                path = locator.path(),
                "Element never appeared"
            );
            Err(ActionError::ElementNotFound {
                name: locator.name().to_string(),
                path: locator.path().to_string(),
                condition: WaitCondition::Present,
                waited_ms: timeout.as_millis() as u64,
            })
        }
    }
}

pub(crate) async fn execute_find_optional<D: PageDriver>(
    primitives: &Primitives<D>,
    locator: &Locator,
) -> Result<Option<ElementRef>, ActionError> {
    let state = primitives.driver().probe(locator.path()).await?;
    Ok(state.present.then(|| ElementRef::from(locator)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{locator::Target, waiting::ManualClock};
    use cdp_adapter::{ScriptedDriver, ScriptedElement};
    use std::sync::Arc;

    fn fixture(driver: ScriptedDriver) -> (Primitives<ScriptedDriver>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let primitives = Primitives::with_clock(Arc::new(driver), clock.clone())
            .with_poll_interval(Duration::from_millis(500));
        (primitives, clock)
    }

    #[tokio::test]
    async fn wait_present_returns_handle_once_rendered() {
        let locator = Locator::new(Target::Username, "/html/body/form/input");
        let driver = ScriptedDriver::new()
            .with_element(locator.path(), ScriptedElement::interactable().appearing_after(3));
        let (primitives, clock) = fixture(driver);

        let element = primitives
            .wait_present(&locator, Duration::from_secs(40))
            .await
            .unwrap();

        assert_eq!(element.name, "username");
        assert_eq!(clock.elapsed(), Duration::from_millis(1_500));
    }

    #[tokio::test]
    async fn wait_present_times_out_with_element_not_found() {
        let locator = Locator::new(Target::LookupInput, "/html/body/missing");
        let (primitives, clock) = fixture(ScriptedDriver::new());

        let err = primitives
            .wait_present(&locator, Duration::from_secs(2))
            .await
            .unwrap_err();

        match err {
            ActionError::ElementNotFound {
                name,
                condition,
                waited_ms,
                ..
            } => {
                assert_eq!(name, "lookup_input");
                assert_eq!(condition, WaitCondition::Present);
                assert_eq!(waited_ms, 2_000);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(clock.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn hidden_element_counts_as_present() {
        let locator = Locator::new(Target::DocumentTrigger, "/html/body/input");
        let driver = ScriptedDriver::new().with_element(locator.path(), ScriptedElement::hidden());
        let (primitives, _) = fixture(driver);

        assert!(primitives
            .wait_for(&locator, Duration::from_secs(1))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn find_optional_does_not_wait() {
        let locator = Locator::new(Target::ResultIndicator, "/html/body/div");
        let driver = ScriptedDriver::new()
            .with_element(locator.path(), ScriptedElement::interactable().appearing_after(1));
        let (primitives, clock) = fixture(driver);

        assert!(primitives.find_optional(&locator).await.unwrap().is_none());
        assert_eq!(clock.elapsed(), Duration::ZERO);
        assert!(primitives.find_optional(&locator).await.unwrap().is_some());
    }
}
