//! Click primitive - Click element with scripted fallback

use crate::{
    errors::ActionError,
    locator::Locator,
    primitives::Primitives,
    types::{ClickMethod, ClickReport, ElementRef, WaitCondition},
    waiting::poll_until,
};
use cdp_adapter::PageDriver;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Execute click primitive
///
/// Steps:
/// 1. Poll until the element is present, visible and enabled
/// 2. Deliver a native pointer click
/// 3. If an overlay intercepts it, activate the element from script instead
pub(crate) async fn execute_click<D: PageDriver>(
    primitives: &Primitives<D>,
    locator: &Locator,
    timeout: Duration,
) -> Result<ClickReport, ActionError> {
    let clock = primitives.clock();
    let started = clock.now();

    info!(
        target_name = locator.name(),
        timeout_ms = timeout.as_millis() as u64,
        "Executing click primitive"
    );

    let driver = primitives.driver();
    let ready = poll_until(clock.as_ref(), primitives.schedule(timeout), move || async move {
        let state = driver.probe(locator.path()).await?;
        Ok::<_, ActionError>(state.is_interactable().then_some(()))
    })
    .await?;

    if ready.is_none() {
        return Err(ActionError::ElementNotFound {
            name: locator.name().to_string(),
            path: locator.path().to_string(),
            condition: WaitCondition::Clickable,
            waited_ms: timeout.as_millis() as u64,
        });
    }

    let method = match driver.click(locator.path()).await {
        Ok(()) => ClickMethod::Native,
        Err(err) if err.is_intercepted() => {
            warn!(
                target_name = locator.name(),
                reason = %err,
                "Native click intercepted, activating from script"
            );
            driver.scripted_click(locator.path()).await?;
            ClickMethod::Scripted
        }
        Err(err) => return Err(err.into()),
    };

    let latency_ms = clock.now().saturating_duration_since(started).as_millis() as u64;
    debug!(
        target_name = locator.name(),
        method = ?method,
        latency_ms,
        "Click completed"
    );

    Ok(ClickReport { method, latency_ms })
}

/// Clear hidden/disabled presentation, then activate from script.
///
/// A pointer click cannot target an element the page keeps hidden.
pub(crate) async fn execute_activate_hidden<D: PageDriver>(
    primitives: &Primitives<D>,
    element: &ElementRef,
) -> Result<(), ActionError> {
    info!(target_name = %element.name, "Activating hidden element");
    let driver = primitives.driver();
    driver.reveal(&element.path).await?;
    driver.scripted_click(&element.path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{locator::Target, waiting::ManualClock};
    use cdp_adapter::{AdapterErrorKind, DriverCall, ScriptedDriver, ScriptedElement};
    use std::sync::Arc;

    const BUTTON: &str = "/html/body/form/input[3]";

    fn primitives(driver: &ScriptedDriver) -> (Primitives<ScriptedDriver>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let primitives = Primitives::with_clock(Arc::new(driver.clone()), clock.clone())
            .with_poll_interval(Duration::from_millis(250));
        (primitives, clock)
    }

    #[tokio::test]
    async fn native_click_when_unobstructed() {
        let driver = ScriptedDriver::new().with_element(BUTTON, ScriptedElement::interactable());
        let (primitives, _) = primitives(&driver);

        let report = primitives
            .click(&Locator::new(Target::LookupSubmit, BUTTON), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(report.method, ClickMethod::Native);
        assert_eq!(driver.calls(), vec![DriverCall::Click(BUTTON.into())]);
    }

    #[tokio::test]
    async fn intercepted_click_falls_back_to_script() {
        let driver =
            ScriptedDriver::new().with_element(BUTTON, ScriptedElement::interactable().intercepted());
        let (primitives, _) = primitives(&driver);

        let report = primitives
            .click(&Locator::new(Target::LookupSubmit, BUTTON), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(report.method, ClickMethod::Scripted);
        assert_eq!(
            driver.calls(),
            vec![
                DriverCall::Click(BUTTON.into()),
                DriverCall::ScriptedClick(BUTTON.into())
            ]
        );
    }

    #[tokio::test]
    async fn waits_until_enabled() {
        let driver = ScriptedDriver::new().with_element(BUTTON, ScriptedElement::disabled());
        let (primitives, clock) = primitives(&driver);
        let locator = Locator::new(Target::DetailTrigger, BUTTON);

        let err = primitives
            .click(&locator, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ActionError::ElementNotFound {
                condition: WaitCondition::Clickable,
                ..
            }
        ));
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
        assert!(driver.calls().is_empty());
    }

    #[tokio::test]
    async fn other_click_failures_propagate() {
        let driver = ScriptedDriver::new()
            .with_element(BUTTON, ScriptedElement::interactable())
            .fail_when(
                |call| matches!(call, DriverCall::Click(_)),
                AdapterErrorKind::CdpIo,
            );
        let (primitives, _) = primitives(&driver);

        let err = primitives
            .click(&Locator::new(Target::LookupSubmit, BUTTON), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::CdpIo(_)));
        assert!(!driver
            .calls()
            .contains(&DriverCall::ScriptedClick(BUTTON.into())));
    }

    #[tokio::test]
    async fn hidden_element_is_revealed_then_scripted() {
        let driver = ScriptedDriver::new().with_element(BUTTON, ScriptedElement::hidden());
        let (primitives, _) = primitives(&driver);
        let element = ElementRef::from(&Locator::new(Target::DocumentTrigger, BUTTON));

        primitives.activate_hidden(&element).await.unwrap();

        assert_eq!(
            driver.calls(),
            vec![
                DriverCall::Reveal(BUTTON.into()),
                DriverCall::ScriptedClick(BUTTON.into())
            ]
        );
    }
}
