//! Action primitives implementation
//!
//! Core primitives for structural-path automation:
//! 1. navigate - Load a URL
//! 2. wait - Bounded presence waits and the non-waiting optional lookup
//! 3. click - Click with scripted fallback, plus hidden-element activation
//! 4. type_text - Fill fields and submit their form

mod click;
mod navigate;
mod type_text;
mod wait;

use cdp_adapter::PageDriver;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    errors::ActionError,
    locator::Locator,
    types::{ClickReport, ElementRef},
    waiting::{Clock, PollSchedule, TokioClock},
};

/// Default cadence of element polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Wait/interact operations over one browser page.
///
/// Every wait is a bounded poll driven by the configured [`Clock`]; nothing
/// here retries beyond its own deadline.
pub struct Primitives<D> {
    /// Page the primitives act on
    driver: Arc<D>,

    /// Time source for polling and latency measurement
    clock: Arc<dyn Clock>,

    poll_interval: Duration,
}

impl<D: PageDriver> Primitives<D> {
    /// Create primitives on the wall clock
    pub fn new(driver: Arc<D>) -> Self {
        Self::with_clock(driver, Arc::new(TokioClock))
    }

    /// Create primitives on a custom clock
    pub fn with_clock(driver: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self {
            driver,
            clock,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) fn schedule(&self, timeout: Duration) -> PollSchedule {
        PollSchedule::new(timeout, self.poll_interval)
    }

    /// Load `url` in the page
    pub async fn navigate(&self, url: &str) -> Result<(), ActionError> {
        navigate::execute_navigate(self, url).await
    }

    /// Wait until the element exists; `Ok(None)` once `timeout` elapses.
    ///
    /// Use this when the element's absence is itself a meaningful answer.
    pub async fn wait_for(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<ElementRef>, ActionError> {
        wait::execute_wait_for(self, locator, timeout).await
    }

    /// Wait until the element exists; `ElementNotFound` once `timeout` elapses.
    pub async fn wait_present(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ElementRef, ActionError> {
        wait::execute_wait_present(self, locator, timeout).await
    }

    /// Look the element up once, without waiting.
    pub async fn find_optional(&self, locator: &Locator) -> Result<Option<ElementRef>, ActionError> {
        wait::execute_find_optional(self, locator).await
    }

    /// Wait until the element is clickable and click it.
    pub async fn click(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ClickReport, ActionError> {
        click::execute_click(self, locator, timeout).await
    }

    /// Make a hidden element interactable and activate it from script.
    pub async fn activate_hidden(&self, element: &ElementRef) -> Result<(), ActionError> {
        click::execute_activate_hidden(self, element).await
    }

    /// Replace the field's content with `text`.
    pub async fn fill(&self, element: &ElementRef, text: &str) -> Result<(), ActionError> {
        type_text::execute_fill(self, element, text).await
    }

    /// Submit the form owning `element`.
    pub async fn submit(&self, element: &ElementRef) -> Result<(), ActionError> {
        type_text::execute_submit(self, element).await
    }
}
