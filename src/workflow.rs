//! Portal page flow: sign in, open the lookup screen, query a key, and
//! reach the document for a hit.

use action_primitives::{ActionError, Locator, LocatorTable, Primitives, Target};
use cdp_adapter::PageDriver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Per-step wait budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTimeouts {
    /// Login fields; the first page load is the slowest step
    pub login: Duration,
    /// Feature entry link on the workspace
    pub navigation: Duration,
    /// Lookup field and submit button
    pub element: Duration,
    /// Result row; expiry means "no results", so this stays short
    pub results: Duration,
    pub detail: Duration,
    pub document: Duration,
}

impl Default for StepTimeouts {
    fn default() -> Self {
        Self {
            login: Duration::from_secs(40),
            navigation: Duration::from_secs(40),
            element: Duration::from_secs(40),
            results: Duration::from_secs(20),
            detail: Duration::from_secs(30),
            document: Duration::from_secs(40),
        }
    }
}

/// Portal identity and secret.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What the portal answered for a lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOutcome {
    /// A result row rendered; the detail view is reachable
    Found,
    /// The key matched nothing
    NoResults,
}

pub struct Workflow<D> {
    primitives: Primitives<D>,
    locators: Arc<LocatorTable>,
    entry_url: String,
    timeouts: StepTimeouts,
}

impl<D: PageDriver> Workflow<D> {
    pub fn new(
        primitives: Primitives<D>,
        locators: Arc<LocatorTable>,
        entry_url: impl Into<String>,
        timeouts: StepTimeouts,
    ) -> Self {
        Self {
            primitives,
            locators,
            entry_url: entry_url.into(),
            timeouts,
        }
    }

    fn locator(&self, target: Target) -> &Locator {
        self.locators.get(target)
    }

    /// Steps 1 to 5: authenticate through opening the detail view of a hit.
    pub async fn lookup(
        &self,
        credentials: &Credentials,
        key: &str,
    ) -> Result<QueryOutcome, ActionError> {
        self.authenticate(credentials).await?;
        self.enter_feature_area().await?;
        self.submit_lookup(key).await?;

        let outcome = self.classify().await?;
        if outcome == QueryOutcome::Found {
            self.open_detail().await?;
        }
        Ok(outcome)
    }

    /// Load the entry page, fill both credentials and submit the login form.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<(), ActionError> {
        info!(username = %credentials.username, "Signing in");
        self.primitives.navigate(&self.entry_url).await?;

        let username = self
            .primitives
            .wait_present(self.locator(Target::Username), self.timeouts.login)
            .await?;
        let password = self
            .primitives
            .wait_present(self.locator(Target::Password), self.timeouts.login)
            .await?;

        self.primitives
            .fill(&username, &credentials.username)
            .await?;
        self.primitives
            .fill(&password, credentials.password())
            .await?;
        // The login form accepts direct submission; there is no button to wait on.
        self.primitives.submit(&password).await
    }

    /// Click the feature entry, retrying once on its structural parent.
    ///
    /// The entry sometimes renders as a decorative span inside the clickable
    /// anchor. Only one retry is made; its failure is returned as is.
    pub async fn enter_feature_area(&self) -> Result<(), ActionError> {
        let entry = self.locator(Target::FeatureEntry);
        let err = match self.primitives.click(entry, self.timeouts.navigation).await {
            Ok(_) => {
                info!("Entered feature area");
                return Ok(());
            }
            Err(err) if err.is_element_not_found() => err,
            Err(err) => return Err(err),
        };

        let Some(parent) = entry.parent() else {
            return Err(err);
        };
        warn!(
            failed = %err,
            fallback = parent.path(),
            "Feature entry not clickable, retrying on its parent"
        );
        self.primitives
            .click(&parent, self.timeouts.navigation)
            .await?;
        info!("Entered feature area through parent element");
        Ok(())
    }

    /// Type the lookup key and press the query button.
    pub async fn submit_lookup(&self, key: &str) -> Result<(), ActionError> {
        info!(key, "Submitting lookup");
        let input = self
            .primitives
            .wait_present(self.locator(Target::LookupInput), self.timeouts.element)
            .await?;
        self.primitives.fill(&input, key).await?;
        self.primitives
            .click(self.locator(Target::LookupSubmit), self.timeouts.element)
            .await?;
        Ok(())
    }

    /// Decide whether the lookup produced a result row.
    ///
    /// An unknown key renders no error element, only the absence of the row,
    /// so the expiry of this bounded wait is the "no results" answer.
    pub async fn classify(&self) -> Result<QueryOutcome, ActionError> {
        let indicator = self
            .primitives
            .wait_for(self.locator(Target::ResultIndicator), self.timeouts.results)
            .await?;

        let outcome = match indicator {
            Some(_) => QueryOutcome::Found,
            None => QueryOutcome::NoResults,
        };
        info!(outcome = ?outcome, "Lookup classified");
        Ok(outcome)
    }

    /// Select the result row, then open its detail view.
    ///
    /// The detail trigger only becomes available once the row is selected.
    pub async fn open_detail(&self) -> Result<(), ActionError> {
        self.primitives
            .click(self.locator(Target::ResultIndicator), self.timeouts.results)
            .await?;
        self.primitives
            .click(self.locator(Target::DetailTrigger), self.timeouts.detail)
            .await?;
        Ok(())
    }

    /// Activate the hidden control that makes the portal generate the document.
    pub async fn request_document(&self) -> Result<(), ActionError> {
        let trigger = self
            .primitives
            .wait_present(self.locator(Target::DocumentTrigger), self.timeouts.document)
            .await?;
        self.primitives.activate_hidden(&trigger).await?;
        info!("Document generation requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::ManualClock;
    use cdp_adapter::{AdapterErrorKind, DriverCall, ScriptedDriver, ScriptedElement};

    const ENTRY: &str = "http://portal.local/workspace";

    fn path(target: Target) -> String {
        LocatorTable::builtin().get(target).path().to_string()
    }

    fn workflow(driver: &ScriptedDriver) -> (Workflow<ScriptedDriver>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let primitives = Primitives::with_clock(Arc::new(driver.clone()), clock.clone());
        let workflow = Workflow::new(
            primitives,
            Arc::new(LocatorTable::builtin()),
            ENTRY,
            StepTimeouts::default(),
        );
        (workflow, clock)
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("operator", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("operator"));
        assert!(!rendered.contains("hunter2"));
    }

    #[tokio::test]
    async fn authenticate_fills_and_submits_password_form() {
        let driver = ScriptedDriver::new()
            .with_element(path(Target::Username), ScriptedElement::interactable())
            .with_element(path(Target::Password), ScriptedElement::interactable());
        let (workflow, _) = workflow(&driver);

        workflow
            .authenticate(&Credentials::new("operator", "s3cret"))
            .await
            .unwrap();

        assert_eq!(
            driver.calls(),
            vec![
                DriverCall::Navigate(ENTRY.into()),
                DriverCall::Fill(path(Target::Username), "operator".into()),
                DriverCall::Fill(path(Target::Password), "s3cret".into()),
                DriverCall::SubmitForm(path(Target::Password)),
            ]
        );
    }

    #[tokio::test]
    async fn missing_login_form_is_element_not_found() {
        let driver = ScriptedDriver::new();
        let (workflow, clock) = workflow(&driver);

        let err = workflow
            .authenticate(&Credentials::new("operator", "s3cret"))
            .await
            .unwrap_err();

        assert!(err.is_element_not_found());
        assert_eq!(clock.elapsed(), Duration::from_secs(40));
    }

    #[tokio::test]
    async fn feature_entry_falls_back_to_parent_once() {
        let entry = path(Target::FeatureEntry);
        let parent = LocatorTable::builtin()
            .get(Target::FeatureEntry)
            .parent()
            .unwrap()
            .path()
            .to_string();
        let driver = ScriptedDriver::new()
            .with_element(entry.clone(), ScriptedElement::disabled())
            .with_element(parent.clone(), ScriptedElement::interactable());
        let (workflow, clock) = workflow(&driver);

        workflow.enter_feature_area().await.unwrap();

        assert_eq!(driver.calls(), vec![DriverCall::Click(parent)]);
        assert_eq!(clock.elapsed(), Duration::from_secs(40));
    }

    #[tokio::test]
    async fn feature_entry_second_failure_is_fatal() {
        let driver = ScriptedDriver::new();
        let (workflow, clock) = workflow(&driver);

        let err = workflow.enter_feature_area().await.unwrap_err();

        assert!(err.is_element_not_found());
        assert!(err.to_string().contains("feature_entry (parent)"));
        // Exactly two bounded waits: the locator and its parent.
        assert_eq!(clock.elapsed(), Duration::from_secs(80));
    }

    #[tokio::test]
    async fn feature_entry_protocol_error_is_not_retried() {
        let entry = path(Target::FeatureEntry);
        let driver = ScriptedDriver::new()
            .with_element(entry.clone(), ScriptedElement::interactable())
            .fail_when(
                |call| matches!(call, DriverCall::Click(_)),
                AdapterErrorKind::CdpIo,
            );
        let (workflow, _) = workflow(&driver);

        let err = workflow.enter_feature_area().await.unwrap_err();

        assert!(matches!(err, ActionError::CdpIo(_)));
        assert_eq!(driver.calls(), vec![DriverCall::Click(entry)]);
    }

    #[tokio::test]
    async fn classify_treats_missing_row_as_no_results() {
        let driver = ScriptedDriver::new();
        let (workflow, clock) = workflow(&driver);

        assert_eq!(workflow.classify().await.unwrap(), QueryOutcome::NoResults);
        assert_eq!(clock.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test]
    async fn classify_reports_found_row() {
        let driver = ScriptedDriver::new().with_element(
            path(Target::ResultIndicator),
            ScriptedElement::interactable().appearing_after(4),
        );
        let (workflow, _) = workflow(&driver);

        assert_eq!(workflow.classify().await.unwrap(), QueryOutcome::Found);
    }

    #[tokio::test]
    async fn detail_is_opened_after_row_selection() {
        let row = path(Target::ResultIndicator);
        let detail = path(Target::DetailTrigger);
        let detail_for_effect = detail.clone();
        let row_for_match = row.clone();
        let driver = ScriptedDriver::new()
            .with_element(row.clone(), ScriptedElement::interactable())
            .with_element(detail.clone(), ScriptedElement::disabled())
            .when(
                move |call| matches!(call, DriverCall::Click(p) if *p == row_for_match),
                move |page| page.insert(detail_for_effect.clone(), ScriptedElement::interactable()),
            );
        let (workflow, _) = workflow(&driver);

        workflow.open_detail().await.unwrap();

        assert_eq!(
            driver.calls(),
            vec![DriverCall::Click(row), DriverCall::Click(detail)]
        );
    }

    #[tokio::test]
    async fn document_trigger_is_revealed_before_activation() {
        let trigger = path(Target::DocumentTrigger);
        let driver =
            ScriptedDriver::new().with_element(trigger.clone(), ScriptedElement::hidden());
        let (workflow, _) = workflow(&driver);

        workflow.request_document().await.unwrap();

        assert_eq!(
            driver.calls(),
            vec![
                DriverCall::Reveal(trigger.clone()),
                DriverCall::ScriptedClick(trigger)
            ]
        );
    }
}
