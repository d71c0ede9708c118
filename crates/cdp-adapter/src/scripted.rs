//! In-memory page used to exercise the automation layers without a browser.
//!
//! Elements are keyed by their exact path string. Every mutating call is
//! recorded, failures can be injected per call or per probed path, and effects run after a call
//! succeeds so a test can make the page react (render results, write a
//! download, panic mid-run).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::config::CdpConfig;
use crate::driver::{ElementState, Launcher, PageDriver};
use crate::error::{AdapterError, AdapterErrorKind};

/// A call observed by [`ScriptedDriver`]. Probes are counted, not logged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriverCall {
    Navigate(String),
    Click(String),
    ScriptedClick(String),
    Reveal(String),
    Fill(String, String),
    SubmitForm(String),
    Shutdown,
}

/// Behaviour of one element on the scripted page.
#[derive(Clone, Debug)]
pub struct ScriptedElement {
    pub visible: bool,
    pub enabled: bool,
    /// Native clicks land on an overlay instead of this element.
    pub intercepted: bool,
    /// Number of probes that report the element missing before it renders.
    pub appears_after: u32,
    pub value: String,
}

impl ScriptedElement {
    pub fn interactable() -> Self {
        Self {
            visible: true,
            enabled: true,
            intercepted: false,
            appears_after: 0,
            value: String::new(),
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::interactable()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::interactable()
        }
    }

    pub fn intercepted(mut self) -> Self {
        self.intercepted = true;
        self
    }

    pub fn appearing_after(mut self, probes: u32) -> Self {
        self.appears_after = probes;
        self
    }
}

type Matcher = Arc<dyn Fn(&DriverCall) -> bool + Send + Sync>;
type Effect = Arc<dyn Fn(&ScriptedDriver) + Send + Sync>;
type PathMatcher = Arc<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Default)]
struct PageState {
    elements: HashMap<String, ScriptedElement>,
    probes: HashMap<String, u32>,
    calls: Vec<DriverCall>,
    effects: Vec<(Matcher, Effect)>,
    failures: Vec<(Matcher, AdapterErrorKind)>,
    probe_failures: Vec<(PathMatcher, AdapterErrorKind)>,
    closed: bool,
}

/// Cloneable handle to a shared scripted page.
#[derive(Clone, Default)]
pub struct ScriptedDriver {
    state: Arc<Mutex<PageState>>,
    shutdowns: Arc<AtomicUsize>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_element(self, path: impl Into<String>, element: ScriptedElement) -> Self {
        self.insert(path, element);
        self
    }

    pub fn insert(&self, path: impl Into<String>, element: ScriptedElement) {
        let path = path.into();
        let mut state = self.state();
        state.probes.remove(&path);
        state.elements.insert(path, element);
    }

    /// Run `effect` after every successful call matching `matcher`.
    pub fn when<M, E>(self, matcher: M, effect: E) -> Self
    where
        M: Fn(&DriverCall) -> bool + Send + Sync + 'static,
        E: Fn(&ScriptedDriver) + Send + Sync + 'static,
    {
        self.state()
            .effects
            .push((Arc::new(matcher), Arc::new(effect)));
        self
    }

    /// Fail every call matching `matcher` with `kind`.
    pub fn fail_when<M>(self, matcher: M, kind: AdapterErrorKind) -> Self
    where
        M: Fn(&DriverCall) -> bool + Send + Sync + 'static,
    {
        self.state().failures.push((Arc::new(matcher), kind));
        self
    }

    /// Fail every probe of a path matching `matcher` with `kind`.
    pub fn fail_probe_when<M>(self, matcher: M, kind: AdapterErrorKind) -> Self
    where
        M: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.state().probe_failures.push((Arc::new(matcher), kind));
        self
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.state().calls.clone()
    }

    pub fn value_of(&self, path: &str) -> Option<String> {
        self.state().elements.get(path).map(|el| el.value.clone())
    }

    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn is_alive(&self) -> bool {
        !self.state().closed
    }

    /// Record `call`, apply `action` to the page, then fire matching effects.
    fn perform<T>(
        &self,
        call: DriverCall,
        action: impl FnOnce(&mut PageState) -> Result<T, AdapterError>,
    ) -> Result<T, AdapterError> {
        let (output, effects) = {
            let mut state = self.state();
            if state.closed {
                return Err(AdapterError::new(AdapterErrorKind::CdpIo).with_hint("session closed"));
            }
            state.calls.push(call.clone());
            if let Some((_, kind)) = state.failures.iter().find(|(m, _)| m(&call)) {
                return Err(AdapterError::new(kind.clone()).with_hint(format!("injected: {call:?}")));
            }
            let output = action(&mut state)?;
            let effects: Vec<Effect> = state
                .effects
                .iter()
                .filter(|(m, _)| m(&call))
                .map(|(_, e)| Arc::clone(e))
                .collect();
            (output, effects)
        };

        for effect in effects {
            effect(self);
        }
        Ok(output)
    }
}

fn rendered<'a>(state: &'a mut PageState, path: &str) -> Result<&'a mut ScriptedElement, AdapterError> {
    let probes = state.probes.get(path).copied().unwrap_or(0);
    match state.elements.get_mut(path) {
        Some(element) if probes >= element.appears_after => Ok(element),
        _ => Err(AdapterError::new(AdapterErrorKind::TargetNotFound).with_hint(path.to_string())),
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn navigate(&self, url: &str) -> Result<(), AdapterError> {
        self.perform(DriverCall::Navigate(url.to_string()), |_| Ok(()))
    }

    async fn probe(&self, path: &str) -> Result<ElementState, AdapterError> {
        let mut state = self.state();
        if state.closed {
            return Err(AdapterError::new(AdapterErrorKind::CdpIo).with_hint("session closed"));
        }
        if let Some((_, kind)) = state.probe_failures.iter().find(|(m, _)| m(path)) {
            return Err(AdapterError::new(kind.clone()).with_hint(format!("injected probe: {path}")));
        }
        let Some(element) = state.elements.get(path).cloned() else {
            return Ok(ElementState::missing());
        };
        let seen = state.probes.entry(path.to_string()).or_insert(0);
        if *seen < element.appears_after {
            *seen += 1;
            return Ok(ElementState::missing());
        }
        Ok(ElementState {
            present: true,
            visible: element.visible,
            enabled: element.enabled,
        })
    }

    async fn click(&self, path: &str) -> Result<(), AdapterError> {
        self.perform(DriverCall::Click(path.to_string()), |state| {
            let element = rendered(state, path)?;
            if !element.visible || !element.enabled {
                return Err(AdapterError::new(AdapterErrorKind::TargetNotFound)
                    .with_hint(format!("{path} is not interactable")));
            }
            if element.intercepted {
                return Err(AdapterError::new(AdapterErrorKind::ClickIntercepted)
                    .with_hint(format!("{path} is covered by an overlay")));
            }
            Ok(())
        })
    }

    async fn scripted_click(&self, path: &str) -> Result<(), AdapterError> {
        self.perform(DriverCall::ScriptedClick(path.to_string()), |state| {
            rendered(state, path).map(|_| ())
        })
    }

    async fn reveal(&self, path: &str) -> Result<(), AdapterError> {
        self.perform(DriverCall::Reveal(path.to_string()), |state| {
            let element = rendered(state, path)?;
            element.visible = true;
            element.enabled = true;
            Ok(())
        })
    }

    async fn fill(&self, path: &str, text: &str) -> Result<(), AdapterError> {
        self.perform(DriverCall::Fill(path.to_string(), text.to_string()), |state| {
            rendered(state, path)?.value = text.to_string();
            Ok(())
        })
    }

    async fn submit_form(&self, path: &str) -> Result<(), AdapterError> {
        self.perform(DriverCall::SubmitForm(path.to_string()), |state| {
            rendered(state, path).map(|_| ())
        })
    }

    async fn shutdown(&self) -> Result<(), AdapterError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        state.calls.push(DriverCall::Shutdown);
        state.closed = true;
        if let Some((_, kind)) = state.failures.iter().find(|(m, _)| m(&DriverCall::Shutdown)) {
            return Err(AdapterError::new(kind.clone()).with_hint("injected shutdown failure"));
        }
        Ok(())
    }
}

/// Hands out clones of one [`ScriptedDriver`] and remembers the launch config.
#[derive(Clone, Default)]
pub struct ScriptedLauncher {
    driver: ScriptedDriver,
    fail_with: Option<AdapterErrorKind>,
    launches: Arc<AtomicUsize>,
    last_config: Arc<Mutex<Option<CdpConfig>>>,
}

impl ScriptedLauncher {
    pub fn new(driver: ScriptedDriver) -> Self {
        Self {
            driver,
            ..Self::default()
        }
    }

    pub fn failing(kind: AdapterErrorKind) -> Self {
        Self {
            fail_with: Some(kind),
            ..Self::default()
        }
    }

    pub fn driver(&self) -> &ScriptedDriver {
        &self.driver
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn last_config(&self) -> Option<CdpConfig> {
        self.last_config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Launcher for ScriptedLauncher {
    type Driver = ScriptedDriver;

    async fn launch(&self, config: &CdpConfig) -> Result<ScriptedDriver, AdapterError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        *self
            .last_config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(config.clone());
        if let Some(kind) = &self.fail_with {
            return Err(AdapterError::new(kind.clone()).with_hint("injected launch failure"));
        }
        Ok(self.driver.clone())
    }
}
