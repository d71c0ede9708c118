//! Shared fixtures: a scripted portal page and a clock with timed hooks.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use action_primitives::{Clock, LocatorTable, ManualClock, Target};
use async_trait::async_trait;
use cdp_adapter::{DriverCall, ScriptedDriver, ScriptedElement};
use portal_fetch::{Credentials, RunRequest, RunSettings};

pub const ENTRY_URL: &str = "http://portal.test/workspace";
pub const KNOWN_KEY: &str = "87654321";
pub const UNKNOWN_KEY: &str = "12345678";

pub fn path(target: Target) -> String {
    LocatorTable::builtin().get(target).path().to_string()
}

pub fn parent_path(target: Target) -> String {
    LocatorTable::builtin()
        .get(target)
        .parent()
        .map(|p| p.path().to_string())
        .unwrap_or_default()
}

pub fn settings() -> RunSettings {
    RunSettings::new(ENTRY_URL)
}

pub fn request(key: &str, download_dir: &Path) -> RunRequest {
    RunRequest {
        credentials: Credentials::new("operator", "s3cret"),
        key: key.to_string(),
        download_dir: download_dir.to_path_buf(),
        headless: true,
    }
}

/// How the feature entry link renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entry {
    /// The located element itself is clickable
    Direct,
    /// Only its enclosing anchor is clickable
    ParentOnly,
    /// Neither ever becomes clickable
    Broken,
}

fn clicked(target: Target) -> impl Fn(&DriverCall) -> bool + Send + Sync + 'static {
    let expected = path(target);
    move |call| matches!(call, DriverCall::Click(p) if *p == expected)
}

/// The portal as a scripted page: each step renders the next one.
///
/// Only `KNOWN_KEY` produces a result row. The document trigger renders
/// hidden; activating it does nothing on its own, so callers decide when
/// and how the download shows up.
pub fn portal(entry: Entry) -> ScriptedDriver {
    let lookup_screen = |page: &ScriptedDriver| {
        page.insert(path(Target::LookupInput), ScriptedElement::interactable());
        page.insert(path(Target::LookupSubmit), ScriptedElement::interactable());
    };

    let password = path(Target::Password);
    let parent = parent_path(Target::FeatureEntry);
    let parent_for_match = parent.clone();

    ScriptedDriver::new()
        .with_element(path(Target::Username), ScriptedElement::interactable())
        .with_element(password.clone(), ScriptedElement::interactable())
        .when(
            move |call| matches!(call, DriverCall::SubmitForm(p) if *p == password),
            move |page| match entry {
                Entry::Direct => {
                    page.insert(path(Target::FeatureEntry), ScriptedElement::interactable())
                }
                Entry::ParentOnly => {
                    page.insert(path(Target::FeatureEntry), ScriptedElement::disabled());
                    page.insert(parent.clone(), ScriptedElement::interactable());
                }
                Entry::Broken => {
                    page.insert(path(Target::FeatureEntry), ScriptedElement::disabled());
                }
            },
        )
        .when(clicked(Target::FeatureEntry), lookup_screen)
        .when(
            move |call| matches!(call, DriverCall::Click(p) if *p == parent_for_match),
            lookup_screen,
        )
        .when(clicked(Target::LookupSubmit), |page| {
            let key = page.value_of(&path(Target::LookupInput)).unwrap_or_default();
            if key == KNOWN_KEY {
                page.insert(
                    path(Target::ResultIndicator),
                    ScriptedElement::interactable().appearing_after(2),
                );
            }
        })
        .when(clicked(Target::ResultIndicator), |page| {
            page.insert(path(Target::DetailTrigger), ScriptedElement::interactable());
        })
        .when(clicked(Target::DetailTrigger), |page| {
            page.insert(path(Target::DocumentTrigger), ScriptedElement::hidden());
        })
}

pub fn document_requested(call: &DriverCall) -> bool {
    matches!(call, DriverCall::ScriptedClick(p) if *p == path(Target::DocumentTrigger))
}

pub fn touched_document_trigger(calls: &[DriverCall]) -> bool {
    let trigger = path(Target::DocumentTrigger);
    calls.iter().any(|call| match call {
        DriverCall::Click(p) | DriverCall::ScriptedClick(p) | DriverCall::Reveal(p) => *p == trigger,
        _ => false,
    })
}

pub fn marker_of(file: &Path, suffix: &str) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

type Hook = Box<dyn FnOnce() + Send>;

/// Manual clock that runs registered hooks once simulated time reaches them.
#[derive(Default)]
pub struct HookClock {
    inner: ManualClock,
    hooks: Mutex<Vec<(Duration, Hook)>>,
}

impl HookClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn at(&self, when: Duration, hook: impl FnOnce() + Send + 'static) {
        self.hooks.lock().unwrap().push((when, Box::new(hook)));
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.elapsed()
    }
}

#[async_trait]
impl Clock for HookClock {
    fn now(&self) -> Instant {
        self.inner.now()
    }

    async fn sleep(&self, duration: Duration) {
        self.inner.advance(duration);
        let now = self.inner.elapsed();
        let due: Vec<(Duration, Hook)> = {
            let mut hooks = self.hooks.lock().unwrap();
            let (due, pending) = std::mem::take(&mut *hooks)
                .into_iter()
                .partition(|(when, _)| *when <= now);
            *hooks = pending;
            due
        };
        for (_, hook) in due {
            hook();
        }
    }
}
