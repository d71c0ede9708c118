//! Chromium-backed [`PageDriver`] built on chromiumoxide.

use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CdpConfig;
use crate::driver::{ElementState, Launcher, PageDriver};
use crate::error::{AdapterError, AdapterErrorKind};
use crate::scripts;

/// Launches one Chromium process per session.
#[derive(Clone, Debug, Default)]
pub struct ChromeLauncher;

#[async_trait]
impl Launcher for ChromeLauncher {
    type Driver = ChromeDriver;

    async fn launch(&self, config: &CdpConfig) -> Result<ChromeDriver, AdapterError> {
        ChromeDriver::launch(config).await
    }
}

struct Running {
    browser: Browser,
    handler: JoinHandle<()>,
    profile: TempDir,
}

/// A live Chromium session with a single page.
pub struct ChromeDriver {
    page: Page,
    running: Mutex<Option<Running>>,
}

impl ChromeDriver {
    pub async fn launch(config: &CdpConfig) -> Result<Self, AdapterError> {
        let download_dir = absolute(&config.download_dir)?;
        let profile = tempfile::Builder::new()
            .prefix("portal-fetch-profile-")
            .tempdir()
            .map_err(|err| {
                AdapterError::new(AdapterErrorKind::Internal)
                    .with_hint(format!("failed to create browser profile: {err}"))
            })?;
        write_download_preferences(profile.path(), &download_dir)?;

        info!(
            headless = config.headless,
            download_dir = %download_dir.display(),
            "Launching browser"
        );

        let (browser, mut handler) = Browser::launch(browser_config(config, profile.path())?)
            .await
            .map_err(|err| {
                AdapterError::new(AdapterErrorKind::CdpIo)
                    .with_hint(format!("failed to launch browser: {err}"))
            })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!("browser handler stopped: {}", err);
                    break;
                }
            }
        });

        let running = Running {
            browser,
            handler,
            profile,
        };

        // From here on a failure must still reap the process.
        match Self::open_page(&running.browser, &download_dir).await {
            Ok(page) => {
                info!("Browser launched successfully");
                Ok(Self {
                    page,
                    running: Mutex::new(Some(running)),
                })
            }
            Err(err) => {
                close_running(running).await;
                Err(err)
            }
        }
    }

    async fn open_page(browser: &Browser, download_dir: &Path) -> Result<Page, AdapterError> {
        let behavior = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(download_dir.to_string_lossy().into_owned())
            .build()
            .map_err(|err| {
                AdapterError::new(AdapterErrorKind::Internal)
                    .with_hint(format!("download behavior params: {err}"))
            })?;
        browser.execute(behavior).await?;

        Ok(browser.new_page("about:blank").await?)
    }

    async fn evaluate(&self, expression: String) -> Result<Value, AdapterError> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .return_by_value(true)
            .build()
            .map_err(|err| {
                AdapterError::new(AdapterErrorKind::Internal)
                    .with_hint(format!("evaluate params: {err}"))
            })?;

        let result = self.page.evaluate_expression(params).await?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    /// Evaluate an element script and fail when the element is gone.
    async fn evaluate_on(&self, path: &str, expression: String) -> Result<Value, AdapterError> {
        let value = self.evaluate(expression).await?;
        match status(&value) {
            "ok" => Ok(value),
            "missing" => Err(AdapterError::new(AdapterErrorKind::TargetNotFound).with_hint(path)),
            other => Err(AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("unexpected script status '{other}' for {path}"))),
        }
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn navigate(&self, url: &str) -> Result<(), AdapterError> {
        debug!("Navigating to {}", url);
        self.page.goto(url).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::NavTimeout)
                .with_hint(format!("failed to navigate to {url}: {err}"))
        })?;
        Ok(())
    }

    async fn probe(&self, path: &str) -> Result<ElementState, AdapterError> {
        let value = self.evaluate(scripts::probe(path)?).await?;
        if status(&value) != "ok" {
            return Ok(ElementState::missing());
        }
        Ok(ElementState {
            present: true,
            visible: flag(&value, "visible"),
            enabled: flag(&value, "enabled"),
        })
    }

    async fn click(&self, path: &str) -> Result<(), AdapterError> {
        let hit = self.evaluate_on(path, scripts::hit_test(path)?).await?;
        if !flag(&hit, "hit") {
            let blocker = hit
                .get("blocker")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown element");
            return Err(AdapterError::new(AdapterErrorKind::ClickIntercepted)
                .with_hint(format!("{path} is covered by {blocker}")));
        }

        let element = self.page.find_xpath(path).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::TargetNotFound)
                .with_hint(format!("{path}: {err}"))
        })?;
        element.click().await?;
        Ok(())
    }

    async fn scripted_click(&self, path: &str) -> Result<(), AdapterError> {
        self.evaluate_on(path, scripts::scripted_click(path)?)
            .await
            .map(|_| ())
    }

    async fn reveal(&self, path: &str) -> Result<(), AdapterError> {
        self.evaluate_on(path, scripts::reveal(path)?)
            .await
            .map(|_| ())
    }

    async fn fill(&self, path: &str, text: &str) -> Result<(), AdapterError> {
        self.evaluate_on(path, scripts::clear_value(path)?).await?;
        let element = self.page.find_xpath(path).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::TargetNotFound)
                .with_hint(format!("{path}: {err}"))
        })?;
        element.focus().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn submit_form(&self, path: &str) -> Result<(), AdapterError> {
        let value = self.evaluate(scripts::submit_form(path)?).await?;
        match status(&value) {
            "ok" => Ok(()),
            "no-form" => Err(AdapterError::new(AdapterErrorKind::TargetNotFound)
                .with_hint(format!("{path} has no enclosing form"))),
            _ => Err(AdapterError::new(AdapterErrorKind::TargetNotFound).with_hint(path)),
        }
    }

    async fn shutdown(&self) -> Result<(), AdapterError> {
        let Some(running) = self.running.lock().await.take() else {
            return Ok(());
        };
        info!("Closing browser session");
        close_running(running).await;
        Ok(())
    }
}

async fn close_running(running: Running) {
    let Running {
        mut browser,
        handler,
        profile,
    } = running;

    if let Err(err) = browser.close().await {
        warn!("browser close failed: {}", err);
    }
    if let Err(err) = browser.wait().await {
        warn!("waiting for browser exit failed: {}", err);
    }
    handler.abort();
    if let Err(err) = profile.close() {
        warn!("failed to remove browser profile: {}", err);
    }
}

/// Flags on top of chromiumoxide's defaults. Headless flags come from
/// [`headless_mode`], never from here.
const EXTRA_ARGS: [&str; 8] = [
    "--disable-background-networking",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-popup-blocking",
    "--disable-sync",
    "--no-first-run",
    "--no-default-browser-check",
];

fn headless_mode(headless: bool) -> HeadlessMode {
    if headless {
        HeadlessMode::New
    } else {
        HeadlessMode::False
    }
}

fn browser_config(cfg: &CdpConfig, profile_dir: &Path) -> Result<BrowserConfig, AdapterError> {
    if !cfg.executable.as_os_str().is_empty() && !cfg.executable.exists() {
        return Err(AdapterError::new(AdapterErrorKind::CdpIo).with_hint(format!(
            "chrome executable not found at {}; set PORTAL_FETCH_CHROME",
            cfg.executable.display()
        )));
    }

    let mut builder = BrowserConfig::builder()
        .headless_mode(headless_mode(cfg.headless))
        .request_timeout(Duration::from_millis(cfg.request_timeout_ms))
        .launch_timeout(Duration::from_millis(cfg.launch_timeout_ms))
        .window_size(cfg.window_width, cfg.window_height)
        .user_data_dir(profile_dir)
        .args(EXTRA_ARGS);

    if cfg.no_sandbox {
        builder = builder.no_sandbox();
    }

    if !cfg.executable.as_os_str().is_empty() {
        builder = builder.chrome_executable(cfg.executable.clone());
    }

    builder.build().map_err(|err| {
        AdapterError::new(AdapterErrorKind::Internal).with_hint(format!("browser config error: {err}"))
    })
}

/// Profile preferences: save PDFs and binaries straight to `download_dir`.
fn download_preferences(download_dir: &Path) -> Value {
    json!({
        "download": {
            "default_directory": download_dir,
            "directory_upgrade": true,
            "prompt_for_download": false
        },
        "plugins": {
            "always_open_pdf_externally": true
        },
        "savefile": {
            "default_directory": download_dir
        }
    })
}

fn write_download_preferences(profile_dir: &Path, download_dir: &Path) -> Result<(), AdapterError> {
    let default_dir = profile_dir.join("Default");
    fs::create_dir_all(&default_dir)
        .and_then(|_| {
            fs::write(
                default_dir.join("Preferences"),
                download_preferences(download_dir).to_string(),
            )
        })
        .map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("failed to write browser preferences: {err}"))
        })
}

fn absolute(path: &Path) -> Result<std::path::PathBuf, AdapterError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("failed to resolve cwd for download dir: {err}"))
        })
}

fn status(value: &Value) -> &str {
    value
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
}

fn flag(value: &Value, key: &str) -> bool {
    value.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}
