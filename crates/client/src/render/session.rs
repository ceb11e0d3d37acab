//! The shared headless browser.
//!
//! One browser process serves every request. It is launched lazily by the
//! first [`BrowserSession::acquire`] and torn down by
//! [`BrowserSession::shutdown`]. A failed launch leaves the session empty so
//! the next `acquire` retries; a browser that dies after launch is *not*
//! relaunched, and restarting the process is the recovery path.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::CloseParams;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use mdscrape_core::AppConfig;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::RenderError;

/// Browser-level launch flags.
///
/// Chromium has no switch that disables stylesheet loading, so stylesheets
/// (along with fonts and media) are aborted per page by
/// [`ResourceFilter`](super::ResourceFilter) through the Fetch domain.
/// Images are disabled here as well.
const LAUNCH_ARGS: &[&str] = &[
    "--disable-gpu",
    "--disable-extensions",
    "--disable-dev-shm-usage",
    "--ignore-certificate-errors",
    "--blink-settings=imagesEnabled=false",
    "--mute-audio",
    "--no-first-run",
];

/// How the browser process is launched.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub chrome_executable: Option<PathBuf>,
    /// Adds `--no-sandbox` / `--disable-setuid-sandbox` (containers, CI).
    pub no_sandbox: bool,
    /// Per-CDP-command timeout.
    pub request_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self { chrome_executable: None, no_sandbox: true, request_timeout: Duration::from_secs(30) }
    }
}

impl LaunchOptions {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            chrome_executable: config.chrome_executable.clone(),
            no_sandbox: config.no_sandbox,
            request_timeout: config.request_timeout(),
        }
    }

    fn to_browser_config(&self) -> Result<BrowserConfig, RenderError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(self.request_timeout)
            .args(LAUNCH_ARGS.iter().copied());

        if self.no_sandbox {
            builder = builder.no_sandbox().arg("--disable-setuid-sandbox");
        }
        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(RenderError::BrowserLaunch)
    }
}

/// A launched browser shared by all in-flight requests.
pub struct LiveBrowser {
    browser: Browser,
    alive: Arc<AtomicBool>,
    created_at: DateTime<Utc>,
    handler: JoinHandle<()>,
}

impl LiveBrowser {
    /// Open a blank tab. Tabs are independent, so this does not serialize requests.
    pub async fn new_page(&self) -> Result<Page, RenderError> {
        if !self.is_alive() {
            return Err(RenderError::BrowserClosed);
        }
        self.browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::ContentRetrieval(format!("failed to open page: {e}")))
    }

    /// False once the CDP connection has ended.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

enum State {
    Idle,
    Running(Arc<LiveBrowser>),
    ShutDown,
}

/// Lazily launched, process-wide browser handle.
pub struct BrowserSession {
    options: LaunchOptions,
    state: Mutex<State>,
}

impl BrowserSession {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options, state: Mutex::new(State::Idle) }
    }

    /// Return the shared browser, launching it on first use.
    ///
    /// Concurrent first calls wait on the same launch. The lock is released
    /// before the caller does any page work.
    pub async fn acquire(&self) -> Result<Arc<LiveBrowser>, RenderError> {
        let mut state = self.state.lock().await;
        match &*state {
            State::Running(live) if live.is_alive() => return Ok(Arc::clone(live)),
            State::Running(_) | State::ShutDown => return Err(RenderError::BrowserClosed),
            State::Idle => {}
        }

        let live = Arc::new(self.launch().await?);
        *state = State::Running(Arc::clone(&live));
        Ok(live)
    }

    async fn launch(&self) -> Result<LiveBrowser, RenderError> {
        let config = self.options.to_browser_config()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::BrowserLaunch(e.to_string()))?;

        let alive = Arc::new(AtomicBool::new(true));
        let alive_flag = Arc::clone(&alive);
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                }
            }
            alive_flag.store(false, Ordering::Release);
            tracing::info!("browser connection closed");
        });

        tracing::info!("launched headless browser");
        Ok(LiveBrowser { browser, alive, created_at: Utc::now(), handler })
    }

    /// Whether a launched browser is currently connected.
    pub async fn is_alive(&self) -> bool {
        matches!(&*self.state.lock().await, State::Running(live) if live.is_alive())
    }

    /// Close the browser process. Idempotent; later `acquire` calls fail.
    pub async fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.state.lock().await, State::ShutDown);
        let State::Running(live) = previous else {
            return;
        };

        if live.is_alive()
            && let Err(e) = live.browser.execute(CloseParams::default()).await
        {
            tracing::warn!("browser close command failed: {e}");
        }
        live.alive.store(false, Ordering::Release);
        live.handler.abort();
        tracing::info!("browser session shut down");
    }
}

impl Default for BrowserSession {
    fn default() -> Self {
        Self::new(LaunchOptions::default())
    }
}
