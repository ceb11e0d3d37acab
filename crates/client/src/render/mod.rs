//! Headless browser rendering.
//!
//! This module provides a renderer trait and its chromiumoxide
//! implementation. One request's lifecycle:
//!
//! 1. Open a fresh tab on the shared [`BrowserSession`].
//! 2. Install the [`ResourceFilter`] (images, media, fonts, stylesheets,
//!    event streams and websockets are aborted).
//! 3. Navigate under the configured [`NavigationPolicy`] and timeout.
//! 4. Optionally run the lazy-content pass (click "load more", scroll).
//! 5. Snapshot the HTML with scripts/styles (and optionally page chrome) removed.
//! 6. Close the tab, on every exit path.

pub mod filter;
pub mod guard;
pub mod session;

pub use filter::{BLOCKED_RESOURCES, ResourceFilter};
pub use guard::{PageGuard, TabHandle};
pub use session::{BrowserSession, LaunchOptions, LiveBrowser};

use std::sync::Arc;
use std::time::{Duration, Instant};

use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use mdscrape_core::{AppConfig, Error, NavigationPolicy, SnapshotScope};
use thiserror::Error;
use url::Url;

/// Poll interval while waiting for DOM readiness.
const READY_POLL: Duration = Duration::from_millis(50);

/// Poll interval and quiet window for network-idle detection.
const IDLE_POLL: Duration = Duration::from_millis(250);
const IDLE_WINDOW: Duration = Duration::from_millis(500);

const BASE_STRIP: &str = "script, style, noscript, template";

const NOISE_STRIP: &str = "nav, header, footer, aside, [role=navigation], [role=banner], [role=contentinfo], \
                           .ad, .ads, .advert, .advertisement, .sidebar, #sidebar";

/// Errors that can occur during page rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to launch or connect to browser.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Failed to navigate to URL.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Failed to get page content.
    #[error("content retrieval failed: {0}")]
    ContentRetrieval(String),

    /// Timeout waiting for page to load.
    #[error("navigation timeout after {0}ms")]
    Timeout(u64),

    /// Browser closed unexpectedly.
    #[error("browser closed unexpectedly")]
    BrowserClosed,
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Navigation(_) | RenderError::Timeout(_) => Error::NavigationFailed(err.to_string()),
            RenderError::BrowserLaunch(_) | RenderError::ContentRetrieval(_) | RenderError::BrowserClosed => {
                Error::PipelineFailure(err.to_string())
            }
        }
    }
}

/// The "load more" / scroll pass.
#[derive(Debug, Clone)]
pub struct LazyLoad {
    /// CSS selector of the trigger element.
    pub trigger_selector: String,
    /// Maximum trigger clicks.
    pub max_rounds: u32,
    /// Wait after each click and after the final scroll.
    pub settle: Duration,
}

/// Options for rendering a page.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub navigation: NavigationPolicy,

    /// Navigation timeout (default: 15s).
    pub navigation_timeout: Duration,

    pub scope: SnapshotScope,

    /// Also strip nav/header/footer/aside and common ad containers.
    pub strip_noise: bool,

    pub lazy_load: Option<LazyLoad>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            navigation: NavigationPolicy::DomReady,
            navigation_timeout: Duration::from_millis(15_000),
            scope: SnapshotScope::Body,
            strip_noise: false,
            lazy_load: None,
        }
    }
}

impl RenderOptions {
    pub fn from_app_config(config: &AppConfig) -> Self {
        let lazy_load = config.lazy_load.then(|| LazyLoad {
            trigger_selector: config.load_more_selector.clone(),
            max_rounds: config.lazy_max_rounds,
            settle: config.lazy_settle(),
        });

        Self {
            navigation: config.navigation,
            navigation_timeout: config.navigation_timeout(),
            scope: config.snapshot_scope,
            strip_noise: config.strip_noise,
            lazy_load,
        }
    }
}

/// Result of rendering a page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Snapshot HTML with scripts and styles removed.
    pub html: String,

    /// Final URL after redirects.
    pub final_url: Url,

    /// Time taken to render in milliseconds.
    pub render_time_ms: u64,
}

/// Renderer trait for headless browser page rendering.
#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    /// Render a URL to an HTML snapshot via headless browser.
    async fn render(&self, url: &Url, opts: &RenderOptions) -> Result<RenderedPage, RenderError>;
}

/// Headless Chrome/Chromium renderer using chromiumoxide.
pub struct HeadlessRenderer {
    session: Arc<BrowserSession>,
    filter: ResourceFilter,
}

impl HeadlessRenderer {
    /// Create a renderer over a shared session. The browser is not launched
    /// until the first render.
    pub fn new(session: Arc<BrowserSession>) -> Self {
        Self { session, filter: ResourceFilter::default() }
    }

    pub fn with_filter(mut self, filter: ResourceFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn session(&self) -> &Arc<BrowserSession> {
        &self.session
    }

    async fn render_in(
        &self, guard: &mut PageGuard, url: &Url, opts: &RenderOptions,
    ) -> Result<RenderedPage, RenderError> {
        let page = guard.page().ok_or(RenderError::BrowserClosed)?.clone();
        let start = Instant::now();

        let interceptor = self.filter.install(&page).await?;
        guard.attach(interceptor);

        tokio::time::timeout(opts.navigation_timeout, navigate(&page, url, opts.navigation))
            .await
            .map_err(|_| RenderError::Timeout(opts.navigation_timeout.as_millis() as u64))??;

        if let Some(lazy) = &opts.lazy_load {
            load_lazy_content(&page, lazy).await;
        }

        let html: String = page
            .evaluate(snapshot_script(opts.scope, opts.strip_noise))
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?
            .into_value()
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?;

        let page_url = page
            .url()
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?;

        let final_url = page_url
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .unwrap_or_else(|| url.clone());

        let render_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!("rendered {} -> {} in {}ms ({} bytes)", url, final_url, render_time_ms, html.len());

        Ok(RenderedPage { html, final_url, render_time_ms })
    }
}

#[async_trait::async_trait]
impl Renderer for HeadlessRenderer {
    async fn render(&self, url: &Url, opts: &RenderOptions) -> Result<RenderedPage, RenderError> {
        let browser = self.session.acquire().await?;
        let page = browser.new_page().await?;

        let mut guard = PageGuard::new(page, url.as_str());
        let result = self.render_in(&mut guard, url, opts).await;
        guard.finish(result).await
    }
}

/// Navigate and wait according to `policy`.
async fn navigate(page: &Page, url: &Url, policy: NavigationPolicy) -> Result<(), RenderError> {
    match policy {
        NavigationPolicy::DomReady => {
            let response = page
                .execute(NavigateParams::new(url.as_str()))
                .await
                .map_err(|e| RenderError::Navigation(format!("{url}: {e}")))?;
            if let Some(error_text) = response.result.error_text.as_deref() {
                return Err(RenderError::Navigation(format!("{url}: {error_text}")));
            }
            wait_for_dom_ready(page).await?;
        }
        NavigationPolicy::NetworkIdle => {
            page.goto(url.as_str())
                .await
                .map_err(|e| RenderError::Navigation(format!("{url}: {e}")))?;
            wait_for_network_idle(page).await?;
        }
    }

    let href: String = eval(page, "location.href").await?;
    if href.starts_with("chrome-error://") {
        return Err(RenderError::Navigation(format!("{url}: browser error page")));
    }

    Ok(())
}

async fn wait_for_dom_ready(page: &Page) -> Result<(), RenderError> {
    loop {
        let ready: bool = eval(page, "location.href !== 'about:blank' && document.readyState !== 'loading'").await?;
        if ready {
            return Ok(());
        }
        tokio::time::sleep(READY_POLL).await;
    }
}

/// Wait until no new resource entries appear for `IDLE_WINDOW`.
async fn wait_for_network_idle(page: &Page) -> Result<(), RenderError> {
    let mut last_count: u64 = eval(page, "performance.getEntriesByType('resource').length").await?;
    let mut quiet = Duration::ZERO;

    while quiet < IDLE_WINDOW {
        tokio::time::sleep(IDLE_POLL).await;
        let count: u64 = eval(page, "performance.getEntriesByType('resource').length").await?;
        if count == last_count {
            quiet += IDLE_POLL;
        } else {
            quiet = Duration::ZERO;
            last_count = count;
        }
    }

    Ok(())
}

/// Click the trigger while it is present, enabled and visible, up to
/// `max_rounds` times, then scroll to the bottom once more. Best-effort:
/// script errors end the pass without failing the render.
async fn load_lazy_content(page: &Page, lazy: &LazyLoad) {
    let click = click_trigger_script(&lazy.trigger_selector);

    for round in 1..=lazy.max_rounds {
        match eval::<bool>(page, &click).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                tracing::debug!("lazy-load trigger failed: {e}");
                break;
            }
        }
        tracing::debug!("lazy-load round {round}: trigger clicked");
        tokio::time::sleep(lazy.settle).await;
        if let Err(e) = eval::<bool>(page, SCROLL_TO_BOTTOM).await {
            tracing::debug!("lazy-load scroll failed: {e}");
        }
    }

    if let Err(e) = eval::<bool>(page, SCROLL_TO_BOTTOM).await {
        tracing::debug!("final scroll failed: {e}");
    }
    tokio::time::sleep(lazy.settle).await;
}

const SCROLL_TO_BOTTOM: &str =
    "(() => { window.scrollTo(0, document.body ? document.body.scrollHeight : 0); return true; })()";

fn click_trigger_script(selector: &str) -> String {
    let selector = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "(() => {{
            const el = document.querySelector({selector});
            if (!el || el.disabled || el.getAttribute('aria-disabled') === 'true') return false;
            const style = window.getComputedStyle(el);
            if (style.display === 'none' || style.visibility === 'hidden' || el.getClientRects().length === 0) return false;
            el.click();
            return true;
        }})()"
    )
}

fn snapshot_script(scope: SnapshotScope, strip_noise: bool) -> String {
    let strip = if strip_noise { format!("{BASE_STRIP}, {NOISE_STRIP}") } else { BASE_STRIP.to_string() };
    let strip = serde_json::to_string(&strip).unwrap_or_else(|_| "\"script\"".to_string());
    let (root, property) = match scope {
        SnapshotScope::Body => ("document.body", "innerHTML"),
        SnapshotScope::Document => ("document.documentElement", "outerHTML"),
    };
    format!(
        "(() => {{
            const root = {root};
            if (!root) return '';
            const clone = root.cloneNode(true);
            clone.querySelectorAll({strip}).forEach((n) => n.remove());
            return clone.{property};
        }})()"
    )
}

async fn eval<T: serde::de::DeserializeOwned>(page: &Page, expression: &str) -> Result<T, RenderError> {
    page.evaluate(expression)
        .await
        .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?
        .into_value()
        .map_err(|e| RenderError::ContentRetrieval(e.to_string()))
}
