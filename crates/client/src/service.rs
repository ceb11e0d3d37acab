//! End-to-end scrape coordination.
//!
//! ```text
//! Start ─► validate ─► cache ─hit──────────────────────────────► respond
//!                        └─miss─► render ─► extract ─► convert ─► store ─► respond
//!   └─ deadline armed ─────────────────────────────fires first──► timed out
//! ```
//!
//! The pipeline runs as its own task and races a hard deadline. Whichever
//! finishes first decides the single response. If the deadline wins, the
//! pipeline keeps running: a reaper task waits for it and logs the discarded
//! outcome, and the page guard inside the pipeline closes the tab. Late
//! results never reach the cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mdscrape_core::{AppConfig, Error, MarkdownDocument, ResultCache, ScrapeOutput};
use tokio::task::JoinHandle;

use crate::chunk::{DEFAULT_CHUNK_SIZE, chunk_markdown};
use crate::extract::{ExtractConfig, Extractor, LectitoExtractor, html_to_markdown, normalize_markdown};
use crate::render::{RenderOptions, Renderer};
use crate::target::validate_url;

/// Per-request options supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeOptions {
    /// Return `{url, chunks}` instead of `{url, markdown}`.
    pub chunks: bool,
    /// Override the configured chunk size.
    pub chunk_size: Option<usize>,
}

/// Service-level settings.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Hard cap on one request, independent of the navigation timeout.
    pub deadline: Duration,
    pub chunk_size: usize,
    pub render: RenderOptions,
    pub extract: ExtractConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(30),
            chunk_size: DEFAULT_CHUNK_SIZE,
            render: RenderOptions::default(),
            extract: ExtractConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            deadline: config.request_timeout(),
            chunk_size: config.chunk_size,
            render: RenderOptions::from_app_config(config),
            extract: ExtractConfig::from_app_config(config),
        }
    }
}

/// Fetch-and-render entry point shared by all requests.
pub struct ScrapeService {
    renderer: Arc<dyn Renderer>,
    extractor: Arc<dyn Extractor>,
    cache: Arc<ResultCache<MarkdownDocument>>,
    config: ServiceConfig,
}

impl ScrapeService {
    pub fn new(renderer: Arc<dyn Renderer>, cache: Arc<ResultCache<MarkdownDocument>>, config: ServiceConfig) -> Self {
        Self { renderer, extractor: Arc::new(LectitoExtractor::new()), cache, config }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn cache(&self) -> &Arc<ResultCache<MarkdownDocument>> {
        &self.cache
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Scrape `url` and shape the result per `opts`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a non-HTTP(S) URL or a zero chunk size, before any browser work
    /// - `NavigationFailed` / `PipelineFailure` from the pipeline
    /// - `DeadlineExceeded` when the pipeline outlives the configured deadline
    pub async fn scrape(&self, url: &str, opts: &ScrapeOptions) -> Result<ScrapeOutput, Error> {
        let key = url.trim();
        let target = validate_url(key)?;

        let chunk_size = opts.chunk_size.unwrap_or(self.config.chunk_size);
        if opts.chunks && chunk_size == 0 {
            return Err(Error::InvalidInput("chunk_size must be greater than 0".into()));
        }

        if let Some(doc) = self.cache.get(key).await {
            tracing::debug!("cache hit for {}", key);
            return Ok(shape(doc, opts.chunks, chunk_size));
        }

        let pipeline = tokio::spawn(run_pipeline(
            Arc::clone(&self.renderer),
            Arc::clone(&self.extractor),
            self.config.clone(),
            key.to_string(),
            target,
        ));

        let doc = self.race(key, pipeline).await?;
        self.cache.set(key, doc.clone()).await;

        Ok(shape(doc, opts.chunks, chunk_size))
    }

    /// Wait for `pipeline` or the deadline, whichever comes first.
    async fn race(
        &self, key: &str, mut pipeline: JoinHandle<Result<MarkdownDocument, Error>>,
    ) -> Result<MarkdownDocument, Error> {
        tokio::select! {
            joined = &mut pipeline => match joined {
                Ok(result) => result,
                Err(e) => Err(Error::PipelineFailure(format!("pipeline task failed: {e}"))),
            },
            _ = tokio::time::sleep(self.config.deadline) => {
                tracing::warn!("deadline of {}ms exceeded for {}", self.config.deadline.as_millis(), key);
                reap(key.to_string(), pipeline);
                Err(Error::DeadlineExceeded("Timeout fetching page".into()))
            }
        }
    }
}

/// Drain a pipeline whose caller has already been answered.
fn reap(key: String, pipeline: JoinHandle<Result<MarkdownDocument, Error>>) {
    tokio::spawn(async move {
        match pipeline.await {
            Ok(Ok(_)) => tracing::warn!("discarded late result for {}", key),
            Ok(Err(e)) => tracing::warn!("late pipeline for {} failed after deadline: {e}", key),
            Err(e) => tracing::warn!("late pipeline for {} did not complete: {e}", key),
        }
    });
}

async fn run_pipeline(
    renderer: Arc<dyn Renderer>, extractor: Arc<dyn Extractor>, config: ServiceConfig, key: String, target: url::Url,
) -> Result<MarkdownDocument, Error> {
    let page = renderer.render(&target, &config.render).await?;
    tracing::debug!("fetched {} in {}ms", key, page.render_time_ms);

    let extraction = extractor.extract(&page.html, &config.extract);
    let fallback = extraction.is_fallback();
    if fallback {
        tracing::info!("no article found for {}, using full page", key);
    }

    let markdown = normalize_markdown(&html_to_markdown(extraction.html())?);

    Ok(MarkdownDocument { url: key, markdown, fallback, fetched_at: Utc::now() })
}

fn shape(doc: MarkdownDocument, chunks: bool, chunk_size: usize) -> ScrapeOutput {
    if chunks {
        let chunks = chunk_markdown(&doc.markdown, chunk_size);
        ScrapeOutput::Chunks { url: doc.url, chunks }
    } else {
        ScrapeOutput::Markdown { url: doc.url, markdown: doc.markdown }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Extraction;
    use crate::render::{RenderError, RenderedPage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SIMPLE_PAGE: &str = "<html><body><h1>Title</h1><p>Hello   world.</p></body></html>";

    /// Serves a fixed page, counting navigations, optionally after a delay.
    struct StubRenderer {
        html: String,
        delay: Duration,
        calls: Arc<AtomicUsize>,
        completed: Arc<AtomicUsize>,
        fail: Option<fn() -> RenderError>,
    }

    impl StubRenderer {
        fn new(html: &str) -> Self {
            Self {
                html: html.to_string(),
                delay: Duration::ZERO,
                calls: Arc::new(AtomicUsize::new(0)),
                completed: Arc::new(AtomicUsize::new(0)),
                fail: None,
            }
        }
    }

    #[async_trait::async_trait]
    impl Renderer for StubRenderer {
        async fn render(&self, url: &url::Url, _opts: &RenderOptions) -> Result<RenderedPage, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            if let Some(fail) = self.fail {
                return Err(fail());
            }
            Ok(RenderedPage { html: self.html.clone(), final_url: url.clone(), render_time_ms: 1 })
        }
    }

    struct FixedExtractor(Extraction);

    impl Extractor for FixedExtractor {
        fn extract(&self, _html: &str, _config: &ExtractConfig) -> Extraction {
            self.0.clone()
        }
    }

    fn service(renderer: StubRenderer) -> ScrapeService {
        ScrapeService::new(Arc::new(renderer), Arc::new(ResultCache::default()), ServiceConfig::default())
    }

    #[tokio::test]
    async fn test_simple_page_to_markdown() {
        let svc = service(StubRenderer::new(SIMPLE_PAGE));
        let output = svc.scrape("https://example.com/article", &ScrapeOptions::default()).await.unwrap();
        assert_eq!(
            output,
            ScrapeOutput::Markdown {
                url: "https://example.com/article".into(),
                markdown: "# Title\n\nHello world.".into()
            }
        );
    }

    #[tokio::test]
    async fn test_page_without_article_falls_back_to_full_body() {
        let svc = service(StubRenderer::new(SIMPLE_PAGE));
        svc.scrape("https://example.com/article", &ScrapeOptions::default()).await.unwrap();

        let cached = svc.cache().get("https://example.com/article").await.unwrap();
        assert!(cached.fallback);
        assert_eq!(cached.markdown, "# Title\n\nHello world.");
    }

    #[tokio::test]
    async fn test_extracted_variant_used_when_available() {
        let svc = service(StubRenderer::new(SIMPLE_PAGE)).with_extractor(Arc::new(FixedExtractor(
            Extraction::Extracted("<h2>Only the article</h2>".into()),
        )));
        let output = svc.scrape("https://example.com/a", &ScrapeOptions::default()).await.unwrap();
        assert!(matches!(output, ScrapeOutput::Markdown { markdown, .. } if markdown == "## Only the article"));
        assert!(!svc.cache().get("https://example.com/a").await.unwrap().fallback);
    }

    #[tokio::test]
    async fn test_second_request_served_from_cache() {
        let renderer = StubRenderer::new(SIMPLE_PAGE);
        let calls = Arc::clone(&renderer.calls);
        let svc = service(renderer);
        let opts = ScrapeOptions { chunks: true, chunk_size: None };

        let first = svc.scrape("https://example.com/article", &opts).await.unwrap();
        let second = svc.scrape("https://example.com/article", &opts).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_page_serves_both_shapes() {
        let renderer = StubRenderer::new(SIMPLE_PAGE);
        let calls = Arc::clone(&renderer.calls);
        let svc = service(renderer);

        svc.scrape("https://example.com/article", &ScrapeOptions::default()).await.unwrap();
        let chunked = svc
            .scrape("https://example.com/article", &ScrapeOptions { chunks: true, chunk_size: Some(7) })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let ScrapeOutput::Chunks { chunks, .. } = chunked else {
            panic!("expected chunks");
        };
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.iter().map(|c| c.text.as_str()).collect::<String>(), "# Title\n\nHello world.");
    }

    #[tokio::test]
    async fn test_non_http_url_rejected_before_browser() {
        let renderer = StubRenderer::new(SIMPLE_PAGE);
        let calls = Arc::clone(&renderer.calls);
        let svc = service(renderer);

        let result = svc.scrape("ftp://example.com", &ScrapeOptions::default()).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let result = svc.scrape("", &ScrapeOptions::default()).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_chunk_size_rejected() {
        let svc = service(StubRenderer::new(SIMPLE_PAGE));
        let result = svc
            .scrape("https://example.com/", &ScrapeOptions { chunks: true, chunk_size: Some(0) })
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_navigation_failure_surfaces_and_is_not_cached() {
        let mut renderer = StubRenderer::new(SIMPLE_PAGE);
        renderer.fail = Some(|| RenderError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()));
        let calls = Arc::clone(&renderer.calls);
        let svc = service(renderer);

        let first = svc.scrape("https://nope.invalid/", &ScrapeOptions::default()).await;
        assert!(matches!(first, Err(Error::NavigationFailed(msg)) if msg.contains("ERR_NAME_NOT_RESOLVED")));

        let second = svc.scrape("https://nope.invalid/", &ScrapeOptions::default()).await;
        assert!(second.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_wins_over_slow_pipeline() {
        let mut renderer = StubRenderer::new(SIMPLE_PAGE);
        renderer.delay = Duration::from_secs(120);
        let completed = Arc::clone(&renderer.completed);
        let svc = service(renderer);

        let start = tokio::time::Instant::now();
        let result = svc.scrape("https://slow.example/", &ScrapeOptions::default()).await;
        let elapsed = start.elapsed();

        assert!(matches!(result, Err(Error::DeadlineExceeded(_))));
        assert!(elapsed >= Duration::from_secs(30));
        assert!(elapsed < Duration::from_secs(31));

        // The orphaned pipeline still runs to completion, but its result is discarded.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert!(svc.cache().get("https://slow.example/").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pipeline_within_deadline_succeeds() {
        let mut renderer = StubRenderer::new(SIMPLE_PAGE);
        renderer.delay = Duration::from_secs(29);
        let svc = service(renderer);

        let result = svc.scrape("https://slow.example/", &ScrapeOptions::default()).await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_service_config_from_app_config() {
        let app = AppConfig { request_timeout_ms: 45_000, chunk_size: 512, ..Default::default() };
        let config = ServiceConfig::from_app_config(&app);
        assert_eq!(config.deadline, Duration::from_secs(45));
        assert_eq!(config.chunk_size, 512);
    }
}
