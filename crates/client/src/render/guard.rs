//! RAII guard for a per-request browser tab.
//!
//! chromiumoxide's `Page` has no `Drop` and must be closed with an async
//! call. The guard is closed explicitly on every normal return path; if the
//! owning task is cancelled or panics instead, `Drop` spawns the close on
//! the runtime captured at construction.

use chromiumoxide::Page;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// A tab that can be closed asynchronously.
#[async_trait::async_trait]
pub trait TabHandle: Send + 'static {
    async fn close_tab(self) -> Result<(), String>;
}

#[async_trait::async_trait]
impl TabHandle for Page {
    async fn close_tab(self) -> Result<(), String> {
        self.close().await.map_err(|e| e.to_string())
    }
}

pub struct PageGuard<P: TabHandle = Page> {
    page: Option<P>,
    url: String,
    tasks: Vec<JoinHandle<()>>,
    runtime: Handle,
}

impl<P: TabHandle> PageGuard<P> {
    /// Wrap `page`. Must be called from within a tokio runtime.
    pub fn new(page: P, url: impl Into<String>) -> Self {
        Self { page: Some(page), url: url.into(), tasks: Vec::new(), runtime: Handle::current() }
    }

    /// The guarded page. `None` only after `close`, which consumes the guard.
    pub fn page(&self) -> Option<&P> {
        self.page.as_ref()
    }

    /// Tie a helper task (such as the request interceptor) to the page's lifetime.
    pub fn attach(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }

    /// Close the page and stop attached tasks.
    pub async fn close(mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if let Some(page) = self.page.take() {
            match page.close_tab().await {
                Ok(()) => tracing::debug!("closed page for {}", self.url),
                Err(e) => tracing::warn!("failed to close page for {}: {e}", self.url),
            }
        }
    }

    /// Close the page, then hand back `result` unchanged.
    pub async fn finish<T>(self, result: T) -> T {
        self.close().await;
        result
    }
}

impl<P: TabHandle> Drop for PageGuard<P> {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if let Some(page) = self.page.take() {
            let url = std::mem::take(&mut self.url);
            self.runtime.spawn(async move {
                if let Err(e) = page.close_tab().await {
                    tracing::warn!("deferred page close failed for {url}: {e}");
                } else {
                    tracing::debug!("deferred page close for {url}");
                }
            });
        }
    }
}
