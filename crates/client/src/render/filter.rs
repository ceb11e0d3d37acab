//! Subresource filtering.
//!
//! The decision is a pure predicate over the CDP resource type. It is wired
//! into a page through the Fetch domain: every paused request is either
//! failed with `BlockedByClient` or continued untouched.

use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use futures_util::StreamExt;
use tokio::task::JoinHandle;

use super::RenderError;

/// Resource types that never contribute text to the extracted document.
pub const BLOCKED_RESOURCES: &[ResourceType] = &[
    ResourceType::Image,
    ResourceType::Media,
    ResourceType::Font,
    ResourceType::Stylesheet,
    ResourceType::EventSource,
    ResourceType::WebSocket,
];

/// Abort requests whose resource type is in the blocked set.
#[derive(Debug, Clone)]
pub struct ResourceFilter {
    blocked: Vec<ResourceType>,
}

impl Default for ResourceFilter {
    fn default() -> Self {
        Self { blocked: BLOCKED_RESOURCES.to_vec() }
    }
}

impl ResourceFilter {
    pub fn new(blocked: Vec<ResourceType>) -> Self {
        Self { blocked }
    }

    /// A filter that lets everything through.
    pub fn allow_all() -> Self {
        Self { blocked: Vec::new() }
    }

    pub fn allows(&self, resource: &ResourceType) -> bool {
        !self.blocked.contains(resource)
    }

    /// Enable request interception on `page` and apply this filter to every
    /// request it makes. The returned task ends when the page closes.
    pub async fn install(&self, page: &Page) -> Result<JoinHandle<()>, RenderError> {
        let mut paused = page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(|e| RenderError::ContentRetrieval(format!("request listener failed: {e}")))?;

        page.execute(EnableParams::default())
            .await
            .map_err(|e| RenderError::ContentRetrieval(format!("request interception failed: {e}")))?;

        let filter = self.clone();
        let page = page.clone();
        Ok(tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let outcome = if filter.allows(&event.resource_type) {
                    page.execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ())
                } else {
                    tracing::trace!("blocked {:?} {}", event.resource_type, event.request.url);
                    page.execute(FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient))
                        .await
                        .map(|_| ())
                };
                if let Err(e) = outcome {
                    tracing::debug!("request interception reply failed: {e}");
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_heavy_resources() {
        let filter = ResourceFilter::default();
        for resource in BLOCKED_RESOURCES {
            assert!(!filter.allows(resource), "{resource:?} should be blocked");
        }
    }

    #[test]
    fn test_allows_content_resources() {
        let filter = ResourceFilter::default();
        assert!(filter.allows(&ResourceType::Document));
        assert!(filter.allows(&ResourceType::Script));
        assert!(filter.allows(&ResourceType::Xhr));
        assert!(filter.allows(&ResourceType::Fetch));
    }

    #[test]
    fn test_custom_and_permissive_filters() {
        let filter = ResourceFilter::new(vec![ResourceType::Script]);
        assert!(!filter.allows(&ResourceType::Script));
        assert!(filter.allows(&ResourceType::Image));
        assert!(ResourceFilter::allow_all().allows(&ResourceType::Image));
    }
}
