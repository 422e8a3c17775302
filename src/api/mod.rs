pub mod config;
pub mod http;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{Item, TagExpression};

pub use config::ApiConfig;
pub use http::HttpFeedApi;

/// Exclusive ID boundary of a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    /// Newest page, no boundary.
    First,
    /// Items with an ID strictly greater than the given one.
    After(u64),
    /// Items with an ID strictly smaller than the given one.
    Before(u64),
}

/// The remote Zeitgeist feed.
///
/// Every listing returns a page of items in the server's order; callers must
/// not rely on it and key everything by ID.
#[async_trait]
pub trait FeedApi: Send + Sync {
    /// Base URL without a trailing slash. Image paths are appended verbatim.
    fn base_url(&self) -> &str;

    async fn list(&self) -> Result<Vec<Item>>;
    async fn list_after(&self, id: u64) -> Result<Vec<Item>>;
    async fn list_before(&self, id: u64) -> Result<Vec<Item>>;

    async fn list_by_tag(&self, tag: &str) -> Result<Vec<Item>>;
    async fn list_by_tag_after(&self, tag: &str, id: u64) -> Result<Vec<Item>>;
    async fn list_by_tag_before(&self, tag: &str, id: u64) -> Result<Vec<Item>>;

    /// Apply a tag mutation and return the server's updated copy.
    async fn update(&self, id: u64, tags: &TagExpression) -> Result<Item>;
    async fn delete(&self, id: u64) -> Result<()>;

    /// Raw bytes behind an absolute URL, used for thumbnails.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// Dispatch a page request to the plain or the tag-scoped listing.
pub async fn list_page(
    api: &dyn FeedApi,
    tag: Option<&str>,
    page: PageRequest,
) -> Result<Vec<Item>> {
    match (tag, page) {
        (None, PageRequest::First) => api.list().await,
        (None, PageRequest::After(id)) => api.list_after(id).await,
        (None, PageRequest::Before(id)) => api.list_before(id).await,
        (Some(tag), PageRequest::First) => api.list_by_tag(tag).await,
        (Some(tag), PageRequest::After(id)) => api.list_by_tag_after(tag, id).await,
        (Some(tag), PageRequest::Before(id)) => api.list_by_tag_before(tag, id).await,
    }
}
