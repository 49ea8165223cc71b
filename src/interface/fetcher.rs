use crate::{CrawlerResult, RawPage};

/// A trait for fetching pages of the dependents listing.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PageFetcher: Sync + Send {
    /// Fetches the document at the given URL.
    async fn fetch(&self, url: &str) -> CrawlerResult<RawPage>;
}
