use crate::{CrawlReport, CrawlerResult, DependentRecord, DependentsInfo, Target};

/// Receives each dependent in page order; returning `false` stops the crawl.
pub type DependentCallback<'a> = dyn FnMut(DependentRecord) -> bool + Send + 'a;

/// A trait for discovering the dependents of a repository.
#[async_trait::async_trait]
pub trait DependentsCrawler: Sync + Send {
    /// Crawls the dependents listing of the target, page after page.
    async fn crawl(
        &self,
        target: &Target,
        callback: &mut DependentCallback<'_>,
    ) -> CrawlerResult<CrawlReport>;

    /// Retrieves the sub-groups and aggregate counts from the first page of the listing.
    async fn info(&self, target: &Target) -> CrawlerResult<DependentsInfo>;
}
