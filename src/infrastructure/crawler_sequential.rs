use std::{sync::Arc, time::Instant};

use log::{debug, info, warn};
use url::Url;

use crate::{
    CrawlReport, CrawlerError, CrawlerResult, DependentCallback, DependentsCrawler,
    DependentsInfo, ListingPage, PageFetcher, PageRequest, RawPage, Target, extract_counts,
    extract_sub_groups,
};

/// A crawler walking the dependents listing one page at a time
pub struct SequentialCrawler {
    fetcher: Arc<dyn PageFetcher>,
    base_url: Url,
}

impl SequentialCrawler {
    /// Creates a new `SequentialCrawler` instance with the given fetcher and site base URL.
    pub fn new(fetcher: Arc<dyn PageFetcher>, base_url: Url) -> Self {
        Self { fetcher, base_url }
    }

    /// Fetches a page, `None` when the page does not exist.
    async fn fetch_page(&self, request: &PageRequest) -> CrawlerResult<Option<RawPage>> {
        let url = request.url(&self.base_url)?;
        info!("Loading: {request}");
        debug!("Loading: {url}");
        match self.fetcher.fetch(&url).await {
            Ok(page) => {
                debug!("Loaded: {}", page.url());
                Ok(Some(page))
            }
            Err(CrawlerError::PageNotFound { url }) => {
                warn!("Page not found: {url}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_listing(&self, request: &PageRequest) -> CrawlerResult<Option<ListingPage>> {
        Ok(self
            .fetch_page(request)
            .await?
            .map(|page| ListingPage::extract(&page.parse())))
    }

    /// Fetches the first page, reloading it once if the requested sub-group is not the selected one.
    async fn fetch_first_listing(
        &self,
        target: &Target,
        report: &mut CrawlReport,
    ) -> CrawlerResult<Option<ListingPage>> {
        let Some(listing) = self.fetch_listing(&PageRequest::first_page(target)).await? else {
            return Ok(None);
        };
        report.pages_fetched += 1;
        let Some(sub_group) = target.sub_group() else {
            return Ok(Some(listing));
        };
        if listing.sub_groups().is_selected(sub_group) {
            return Ok(Some(listing));
        }
        let request = match listing.sub_groups().by_name(sub_group) {
            Some(found) => PageRequest::sub_group(&found.name, &found.locator),
            None => return Err(CrawlerError::SubGroupNotFound(sub_group.to_string())),
        };
        let listing = self.fetch_listing(&request).await?;
        if listing.is_some() {
            report.pages_fetched += 1;
        }

        Ok(listing)
    }
}

#[async_trait::async_trait]
impl DependentsCrawler for SequentialCrawler {
    async fn crawl(
        &self,
        target: &Target,
        callback: &mut DependentCallback<'_>,
    ) -> CrawlerResult<CrawlReport> {
        target.validate()?;
        let started = Instant::now();
        let mut report = CrawlReport::default();

        let mut listing = match self.fetch_first_listing(target, &mut report).await? {
            Some(listing) => listing,
            None => {
                info!("No dependents listing for {target}");
                return Ok(report);
            }
        };
        let mut page_number = 1;
        loop {
            let ListingPage {
                dependents,
                next_page,
                ..
            } = listing;
            info!(
                "Loading: page {page_number} got {} dependents",
                dependents.len()
            );
            for dependent in dependents {
                report.dependents_delivered += 1;
                if !callback(dependent) {
                    report.cancelled = true;
                    info!("Stopped on request after {report}, in {:?}", started.elapsed());
                    return Ok(report);
                }
            }
            let Some(next_page) = next_page else {
                info!("Loading: no more pages of dependents");
                break;
            };
            page_number += 1;
            listing = match self
                .fetch_listing(&PageRequest::next_page(page_number, &next_page))
                .await?
            {
                Some(listing) => listing,
                None => break,
            };
            report.pages_fetched += 1;
        }
        info!("Done in {:?}: {report}", started.elapsed());

        Ok(report)
    }

    async fn info(&self, target: &Target) -> CrawlerResult<DependentsInfo> {
        target.validate()?;
        let Some(page) = self.fetch_page(&PageRequest::first_page(target)).await? else {
            return Ok(DependentsInfo::default());
        };
        let page = page.parse();

        Ok(DependentsInfo {
            sub_groups: extract_sub_groups(&page),
            counts: extract_counts(&page)?,
        })
    }
}
