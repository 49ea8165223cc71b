use std::{sync::Arc, time::Duration};

use log::warn;
use tokio::time::sleep;

use crate::{CrawlerError, CrawlerResult, PageFetcher, RawPage};

/// A struct that retries a PageFetcher a specified number of times in case of transient failure with exponential backoff strategy.
pub struct FetcherRetrier {
    /// The fetcher to be retried.
    fetcher: Arc<dyn PageFetcher>,

    /// The maximum number of attempts for a request, the first one included.
    max_attempts: u32,

    /// The delay before the first retry.
    base_delay: Duration,
}

impl FetcherRetrier {
    /// Creates a new `FetcherRetrier` instance with the given maximum number of attempts.
    pub fn new(fetcher: Arc<dyn PageFetcher>, max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            fetcher,
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    fn calculate_exponential_backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * (2u32.pow(attempt.saturating_sub(1).min(31)))
    }
}

#[async_trait::async_trait]
impl PageFetcher for FetcherRetrier {
    /// Retries the request if it fails with a transient error, up to the maximum number of attempts.
    async fn fetch(&self, url: &str) -> CrawlerResult<RawPage> {
        let mut attempts = 0;

        loop {
            let error = match self.fetcher.fetch(url).await {
                Ok(page) => return Ok(page),
                Err(e) => e,
            };
            attempts += 1;
            if !error.is_retryable() {
                return Err(error);
            }
            warn!("Fetch attempt #{attempts} of {url} failed: {error}");
            if attempts >= self.max_attempts {
                return Err(CrawlerError::exhausted(attempts, error));
            }
            sleep(self.calculate_exponential_backoff_delay(attempts)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::MockPageFetcher;

    use super::*;

    const URL: &str = "https://github.com/owner/name/network/dependents?dependent_type=REPOSITORY";

    #[tokio::test]
    async fn fetch_success_on_first_attempt() {
        let fetcher = {
            let mut fetcher = MockPageFetcher::new();
            fetcher
                .expect_fetch()
                .returning(|url| Ok(RawPage::dummy(url, "<html></html>")))
                .times(1);

            fetcher
        };
        let retrier = FetcherRetrier::new(Arc::new(fetcher), 3, Duration::from_millis(10));

        retrier.fetch(URL).await.unwrap();
    }

    #[tokio::test]
    async fn fetch_success_after_retries() {
        let fetcher = {
            let mut fetcher = MockPageFetcher::new();
            fetcher
                .expect_fetch()
                .returning(|_| Err(CrawlerError::dummy_status(502)))
                .times(2);
            fetcher
                .expect_fetch()
                .returning(|url| Ok(RawPage::dummy(url, "<html></html>")))
                .times(1);

            fetcher
        };
        let retrier = FetcherRetrier::new(Arc::new(fetcher), 3, Duration::from_millis(10));

        let page = retrier.fetch(URL).await.unwrap();

        assert_eq!(URL, page.url());
    }

    #[tokio::test]
    async fn fetch_failure_after_max_attempts() {
        let fetcher = {
            let mut fetcher = MockPageFetcher::new();
            fetcher
                .expect_fetch()
                .returning(|_| Err(CrawlerError::dummy_status(503)))
                .times(3);

            fetcher
        };
        let retrier = FetcherRetrier::new(Arc::new(fetcher), 3, Duration::from_millis(10));

        let error = retrier
            .fetch(URL)
            .await
            .expect_err("Expected failure after max attempts");

        match error {
            CrawlerError::FetchExhausted {
                attempts,
                last_status,
                last_body,
                ..
            } => {
                assert_eq!(3, attempts);
                assert_eq!(Some(503), last_status);
                assert_eq!(Some("body-503".to_string()), last_body);
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_missing_page_is_not_retried() {
        let fetcher = {
            let mut fetcher = MockPageFetcher::new();
            fetcher
                .expect_fetch()
                .returning(|url| {
                    Err(CrawlerError::PageNotFound {
                        url: url.to_string(),
                    })
                })
                .times(1);

            fetcher
        };
        let retrier = FetcherRetrier::new(Arc::new(fetcher), 7, Duration::from_millis(10));

        let error = retrier
            .fetch(URL)
            .await
            .expect_err("Expected missing page");

        assert!(matches!(error, CrawlerError::PageNotFound { .. }));
    }

    #[tokio::test]
    async fn fetch_client_error_is_not_retried() {
        let fetcher = {
            let mut fetcher = MockPageFetcher::new();
            fetcher
                .expect_fetch()
                .returning(|_| Err(CrawlerError::dummy_status(403)))
                .times(1);

            fetcher
        };
        let retrier = FetcherRetrier::new(Arc::new(fetcher), 7, Duration::from_millis(10));

        let error = retrier
            .fetch(URL)
            .await
            .expect_err("Expected client error");

        assert!(matches!(
            error,
            CrawlerError::UnexpectedStatus { status: 403, .. }
        ));
    }

    #[test]
    fn backoff_doubles_from_base_delay() {
        let retrier = FetcherRetrier::new(
            Arc::new(MockPageFetcher::new()),
            7,
            Duration::from_secs(1),
        );

        assert_eq!(
            vec![1, 2, 4, 8, 16, 32],
            (1..7)
                .map(|attempt| retrier.calculate_exponential_backoff_delay(attempt).as_secs())
                .collect::<Vec<_>>()
        );
    }
}
