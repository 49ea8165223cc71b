use std::time::Duration;

use url::Url;

use super::{CrawlerError, CrawlerResult, GITHUB_BASE_URL};

/// Settings of the crawl engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlerConfig {
    /// The base URL of the site hosting the dependents listing.
    pub base_url: String,

    /// The maximum number of attempts for a page fetch.
    pub max_attempts: u32,

    /// The delay before the first retry, doubled on every further retry.
    pub retry_base_delay: Duration,

    /// The minimum delay between two requests, shared by every crawl of the process.
    pub min_request_interval: Duration,

    /// The overall timeout of a request.
    pub request_timeout: Duration,

    /// The maximum number of idle connections kept per host.
    pub max_idle_connections_per_host: usize,

    /// How long an idle connection is kept in the pool.
    pub idle_connection_timeout: Duration,

    /// The TCP keep-alive interval.
    pub tcp_keepalive: Duration,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: GITHUB_BASE_URL.to_string(),
            max_attempts: 7,
            retry_base_delay: Duration::from_secs(1),
            min_request_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(5 * 60),
            max_idle_connections_per_host: 50,
            idle_connection_timeout: Duration::from_secs(5 * 60),
            tcp_keepalive: Duration::from_secs(180),
        }
    }
}

impl CrawlerConfig {
    /// Creates a default configuration pointing at another base URL.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Parses the base URL.
    pub fn base_url(&self) -> CrawlerResult<Url> {
        Url::parse(&self.base_url).map_err(|e| CrawlerError::InvalidUrl {
            url: self.base_url.to_owned(),
            reason: e.to_string(),
        })
    }
}
