use log::debug;
use rand::seq::SliceRandom;
use reqwest::{
    Client, StatusCode,
    header::{
        ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderName, HeaderValue, REFERER,
        UPGRADE_INSECURE_REQUESTS, USER_AGENT,
    },
};

use crate::{CrawlerConfig, CrawlerError, CrawlerResult, PageFetcher, RawPage};

/// Browser user agents the requests are disguised as.
const USER_AGENTS: [&str; 8] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.2478.67",
];

const BROWSER_HEADERS: [(&str, &str); 9] = [
    (
        "sec-ch-ua",
        r#""Chromium";v="124", "Google Chrome";v="124", "Not-A.Brand";v="99""#,
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-user", "?1"),
    ("sec-fetch-dest", "document"),
    ("sec-gpc", "1"),
    ("cache-control", "max-age=0"),
    ("dnt", "1"),
];

fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

fn browser_headers(referer: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in BROWSER_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    if let Ok(referer) = HeaderValue::from_str(referer) {
        headers.insert(REFERER, referer);
    }

    headers
}

/// Fetches listing pages over HTTP, disguised as a browser.
pub struct HttpPageFetcher {
    client: Client,
    headers: HeaderMap,
}

impl HttpPageFetcher {
    /// Creates a new `HttpPageFetcher` instance with the given configuration.
    pub fn try_new(config: &CrawlerConfig) -> CrawlerResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout)
            .pool_max_idle_per_host(config.max_idle_connections_per_host)
            .pool_idle_timeout(config.idle_connection_timeout)
            .tcp_keepalive(config.tcp_keepalive)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(CrawlerError::HttpClient)?;

        Ok(Self {
            client,
            headers: browser_headers(&config.base_url),
        })
    }

    fn request_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        headers.insert(USER_AGENT, HeaderValue::from_static(random_user_agent()));

        headers
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> CrawlerResult<RawPage> {
        let transport_error = |source| CrawlerError::Transport {
            url: url.to_string(),
            source,
        };
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .headers(self.request_headers())
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        debug!("GET {url}: {status}");

        match status {
            StatusCode::OK => {
                let bytes = response.bytes().await.map_err(transport_error)?;

                RawPage::try_new(url, &bytes)
            }
            StatusCode::NOT_FOUND => Err(CrawlerError::PageNotFound {
                url: url.to_string(),
            }),
            _ => {
                let headers = format!("{:#?}", response.headers());
                let body = response.text().await.unwrap_or_else(|e| {
                    debug!("Failed to read body of {url}: {e}");
                    String::new()
                });

                Err(CrawlerError::UnexpectedStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                    headers,
                    body,
                })
            }
        }
    }
}
