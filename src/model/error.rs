use reqwest::StatusCode;
use thiserror::Error;

/// The standard result type used by the binary and the enrichment layer.
pub type StdResult<T> = Result<T, anyhow::Error>;

/// The result type returned by the crawl and extraction engine.
pub type CrawlerResult<T> = Result<T, CrawlerError>;

/// Crawler error
#[derive(Error, Debug)]
pub enum CrawlerError {
    /// The target is not an `owner/name` pair
    #[error("Invalid target {0:?}: expected 'owner/name'")]
    InvalidTargetFormat(String),

    /// The dependent type is not one of the supported values
    #[error("Invalid dependent type {0:?}: must be \"REPOSITORY\" or \"PACKAGE\"")]
    InvalidDependentType(String),

    /// The target is missing a required field
    #[error("Incomplete target: {0} not set")]
    IncompleteTarget(&'static str),

    /// The requested sub-group is not listed on the first page
    #[error("Sub-group {0:?} not found")]
    SubGroupNotFound(String),

    /// The page does not exist (HTTP 404)
    #[error("Page not found: {url}")]
    PageNotFound {
        /// The requested URL
        url: String,
    },

    /// The server answered with a status other than 200 or 404
    #[error("Status code: {status}\nHeader:\n{headers}\nBody:\n\n {body}")]
    UnexpectedStatus {
        /// The requested URL
        url: String,
        /// The response status code
        status: u16,
        /// The response headers, rendered for diagnostics
        headers: String,
        /// The response body
        body: String,
    },

    /// The request could not be completed
    #[error("Request to {url} failed: {source}")]
    Transport {
        /// The requested URL
        url: String,
        /// The underlying transport error
        source: reqwest::Error,
    },

    /// All fetch attempts failed
    #[error("Failed after {attempts} attempts: {last_error}")]
    FetchExhausted {
        /// The number of attempts made
        attempts: u32,
        /// The status of the last response, if any was received
        last_status: Option<u16>,
        /// The body of the last response, if any was received
        last_body: Option<String>,
        /// The error of the last attempt
        #[source]
        last_error: Box<CrawlerError>,
    },

    /// The document could not be decoded
    #[error("Malformed document at {url}: {reason}")]
    MalformedDocument {
        /// The requested URL
        url: String,
        /// Why the document was rejected
        reason: String,
    },

    /// An aggregate count label did not hold a number
    #[error("Could not parse count from label {0:?}")]
    CountParseError(String),

    /// A URL could not be built
    #[error("Invalid URL {url:?}: {reason}")]
    InvalidUrl {
        /// The offending URL or locator
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Reading a document failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrawlerError {
    /// Whether the failed fetch is worth another attempt.
    ///
    /// Transport failures, server errors and rate limiting are transient;
    /// every other client error is permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            CrawlerError::Transport { .. } => true,
            CrawlerError::UnexpectedStatus { status, .. } => {
                let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
                status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    /// Wraps the error of the last attempt once the retry budget is spent.
    pub fn exhausted(attempts: u32, last_error: CrawlerError) -> Self {
        let (last_status, last_body) = match &last_error {
            CrawlerError::UnexpectedStatus { status, body, .. } => {
                (Some(*status), Some(body.to_owned()))
            }
            _ => (None, None),
        };

        CrawlerError::FetchExhausted {
            attempts,
            last_status,
            last_body,
            last_error: Box::new(last_error),
        }
    }

    /// Creates a dummy `UnexpectedStatus` error for testing purposes.
    #[cfg(test)]
    pub(crate) fn dummy_status(status: u16) -> Self {
        CrawlerError::UnexpectedStatus {
            url: "https://github.com/owner/name/network/dependents".to_string(),
            status,
            headers: String::new(),
            body: format!("body-{status}"),
        }
    }
}
