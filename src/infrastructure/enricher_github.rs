use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};

use crate::{RepositoryEnricher, StdResult};

/// The REST production endpoint for GitHub.
pub const GITHUB_API_ENDPOINT: &str = "https://api.github.com";

const RATE_LIMIT_WARNING_THRESHOLD: u64 = 1000;

/// Looks up repository metadata on the GitHub REST API.
pub struct GitHubRepositoryEnricher {
    client: Client,
    endpoint: String,
}

impl GitHubRepositoryEnricher {
    /// Creates a new `GitHubRepositoryEnricher` instance authenticated with the given token.
    pub fn try_new(endpoint: &str, token: &str) -> StdResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))
                .with_context(|| "Invalid GitHub API token")?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("github-dependents/", env!("CARGO_PKG_VERSION"))),
        );
        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn warn_on_low_rate_limit(headers: &HeaderMap) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok())
        };
        if let (Some(remaining), Some(limit)) =
            (header("x-ratelimit-remaining"), header("x-ratelimit-limit"))
        {
            if remaining < RATE_LIMIT_WARNING_THRESHOLD {
                let reset = header("x-ratelimit-reset")
                    .and_then(|reset| Self::time_until_reset(reset, Utc::now()))
                    .unwrap_or_else(|| "an unknown time".to_string());
                warn!("GitHub API rate: remaining {remaining}/{limit}; resetting in {reset}");
            }
        }
    }

    /// Renders the time left until the `reset` epoch second, as `12m3s`.
    fn time_until_reset(reset: u64, now: DateTime<Utc>) -> Option<String> {
        let reset_at = DateTime::<Utc>::from_timestamp(i64::try_from(reset).ok()?, 0)?;
        let seconds = (reset_at - now).num_seconds().max(0);
        let (hours, minutes, seconds) = (seconds / 3600, seconds % 3600 / 60, seconds % 60);

        Some(match (hours, minutes) {
            (0, 0) => format!("{seconds}s"),
            (0, _) => format!("{minutes}m{seconds}s"),
            _ => format!("{hours}h{minutes}m{seconds}s"),
        })
    }
}

#[async_trait::async_trait]
impl RepositoryEnricher for GitHubRepositoryEnricher {
    async fn enrich(&self, owner: &str, name: &str) -> StdResult<serde_json::Value> {
        let url = format!("{}/repos/{owner}/{name}", self.endpoint);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to request {url}"))?;
        Self::warn_on_low_rate_limit(response.headers());
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                debug!("Failed to read body of {url}: {e}");
                String::new()
            });
            return Err(anyhow!(
                "Failed to retrieve repository {owner}/{name}: {status}: {body}"
            ));
        }

        response
            .json::<serde_json::Value>()
            .await
            .with_context(|| format!("Failed to parse repository {owner}/{name}"))
    }
}
