use crate::StdResult;

/// A trait for looking up repository metadata.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RepositoryEnricher: Sync + Send {
    /// Retrieves the metadata of the repository `owner/name`.
    async fn enrich(&self, owner: &str, name: &str) -> StdResult<serde_json::Value>;
}
