use std::{collections::HashMap, sync::Arc};

use log::debug;
use tokio::sync::Mutex;

use crate::{RepositoryEnricher, StdResult};

/// A struct that memoizes the lookups of a RepositoryEnricher.
pub struct RepositoryEnricherCache {
    /// The enricher to be memoized.
    enricher: Arc<dyn RepositoryEnricher>,

    /// The metadata retrieved so far, by `owner/name`.
    cache: Mutex<HashMap<String, serde_json::Value>>,
}

impl RepositoryEnricherCache {
    /// Creates a new `RepositoryEnricherCache` instance with the given enricher.
    pub fn new(enricher: Arc<dyn RepositoryEnricher>) -> Self {
        Self {
            enricher,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl RepositoryEnricher for RepositoryEnricherCache {
    /// Returns the memoized metadata, looking it up on first request.
    async fn enrich(&self, owner: &str, name: &str) -> StdResult<serde_json::Value> {
        let key = format!("{owner}/{name}");
        if let Some(repository) = self.cache.lock().await.get(&key) {
            debug!("Repository {key} found in cache");
            return Ok(repository.to_owned());
        }
        let repository = self.enricher.enrich(owner, name).await?;
        self.cache.lock().await.insert(key, repository.clone());

        Ok(repository)
    }
}
