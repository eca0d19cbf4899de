use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use crate::services::embedding::EmbeddingError;

/// In-memory embedding cache keyed by provider and normalized text
///
/// Concurrent lookups of the same key share one provider call; failed loads
/// are not cached, so a provider outage does not poison later evaluations.
#[derive(Clone)]
pub struct EmbeddingCache {
    inner: moka::future::Cache<String, Arc<Vec<f32>>>,
}

impl EmbeddingCache {
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        let inner = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs.max(1)))
            .build();
        Self { inner }
    }

    /// Cached vector for `key`, computing it with `load` on a miss
    pub async fn get_or_load<F>(&self, key: String, load: F) -> Result<Arc<Vec<f32>>, Arc<EmbeddingError>>
    where
        F: Future<Output = Result<Vec<f32>, EmbeddingError>>,
    {
        if let Some(hit) = self.inner.get(&key).await {
            tracing::trace!("Embedding cache hit: {}", key);
            return Ok(hit);
        }
        self.inner
            .try_get_with(key, async move { load.await.map(Arc::new) })
            .await
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks().await;
        CacheStats {
            entries: self.inner.entry_count(),
            weighted_size: self.inner.weighted_size(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub weighted_size: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for an embedding of `canonical` text
    ///
    /// Long resumes are hashed so keys stay small.
    pub fn embedding(provider: &str, canonical: &str) -> String {
        let mut hasher = SipHasher13::new_with_keys(0, 0);
        canonical.hash(&mut hasher);
        format!("embed:{}:{}:{:016x}", provider, canonical.len(), hasher.finish())
    }
}
