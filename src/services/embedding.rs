use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use thiserror::Error;

use crate::core::normalizer::tokenize;

/// Fixed seed so hash embeddings are stable across runs and Rust versions.
/// Changing these re-shuffles every vector.
const HASH_SEED_K0: u64 = 0x5eed_0f_7e45_cafe;
const HASH_SEED_K1: u64 = 0x0dd5_ba11_1234_9876;

/// Bigrams contribute at this fraction of a unigram's weight
const BIGRAM_WEIGHT: f32 = 0.5;

/// Errors an embedding provider can report
///
/// Every variant degrades the semantic component; none aborts an evaluation.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding provider unavailable: {0}")]
    Unavailable(String),

    #[error("Embedding call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding provider rejected the request: {0}")]
    Rejected(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Capability mapping text to a fixed-dimension vector
///
/// Implementations must be safe to call from many tasks at once; callers
/// that need to limit concurrency wrap them in a bounded queue.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Length of every vector this provider returns
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Deterministic feature-hashing embedder
///
/// Needs no model: each token (and adjacent token pair) is hashed into one of
/// `dimension` buckets with a hashed sign, then the vector is L2-normalized.
/// Texts that share vocabulary land close together.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn hash(&self, feature: &str, salt: u8) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        salt.hash(&mut hasher);
        feature.hash(&mut hasher);
        hasher.finish()
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let idx = (self.hash(feature, 0) % self.dimension as u64) as usize;
        let sign = if self.hash(feature, 1) % 2 == 0 { 1.0 } else { -1.0 };
        vector[idx] += sign * weight;
    }

    /// Synchronous embedding, usable outside async contexts
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(&crate::core::normalizer::canonicalize(text));
        let mut vector = vec![0.0f32; self.dimension];

        for token in &tokens {
            self.add_feature(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.add_feature(&mut vector, &bigram, BIGRAM_WEIGHT);
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.embed_text(text))
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedDatum {
    embedding: Vec<f32>,
}

/// Accepts both `{"embedding": [...]}` and `{"data": [{"embedding": [...]}]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbedResponse {
    Single { embedding: Vec<f32> },
    Batch { data: Vec<EmbedDatum> },
}

/// Client for an embedding model served over HTTP
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
}

impl HttpEmbeddingProvider {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        dimension: usize,
        request_timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.into(),
            dimension,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn name(&self) -> &str {
        "http"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut request = self.client.post(&self.endpoint).json(&EmbedRequest {
            model: &self.model,
            input: text,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                EmbeddingError::Unavailable(e.to_string())
            } else {
                EmbeddingError::Http(e)
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(EmbeddingError::Unavailable(format!(
                "{} returned {}",
                self.endpoint, status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Rejected(format!("{}: {}", status, body)));
        }

        let vector = match response.json::<EmbedResponse>().await? {
            EmbedResponse::Single { embedding } => embedding,
            EmbedResponse::Batch { data } => data
                .into_iter()
                .next()
                .map(|d| d.embedding)
                .ok_or_else(|| EmbeddingError::Rejected("empty data array".to_string()))?,
        };

        if vector.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        tracing::trace!("Embedded {} chars via {}", text.len(), self.endpoint);
        Ok(vector)
    }
}
