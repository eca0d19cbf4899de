use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::core::normalizer::NormalizedText;
use crate::services::cache::{CacheKey, EmbeddingCache};
use crate::services::embedding::{EmbeddingError, EmbeddingProvider, HashEmbedder};

/// Raw cosine similarity in [-1, 1]
///
/// Returns `None` when the vectors differ in length or either has zero norm,
/// since no direction can be compared.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 || !dot.is_finite() {
        return None;
    }
    Some((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Map a cosine from [-1, 1] onto [0, 1]
#[inline]
pub fn rescale_cosine(cos: f64) -> f64 {
    ((cos + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Semantic component outcome
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticSignal {
    Scored(f64),
    /// No usable similarity; carries the reason for the result note
    Unavailable(String),
}

impl SemanticSignal {
    pub fn score(&self) -> f64 {
        match self {
            SemanticSignal::Scored(s) => *s,
            SemanticSignal::Unavailable(_) => 0.0,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SemanticSignal::Scored(_))
    }
}

/// Tuning for provider access
#[derive(Debug, Clone, Copy)]
pub struct SemanticOptions {
    /// Provider calls allowed in flight; further calls wait in line
    pub max_concurrent_calls: usize,
    /// Deadline for one provider call, queue wait excluded
    pub call_timeout: Duration,
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
}

impl Default for SemanticOptions {
    fn default() -> Self {
        Self {
            max_concurrent_calls: 4,
            call_timeout: Duration::from_secs(10),
            cache_capacity: 10_000,
            cache_ttl_secs: 3600,
        }
    }
}

/// Embeds resume and job text and scores their similarity
///
/// Cloning is cheap; clones share the provider, call queue and cache.
#[derive(Clone)]
pub struct SemanticEngine {
    provider: Arc<dyn EmbeddingProvider>,
    permits: Arc<Semaphore>,
    call_timeout: Duration,
    cache: Option<EmbeddingCache>,
}

impl SemanticEngine {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, options: SemanticOptions) -> Self {
        let cache = (options.cache_capacity > 0)
            .then(|| EmbeddingCache::new(options.cache_capacity, options.cache_ttl_secs));

        Self {
            provider,
            permits: Arc::new(Semaphore::new(options.max_concurrent_calls.max(1))),
            call_timeout: options.call_timeout,
            cache,
        }
    }

    /// Engine without caching, mainly for tests that count provider calls
    pub fn uncached(provider: Arc<dyn EmbeddingProvider>, options: SemanticOptions) -> Self {
        Self::new(
            provider,
            SemanticOptions {
                cache_capacity: 0,
                ..options
            },
        )
    }

    /// Semantic similarity between resume and job description text
    ///
    /// Never fails: empty text or any provider error yields
    /// `SemanticSignal::Unavailable`.
    pub async fn score(&self, resume: &NormalizedText, job: &NormalizedText) -> SemanticSignal {
        if resume.is_empty() {
            return SemanticSignal::Unavailable("resume has no text".to_string());
        }
        if job.is_empty() {
            return SemanticSignal::Unavailable("job description is empty".to_string());
        }

        let (resume_vec, job_vec) = tokio::join!(self.embed(resume), self.embed(job));
        let (resume_vec, job_vec) = match (resume_vec, job_vec) {
            (Ok(r), Ok(j)) => (r, j),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(provider = self.provider.name(), "Semantic scoring degraded: {}", e);
                return SemanticSignal::Unavailable(e.to_string());
            }
        };

        match cosine_similarity(&resume_vec, &job_vec) {
            Some(cos) => SemanticSignal::Scored(rescale_cosine(cos)),
            None => SemanticSignal::Unavailable("embedding has no direction".to_string()),
        }
    }

    async fn embed(&self, text: &NormalizedText) -> Result<Arc<Vec<f32>>, Arc<EmbeddingError>> {
        match &self.cache {
            Some(cache) => {
                let key = CacheKey::embedding(self.provider.name(), &text.canonical);
                cache.get_or_load(key, self.call_provider(&text.canonical)).await
            }
            None => self.call_provider(&text.canonical).await.map(Arc::new).map_err(Arc::new),
        }
    }

    /// One provider call through the bounded queue
    async fn call_provider(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| EmbeddingError::Unavailable("embedding queue closed".to_string()))?;

        let vector = tokio::time::timeout(self.call_timeout, self.provider.embed(text))
            .await
            .map_err(|_| EmbeddingError::Timeout(self.call_timeout))??;

        let expected = self.provider.dimension();
        if vector.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}

impl Default for SemanticEngine {
    fn default() -> Self {
        Self::new(Arc::new(HashEmbedder::default()), SemanticOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalizer::normalize;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }
        fn dimension(&self) -> usize {
            4
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Unavailable("model server down".to_string()))
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl EmbeddingProvider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }
        fn dimension(&self) -> usize {
            2
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![1.0, 0.0])
        }
    }

    /// Tracks the peak number of concurrent calls
    #[derive(Default)]
    struct CountingProvider {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }
        fn dimension(&self) -> usize {
            2
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![1.0, 1.0])
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap() - 1.0).abs() < 1e-9);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap() + 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap().abs() < 1e-9);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]), None);
    }

    #[test]
    fn test_rescale_bounds() {
        assert_eq!(rescale_cosine(-1.0), 0.0);
        assert_eq!(rescale_cosine(0.0), 0.5);
        assert_eq!(rescale_cosine(1.0), 1.0);
        assert_eq!(rescale_cosine(1.5), 1.0);
    }

    #[tokio::test]
    async fn test_hash_engine_scores_in_range() {
        let engine = SemanticEngine::default();
        let signal = engine
            .score(&normalize("Python data engineer"), &normalize("Data engineer with Python"))
            .await;

        let score = signal.score();
        assert!(signal.is_available());
        assert!((0.0..=1.0).contains(&score));
        assert!(score > 0.5);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades() {
        let engine = SemanticEngine::new(Arc::new(FailingProvider), SemanticOptions::default());
        let signal = engine.score(&normalize("resume"), &normalize("job")).await;

        assert_eq!(signal.score(), 0.0);
        assert!(matches!(signal, SemanticSignal::Unavailable(ref why) if why.contains("model server down")));
    }

    #[tokio::test]
    async fn test_empty_text_is_unavailable() {
        let engine = SemanticEngine::default();
        assert!(!engine.score(&normalize(""), &normalize("job")).await.is_available());
        assert!(!engine.score(&normalize("resume"), &normalize("  ")).await.is_available());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let options = SemanticOptions {
            call_timeout: Duration::from_millis(100),
            ..SemanticOptions::default()
        };
        let engine = SemanticEngine::new(Arc::new(SlowProvider), options);
        let signal = engine.score(&normalize("resume"), &normalize("job")).await;

        assert!(matches!(signal, SemanticSignal::Unavailable(ref why) if why.contains("timed out")));
    }

    #[tokio::test]
    async fn test_calls_are_bounded() {
        let provider = Arc::new(CountingProvider::default());
        let options = SemanticOptions {
            max_concurrent_calls: 2,
            ..SemanticOptions::default()
        };
        let engine = SemanticEngine::uncached(provider.clone(), options);

        let job = normalize("job description");
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..8 {
            let engine = engine.clone();
            let job = job.clone();
            tasks.spawn(async move { engine.score(&normalize(&format!("resume {}", i)), &job).await });
        }

        let mut signals = Vec::new();
        while let Some(signal) = tasks.join_next().await {
            signals.push(signal.unwrap());
        }

        assert_eq!(signals.len(), 8);
        assert!(signals.iter().all(SemanticSignal::is_available));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 16);
        assert!(provider.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_cache_dedupes_job_embedding() {
        let provider = Arc::new(CountingProvider::default());
        let engine = SemanticEngine::new(provider.clone(), SemanticOptions::default());

        let job = normalize("job description");
        for i in 0..3 {
            engine.score(&normalize(&format!("resume {}", i)), &job).await;
        }

        // three resumes + one job description
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
    }
}
