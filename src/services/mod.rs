// Service exports
pub mod cache;
pub mod embedding;

pub use cache::{CacheKey, CacheStats, EmbeddingCache};
pub use embedding::{EmbeddingError, EmbeddingProvider, HashEmbedder, HttpEmbeddingProvider};
