//! Embedding integration

mod cache;
mod client;
mod traits;

pub use cache::{embedding_cache_key, CacheStats, EmbeddingCache};
pub use client::{APIMetrics, HttpEmbedder, MetricsSnapshot};
pub use traits::Embedder;
