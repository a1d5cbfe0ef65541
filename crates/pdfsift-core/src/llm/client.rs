//! HTTP client for OpenAI-compatible embedding services (vLLM, TEI, OpenAI, etc.)

use super::cache::{embedding_cache_key, EmbeddingCache};
use super::Embedder;
use crate::config::EmbeddingServiceConfig;
use crate::error::{Result, SiftError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const DEFAULT_DIMENSIONS: usize = 384;
const DEFAULT_BATCH_SIZE: usize = 32;

/// API metrics for monitoring
#[derive(Debug, Default)]
pub struct APIMetrics {
    pub total_requests: AtomicU64,
    pub total_errors: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub total_latency_ms: AtomicU64,
}

/// Snapshot of API metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub avg_latency_ms: f64,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

/// Embedder backed by an external `/v1/embeddings` endpoint
pub struct HttpEmbedder {
    http_client: reqwest::Client,
    config: EmbeddingServiceConfig,
    dimensions: AtomicUsize,
    cache: EmbeddingCache,
    metrics: APIMetrics,
}

impl HttpEmbedder {
    /// Create from configuration
    pub fn new(config: EmbeddingServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let dimensions = AtomicUsize::new(config.dimensions.unwrap_or(DEFAULT_DIMENSIONS));

        Ok(Self {
            http_client,
            config,
            dimensions,
            cache: EmbeddingCache::new(),
            metrics: APIMetrics::default(),
        })
    }

    fn batch_size(&self) -> usize {
        if self.config.batch_size > 0 {
            self.config.batch_size
        } else {
            DEFAULT_BATCH_SIZE
        }
    }

    /// Get current API metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        let total = self.metrics.total_requests.load(Ordering::Relaxed);
        let hits = self.metrics.cache_hits.load(Ordering::Relaxed);
        let misses = self.metrics.cache_misses.load(Ordering::Relaxed);
        let lookups = hits + misses;

        MetricsSnapshot {
            total_requests: total,
            total_errors: self.metrics.total_errors.load(Ordering::Relaxed),
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate: if lookups > 0 {
                hits as f64 / lookups as f64 * 100.0
            } else {
                0.0
            },
            avg_latency_ms: if total > 0 {
                self.metrics.total_latency_ms.load(Ordering::Relaxed) as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// One request for texts that missed the cache
    async fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let request = EmbedRequest {
            model: &self.config.model,
            input: texts,
        };
        let url = format!("{}/v1/embeddings", self.config.url.trim_end_matches('/'));

        let mut req = self.http_client.post(&url).json(&request);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req.send().await.map_err(|e| {
            self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
            SiftError::Http(e)
        })?;

        if !response.status().is_success() {
            self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SiftError::Embedding(format!(
                "Embedding service error (HTTP {}): {}",
                status, body
            )));
        }

        let mut embed_response: EmbedResponse = response.json().await.map_err(|e| {
            self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
            SiftError::Http(e)
        })?;

        if embed_response.data.len() != texts.len() {
            self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
            return Err(SiftError::Embedding(format!(
                "Expected {} embeddings, service returned {}",
                texts.len(),
                embed_response.data.len()
            )));
        }
        embed_response
            .data
            .sort_by_key(|d| d.index.unwrap_or(usize::MAX));

        let elapsed = start.elapsed().as_millis() as u64;
        self.metrics
            .total_latency_ms
            .fetch_add(elapsed, Ordering::Relaxed);

        Ok(embed_response
            .data
            .into_iter()
            .map(|d| d.embedding)
            .collect())
    }

    /// Evict expired cache entries and report usage so far
    fn log_usage(&self) {
        self.cache.cleanup();
        let cache = self.cache.stats();
        let metrics = self.metrics();
        tracing::debug!(
            "Embedding cache holds {} entries; {} requests, {} errors, {:.1}% hit rate, {:.1}ms avg latency",
            cache.active_entries,
            metrics.total_requests,
            metrics.total_errors,
            metrics.cache_hit_rate,
            metrics.avg_latency_ms
        );
    }

    fn observe_dimensions(&self, vector: &[f32]) {
        let previous = self.dimensions.swap(vector.len(), Ordering::Relaxed);
        if previous != vector.len() {
            tracing::info!(
                "Embedding dimensions corrected from {} to {} for {}",
                previous,
                vector.len(),
                self.config.model
            );
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SiftError::Embedding("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut uncached_texts = Vec::new();
        let mut uncached_indices = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let key = embedding_cache_key(&self.config.model, text);
            if let Some(cached) = self.cache.get(&key) {
                self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
                results.push(Some(cached));
                continue;
            }
            self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);
            results.push(None);
            uncached_texts.push(text.clone());
            uncached_indices.push(i);
        }

        tracing::debug!(
            "Embedding batch: {} cached, {} to fetch",
            texts.len() - uncached_texts.len(),
            uncached_texts.len()
        );

        let batches = uncached_texts
            .chunks(self.batch_size())
            .zip(uncached_indices.chunks(self.batch_size()));
        for (batch, indices) in batches {
            let vectors = self.request_embeddings(batch).await?;
            if let Some(first) = vectors.first() {
                self.observe_dimensions(first);
            }
            for ((text, idx), vector) in batch.iter().zip(indices).zip(vectors) {
                self.cache
                    .set(embedding_cache_key(&self.config.model, text), vector.clone());
                results[*idx] = Some(vector);
            }
        }
        self.log_usage();

        results
            .into_iter()
            .map(|r| r.ok_or_else(|| SiftError::Embedding("Missing embedding".to_string())))
            .collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions.load(Ordering::Relaxed)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
