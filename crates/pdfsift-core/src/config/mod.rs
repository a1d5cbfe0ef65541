//! Configuration management

use crate::chunk::StrategyKind;
use crate::error::{Result, SiftError};
use crate::store::StoreBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingServiceConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Retrieval and ranking configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Vector store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Number of documents processed concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding: EmbeddingServiceConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            store: StoreConfig::default(),
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    4
}

/// Embedding service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingServiceConfig {
    /// Base URL of the OpenAI-compatible embeddings service
    #[serde(default = "default_embedding_url")]
    pub url: String,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimensions (corrected from the first response if wrong)
    #[serde(default)]
    pub dimensions: Option<usize>,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Texts per embeddings request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for EmbeddingServiceConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            model: default_embedding_model(),
            dimensions: std::env::var("PDFSIFT_EMBEDDING_DIMS")
                .ok()
                .and_then(|s| s.parse().ok()),
            api_key: std::env::var("PDFSIFT_API_KEY").ok(),
            timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_embedding_url() -> String {
    std::env::var("PDFSIFT_EMBEDDING_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("PDFSIFT_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "sentence-transformers/all-MiniLM-L6-v2".to_string())
}

fn default_timeout() -> u64 {
    30
}

fn default_batch_size() -> usize {
    32
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Lower bound for sentence-aware chunks (chars)
    #[serde(default = "default_min_size")]
    pub min_size: usize,

    /// Upper bound for sentence-aware chunks (chars)
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Merge threshold for the simple per-page strategy (chars)
    #[serde(default = "default_simple_size")]
    pub simple_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            min_size: default_min_size(),
            max_size: default_max_size(),
            simple_size: default_simple_size(),
        }
    }
}

fn default_min_size() -> usize {
    500
}

fn default_max_size() -> usize {
    800
}

fn default_simple_size() -> usize {
    500
}

/// Retrieval and output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of ranked sections in the output
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Candidates fetched per output slot before length filtering
    #[serde(default = "default_oversample")]
    pub oversample: usize,

    /// Sections shorter than this are only used to backfill
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,

    /// Maximum length of a refined subsection text
    #[serde(default = "default_refined_text_limit")]
    pub refined_text_limit: usize,

    /// Vector collection name
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            oversample: default_oversample(),
            min_text_len: default_min_text_len(),
            refined_text_limit: default_refined_text_limit(),
            collection: default_collection(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

fn default_oversample() -> usize {
    3
}

fn default_min_text_len() -> usize {
    200
}

fn default_refined_text_limit() -> usize {
    1000
}

fn default_collection() -> String {
    "doc_sections".to_string()
}

/// Vector store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// SQLite database path (sqlite backend only)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Resolved SQLite path
    pub fn sqlite_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(crate::CACHE_DIR_NAME)
                .join("index.sqlite")
        })
    }
}

impl Config {
    /// Load config from default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load config from a path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Reject settings the chunkers and ranker cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_size == 0 || self.chunking.simple_size == 0 {
            return Err(SiftError::Config("chunk sizes must be positive".into()));
        }
        if self.chunking.min_size > self.chunking.max_size {
            return Err(SiftError::Config(format!(
                "chunking.min_size ({}) exceeds chunking.max_size ({})",
                self.chunking.min_size, self.chunking.max_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(SiftError::Config("retrieval.top_k must be positive".into()));
        }
        if self.workers == 0 {
            return Err(SiftError::Config("workers must be positive".into()));
        }
        Ok(())
    }
}
