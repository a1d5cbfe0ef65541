//! Vector storage for embedded sections
//!
//! Two backends share the [`VectorStore`] interface:
//! - [`MemoryStore`]: brute-force cosine, HNSW once the store grows large
//! - [`SqliteStore`]: persisted, scoped by collection

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::config::StoreConfig;
use crate::error::{Result, SiftError};
use crate::section::SectionRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An embedded section
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedSection {
    pub id: u64,
    pub vector: Vec<f32>,
    pub section: SectionRecord,
}

/// A search hit; higher scores are more similar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSection {
    pub section: SectionRecord,
    pub score: f32,
}

/// Similarity index over embedded sections
pub trait VectorStore: Send + Sync {
    /// Insert points, replacing any with the same id
    fn upsert(&self, points: Vec<IndexedSection>) -> Result<()>;

    /// Top `limit` points by cosine similarity; ties keep insertion order
    fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredSection>>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every point
    fn clear(&self) -> Result<()>;
}

/// Selectable storage backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(SiftError::InvalidInput(format!(
                "Unknown store backend '{}' (expected memory or sqlite)",
                other
            ))),
        }
    }
}

/// Open the configured backend for one collection
pub fn open_store(config: &StoreConfig, collection: &str) -> Result<Box<dyn VectorStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(Box::new(MemoryStore::new())),
        StoreBackend::Sqlite => {
            let path = config.sqlite_path();
            tracing::debug!("Opening SQLite store at {:?}", path);
            Ok(Box::new(SqliteStore::open(&path, collection)?))
        }
    }
}

/// Convert f32 embedding to little-endian bytes
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert little-endian bytes to f32 embedding
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Stable sort by descending score, truncated to `limit`
pub(crate) fn rank(mut hits: Vec<ScoredSection>, limit: usize) -> Vec<ScoredSection> {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(limit);
    hits
}
