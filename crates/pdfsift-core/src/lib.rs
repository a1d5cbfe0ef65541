//! Pdfsift Core Library
//!
//! Heading-aware PDF chunking and persona-driven section retrieval.
//!
//! # Features
//! - Styled line extraction from PDF content streams
//! - Heading classification from font size and weight
//! - Sentence-aware and simple per-page chunking with heading association
//! - Embedding via OpenAI-compatible services
//! - In-memory (HNSW-accelerated) and SQLite vector stores

pub mod associate;
pub mod chunk;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod outline;
pub mod pipeline;
pub mod section;
pub mod store;

pub use associate::{associate, associate_by_overlap};
pub use chunk::{AssociatedChunk, Chunk, ChunkingStrategy, Paragraph, StrategyKind};
pub use config::{ChunkingConfig, Config, EmbeddingServiceConfig, RetrievalConfig, StoreConfig};
pub use error::{Error, Result, SiftError};
pub use extract::{LineExtractor, PdfLineExtractor, StyledLine};
pub use llm::{Embedder, HttpEmbedder};
pub use outline::{classify, HeadingEntry, HeadingIndex, HeadingLevel, Outline};
pub use pipeline::{PipelineContext, RankedOutput, RunRequest, RunSummary};
pub use section::{extract_sections, DocumentSections, SectionRecord};
pub use store::{MemoryStore, ScoredSection, SqliteStore, StoreBackend, VectorStore};

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = "pdfsift";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "pdfsift";
