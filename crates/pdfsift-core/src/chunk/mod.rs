//! Paragraph and chunk construction
//!
//! Lines are merged into paragraphs, paragraphs into size-bounded chunks. The
//! strategies in [`strategy`] combine this with heading association.

mod builder;
mod paragraph;
mod sentence;
mod strategy;

pub use builder::{
    build_chunks, build_simple_chunks, MAX_CHUNK_CHARS, MIN_CHUNK_CHARS, SIMPLE_CHUNK_CHARS,
};
pub use paragraph::{build_paragraphs, is_paragraph_break};
pub use sentence::split_sentences;
pub use strategy::{AssociatedChunk, ChunkingStrategy, SentenceAware, Simple, StrategyKind};

pub(crate) use builder::char_len;

use serde::{Deserialize, Serialize};

/// Consecutive lines of one page judged to form a paragraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    /// 0-based page index
    pub page: u32,
    pub y_start: f32,
    pub y_end: f32,
}

/// Size-bounded unit of text ready for association
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    /// Page of the paragraph that opened the chunk
    pub page: u32,
    pub y_start: f32,
}
