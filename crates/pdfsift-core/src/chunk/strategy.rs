//! Chunking strategies

use super::{build_chunks, build_paragraphs, build_simple_chunks};
use crate::associate::{associate, associate_by_overlap};
use crate::config::ChunkingConfig;
use crate::error::SiftError;
use crate::extract::StyledLine;
use crate::outline::HeadingIndex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A chunk labelled with its heading ("" when none applies)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociatedChunk {
    pub text: String,
    /// 0-based page index
    pub page: u32,
    pub heading: String,
}

/// Turns a document's lines into heading-labelled chunks
pub trait ChunkingStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn chunk(&self, lines: &[StyledLine], index: &HeadingIndex) -> Vec<AssociatedChunk>;
}

/// Paragraph-based chunking bounded by sentence boundaries
#[derive(Debug, Clone, Copy)]
pub struct SentenceAware {
    pub min_size: usize,
    pub max_size: usize,
}

impl ChunkingStrategy for SentenceAware {
    fn name(&self) -> &'static str {
        "sentence-aware"
    }

    fn chunk(&self, lines: &[StyledLine], index: &HeadingIndex) -> Vec<AssociatedChunk> {
        let paragraphs = build_paragraphs(lines);
        build_chunks(&paragraphs, self.min_size, self.max_size)
            .into_iter()
            .map(|chunk| {
                let heading = associate(&chunk, index);
                AssociatedChunk {
                    text: chunk.text,
                    page: chunk.page,
                    heading,
                }
            })
            .collect()
    }
}

/// Per-page line merging with word-overlap heading association
#[derive(Debug, Clone, Copy)]
pub struct Simple {
    pub size: usize,
}

impl ChunkingStrategy for Simple {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn chunk(&self, lines: &[StyledLine], index: &HeadingIndex) -> Vec<AssociatedChunk> {
        build_simple_chunks(lines, self.size)
            .into_iter()
            .map(|chunk| AssociatedChunk {
                heading: associate_by_overlap(chunk.page, &chunk.text, index),
                text: chunk.text,
                page: chunk.page,
            })
            .collect()
    }
}

/// Selectable strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    #[default]
    SentenceAware,
    Simple,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SentenceAware => "sentence-aware",
            Self::Simple => "simple",
        }
    }

    /// Instantiate the strategy with the configured bounds
    pub fn build(&self, config: &ChunkingConfig) -> Box<dyn ChunkingStrategy> {
        match self {
            Self::SentenceAware => Box::new(SentenceAware {
                min_size: config.min_size,
                max_size: config.max_size,
            }),
            Self::Simple => Box::new(Simple {
                size: config.simple_size,
            }),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sentence-aware" | "sentence" => Ok(Self::SentenceAware),
            "simple" => Ok(Self::Simple),
            other => Err(SiftError::InvalidInput(format!(
                "Unknown chunking strategy '{}' (expected sentence-aware or simple)",
                other
            ))),
        }
    }
}
