//! Per-document section extraction

use crate::chunk::ChunkingStrategy;
use crate::extract::StyledLine;
use crate::outline::classify;
use serde::{Deserialize, Serialize};

/// Heading-labelled chunk of a named document, ready for embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub text: String,
    /// 1-based page number
    pub page: u32,
    pub file: String,
    /// Associated heading, empty when the page has none
    pub heading: String,
}

/// Everything extracted from one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSections {
    pub title: Option<String>,
    pub sections: Vec<SectionRecord>,
}

/// Classify headings, chunk with `strategy` and label each chunk
pub fn extract_sections(
    file_name: &str,
    lines: &[StyledLine],
    strategy: &dyn ChunkingStrategy,
) -> DocumentSections {
    let outline = classify(lines);
    let sections: Vec<SectionRecord> = strategy
        .chunk(lines, &outline.headings)
        .into_iter()
        .map(|chunk| SectionRecord {
            text: chunk.text,
            page: chunk.page + 1,
            file: file_name.to_string(),
            heading: chunk.heading,
        })
        .collect();

    tracing::debug!(
        "{}: {} sections using {} chunking, {} headings",
        file_name,
        sections.len(),
        strategy.name(),
        outline.headings.len()
    );

    DocumentSections {
        title: outline.title,
        sections,
    }
}
