//! Styled line extraction
//!
//! Turns PDF pages into a flat, reading-ordered sequence of text lines carrying
//! the font signals the heading classifier needs.

mod decode;
mod pdf;

pub use pdf::PdfLineExtractor;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One physical line of text with its style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledLine {
    pub text: String,
    /// 0-based page index
    pub page: u32,
    pub font_size: f32,
    pub font_name: String,
    pub is_bold: bool,
    /// Top-down y coordinate: smaller values are higher on the page
    pub y_coord: f32,
}

impl StyledLine {
    pub fn new(text: impl Into<String>, page: u32, font_size: f32, y_coord: f32) -> Self {
        Self {
            text: text.into(),
            page,
            font_size,
            font_name: String::new(),
            is_bold: false,
            y_coord,
        }
    }

    pub fn bold(mut self) -> Self {
        self.is_bold = true;
        self
    }
}

/// Source of styled lines for one document
pub trait LineExtractor: Send + Sync {
    /// Extract lines from an in-memory document
    fn extract(&self, bytes: &[u8]) -> Result<Vec<StyledLine>>;

    /// Extract lines from a file on disk
    fn extract_file(&self, path: &Path) -> Result<Vec<StyledLine>> {
        let bytes = std::fs::read(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to read PDF file {:?}: {}", path, e),
            )
        })?;
        self.extract(&bytes)
    }
}

/// Group lines by page, preserving reading order within each page
pub fn lines_by_page(lines: &[StyledLine]) -> BTreeMap<u32, Vec<&StyledLine>> {
    let mut pages: BTreeMap<u32, Vec<&StyledLine>> = BTreeMap::new();
    for line in lines {
        pages.entry(line.page).or_default().push(line);
    }
    pages
}

/// Whether a font name denotes a bold face
pub fn is_bold_font(font_name: &str) -> bool {
    font_name.contains("Bold") || font_name.contains("bold")
}
