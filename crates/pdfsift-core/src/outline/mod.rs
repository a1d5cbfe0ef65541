//! Heading detection
//!
//! Infers a heading taxonomy from font signals and indexes the headings by page.

mod classifier;

pub use classifier::{classify, clean_heading_text, is_heading_candidate, SKIP_LABELS};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coarse structural rank of a heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    Title,
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Levels in rank order, largest font first
    pub const RANKED: [HeadingLevel; 4] = [Self::Title, Self::H1, Self::H2, Self::H3];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::H1 => "H1",
            Self::H2 => "H2",
            Self::H3 => "H3",
        }
    }
}

impl std::fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected heading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingEntry {
    pub level: HeadingLevel,
    /// Cleaned heading text
    pub text: String,
    /// 0-based page index
    pub page: u32,
    pub y_coord: f32,
}

/// Headings grouped by page, in line order within each page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeadingIndex {
    pages: BTreeMap<u32, Vec<HeadingEntry>>,
}

impl HeadingIndex {
    pub fn from_entries(entries: impl IntoIterator<Item = HeadingEntry>) -> Self {
        let mut pages: BTreeMap<u32, Vec<HeadingEntry>> = BTreeMap::new();
        for entry in entries {
            pages.entry(entry.page).or_default().push(entry);
        }
        Self { pages }
    }

    /// Headings on a page; `None` when the page has no heading
    pub fn page(&self, page: u32) -> Option<&[HeadingEntry]> {
        self.pages.get(&page).map(Vec::as_slice)
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HeadingEntry> {
        self.pages.values().flatten()
    }

    /// Total number of headings
    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Classifier output for one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub title: Option<String>,
    pub headings: HeadingIndex,
}
