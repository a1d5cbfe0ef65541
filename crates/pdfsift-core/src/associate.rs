//! Heading association
//!
//! Labels each chunk with the heading it most likely falls under. Unresolved
//! chunks get an empty string, never `None`.

use crate::chunk::Chunk;
use crate::outline::{HeadingEntry, HeadingIndex};
use std::collections::HashSet;

/// Pick a heading by content overlap, then by vertical proximity.
///
/// A page with a single heading always yields that heading. Otherwise the first
/// heading whose text, or any of its words, occurs in the chunk wins; failing
/// that, the nearest heading above the chunk start, then the nearest below.
pub fn associate(chunk: &Chunk, index: &HeadingIndex) -> String {
    let Some(headings) = index.page(chunk.page) else {
        return String::new();
    };
    match headings {
        [] => String::new(),
        [only] => only.text.clone(),
        _ => by_content(&chunk.text, headings)
            .or_else(|| by_position(chunk.y_start, headings))
            .unwrap_or(&headings[0])
            .text
            .clone(),
    }
}

fn by_content<'a>(text: &str, headings: &'a [HeadingEntry]) -> Option<&'a HeadingEntry> {
    let text = text.to_lowercase();
    headings.iter().find(|heading| {
        let heading_text = heading.text.to_lowercase();
        text.contains(&heading_text)
            || heading_text
                .split_whitespace()
                .any(|word| text.contains(word))
    })
}

fn by_position(y_start: f32, headings: &[HeadingEntry]) -> Option<&HeadingEntry> {
    let closest_above = headings
        .iter()
        .filter(|h| h.y_coord <= y_start)
        .fold(None, |best: Option<&HeadingEntry>, h| match best {
            Some(b) if b.y_coord >= h.y_coord => Some(b),
            _ => Some(h),
        });
    closest_above.or_else(|| {
        headings
            .iter()
            .filter(|h| h.y_coord > y_start)
            .fold(None, |best: Option<&HeadingEntry>, h| match best {
                Some(b) if b.y_coord <= h.y_coord => Some(b),
                _ => Some(h),
            })
    })
}

/// Pick the first heading sharing a whole word with the text, else the page's
/// first heading. Used by the simple per-page chunking strategy.
pub fn associate_by_overlap(page: u32, text: &str, index: &HeadingIndex) -> String {
    let Some(headings) = index.page(page) else {
        return String::new();
    };
    match headings {
        [] => String::new(),
        [only] => only.text.clone(),
        _ => {
            let lowered = text.to_lowercase();
            let chunk_words: HashSet<&str> = lowered.split_whitespace().collect();
            headings
                .iter()
                .find(|heading| {
                    heading
                        .text
                        .to_lowercase()
                        .split_whitespace()
                        .any(|word| chunk_words.contains(word))
                })
                .unwrap_or(&headings[0])
                .text
                .clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::HeadingLevel;

    fn heading(text: &str, page: u32, y: f32) -> HeadingEntry {
        HeadingEntry {
            level: HeadingLevel::H1,
            text: text.to_string(),
            page,
            y_coord: y,
        }
    }

    fn chunk(text: &str, page: u32, y: f32) -> Chunk {
        Chunk {
            text: text.to_string(),
            page,
            y_start: y,
        }
    }

    fn three_headings() -> HeadingIndex {
        HeadingIndex::from_entries(vec![
            heading("Introduction", 0, 10.0),
            heading("Methodology", 0, 50.0),
            heading("Conclusions", 0, 90.0),
        ])
    }

    #[test]
    fn test_page_without_headings() {
        let index = three_headings();
        assert_eq!(associate(&chunk("anything", 3, 0.0), &index), "");
        assert_eq!(associate_by_overlap(3, "anything", &index), "");
    }

    #[test]
    fn test_single_heading_page_shortcut() {
        let index = HeadingIndex::from_entries(vec![heading("Budget", 2, 500.0)]);
        let c = chunk("zero overlap at all", 2, 10.0);
        assert_eq!(associate(&c, &index), "Budget");
        assert_eq!(associate_by_overlap(2, "zero overlap at all", &index), "Budget");
    }

    #[test]
    fn test_content_overlap_wins_in_page_order() {
        let index = three_headings();
        let c = chunk("our METHODOLOGY and conclusions", 0, 5.0);
        assert_eq!(associate(&c, &index), "Methodology");
    }

    #[test]
    fn test_word_substring_counts_as_overlap() {
        let index = HeadingIndex::from_entries(vec![
            heading("Travel Tips", 0, 10.0),
            heading("Hotel Guide", 0, 50.0),
        ]);
        // "hotel" appears inside "hotels"
        let c = chunk("the best hotels in town", 0, 5.0);
        assert_eq!(associate(&c, &index), "Hotel Guide");
    }

    #[test]
    fn test_closest_heading_above() {
        let index = three_headings();
        let c = chunk("nothing in common here", 0, 60.0);
        assert_eq!(associate(&c, &index), "Methodology");
    }

    #[test]
    fn test_heading_at_same_y_counts_as_above() {
        let index = three_headings();
        let c = chunk("nothing in common here", 0, 90.0);
        assert_eq!(associate(&c, &index), "Conclusions");
    }

    #[test]
    fn test_closest_heading_below_when_none_above() {
        let index = three_headings();
        let c = chunk("nothing in common here", 0, 2.0);
        assert_eq!(associate(&c, &index), "Introduction");
    }

    #[test]
    fn test_unordered_y_falls_back_to_first() {
        let index = HeadingIndex::from_entries(vec![
            heading("Alpha Section", 0, f32::NAN),
            heading("Beta Section", 0, f32::NAN),
        ]);
        let c = chunk("no match", 0, 10.0);
        assert_eq!(associate(&c, &index), "Alpha Section");
    }

    #[test]
    fn test_overlap_variant_requires_whole_words() {
        let index = HeadingIndex::from_entries(vec![
            heading("Travel Tips", 0, 10.0),
            heading("Hotel Guide", 0, 50.0),
        ]);
        assert_eq!(
            associate_by_overlap(0, "the best hotels in town", &index),
            "Travel Tips"
        );
        assert_eq!(
            associate_by_overlap(0, "a hotel near the station", &index),
            "Hotel Guide"
        );
    }
}
