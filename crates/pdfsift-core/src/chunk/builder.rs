//! Size-bounded chunk construction

use super::sentence::split_sentences;
use super::{Chunk, Paragraph};
use crate::extract::{lines_by_page, StyledLine};

/// Default lower bound for sentence-aware chunks (chars)
pub const MIN_CHUNK_CHARS: usize = 500;

/// Default upper bound for sentence-aware chunks (chars)
pub const MAX_CHUNK_CHARS: usize = 800;

/// Default merge threshold for simple per-page chunks (chars)
pub const SIMPLE_CHUNK_CHARS: usize = 500;

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Chunk being accumulated; never exposed until sealed
struct OpenChunk {
    text: String,
    len: usize,
    page: u32,
    y_start: f32,
}

impl OpenChunk {
    fn start(text: String, page: u32, y_start: f32) -> Self {
        let len = char_len(&text);
        Self {
            text,
            len,
            page,
            y_start,
        }
    }

    fn from_paragraph(para: &Paragraph) -> Self {
        Self::start(para.text.clone(), para.page, para.y_start)
    }

    /// Length after appending `text` with a separating space
    fn len_with(&self, text: &str) -> usize {
        self.len + 1 + char_len(text)
    }

    fn append(&mut self, text: &str) {
        self.len = self.len_with(text);
        self.text.push(' ');
        self.text.push_str(text);
    }

    fn seal(self) -> Chunk {
        Chunk {
            text: self.text,
            page: self.page,
            y_start: self.y_start,
        }
    }
}

/// How an accumulated chunk was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seal {
    /// Cut at the last sentence boundary
    Split,
    /// Closed whole because no long-enough cut existed
    Whole,
    /// Remainder at the end of the document
    Final,
}

/// Sentences before the last one, re-terminated, and the last sentence
fn split_at_last_sentence(text: &str) -> Option<(String, String)> {
    let sentences = split_sentences(text);
    let (last, head) = sentences.split_last()?;
    if head.is_empty() {
        return None;
    }
    Some((format!("{}.", head.join(". ")), last.clone()))
}

/// Greedily merge paragraphs into chunks of at most `max_size` chars.
///
/// On overflow the accumulated text is cut at its last sentence boundary when
/// the part before it reaches `min_size`; the held-back sentence then seeds
/// the next chunk at the position of the overflowing paragraph. Otherwise the
/// accumulator is sealed whole and the paragraph starts a new chunk. Each
/// chunk keeps the page and start y of the paragraph that opened it.
pub fn build_chunks(paragraphs: &[Paragraph], min_size: usize, max_size: usize) -> Vec<Chunk> {
    let chunks: Vec<Chunk> = seal_chunks(paragraphs, min_size, max_size)
        .into_iter()
        .map(|(chunk, _)| chunk)
        .collect();

    tracing::debug!(
        "Built {} chunks from {} paragraphs",
        chunks.len(),
        paragraphs.len()
    );
    chunks
}

fn seal_chunks(paragraphs: &[Paragraph], min_size: usize, max_size: usize) -> Vec<(Chunk, Seal)> {
    let mut chunks = Vec::new();
    let mut current: Option<OpenChunk> = None;

    for para in paragraphs {
        let Some(mut open) = current.take() else {
            current = Some(OpenChunk::from_paragraph(para));
            continue;
        };

        if open.len_with(&para.text) <= max_size {
            open.append(&para.text);
            current = Some(open);
            continue;
        }

        if let Some((head, last)) = split_at_last_sentence(&open.text) {
            if char_len(&head) >= min_size {
                let chunk = Chunk {
                    text: head,
                    page: open.page,
                    y_start: open.y_start,
                };
                chunks.push((chunk, Seal::Split));
                current = Some(OpenChunk::start(last, para.page, para.y_start));
                // Only the position of `para` carries over; its text is not merged
                continue;
            }
        }

        chunks.push((open.seal(), Seal::Whole));
        current = Some(OpenChunk::from_paragraph(para));
    }

    if let Some(open) = current {
        chunks.push((open.seal(), Seal::Final));
    }
    chunks
}

/// Merge each page's lines while the merged text stays under `size` chars.
/// Chunks never span pages.
pub fn build_simple_chunks(lines: &[StyledLine], size: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for (page, page_lines) in lines_by_page(lines) {
        let mut current: Option<OpenChunk> = None;

        for line in page_lines {
            match current {
                Some(ref mut open) if open.len + char_len(&line.text) < size => {
                    open.append(&line.text);
                }
                None if char_len(&line.text) < size => {
                    current = Some(OpenChunk::start(line.text.clone(), page, line.y_coord));
                }
                _ => {
                    if let Some(open) = current.take() {
                        chunks.push(open.seal());
                    }
                    current = Some(OpenChunk::start(line.text.clone(), page, line.y_coord));
                }
            }
        }

        if let Some(open) = current {
            chunks.push(open.seal());
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn para(text: &str, page: u32, y: f32) -> Paragraph {
        Paragraph {
            text: text.to_string(),
            page,
            y_start: y,
            y_end: y,
        }
    }

    fn sentence(word: &str, words: usize) -> String {
        let body = vec![word; words].join(" ");
        format!("{}.", body)
    }

    #[test]
    fn test_small_paragraphs_merge() {
        let paragraphs = vec![para("Alpha beta.", 0, 10.0), para("Gamma delta.", 0, 30.0)];
        let chunks = build_chunks(&paragraphs, 5, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Alpha beta. Gamma delta.");
        assert_eq!(chunks[0].page, 0);
        assert_eq!(chunks[0].y_start, 10.0);
    }

    #[test]
    fn test_overflow_without_sentence_boundary_seals_whole() {
        let first = "x".repeat(60);
        let second = "y".repeat(60);
        let chunks = build_chunks(&[para(&first, 0, 1.0), para(&second, 1, 2.0)], 10, 100);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, first);
        assert_eq!(chunks[1].text, second);
        assert_eq!(chunks[1].page, 1);
        assert_eq!(chunks[1].y_start, 2.0);
    }

    #[test]
    fn test_overflow_splits_at_last_sentence() {
        // Two 30-char sentences: "aaaa aaaa ... aaaa."
        let first = format!("{} {}", sentence("aaaa", 6), sentence("bbbb", 6));
        let overflow = "z".repeat(50);
        let chunks = build_chunks(&[para(&first, 0, 5.0), para(&overflow, 0, 90.0)], 20, 80);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, sentence("aaaa", 6));
        assert_eq!(chunks[0].y_start, 5.0);
        // The held-back sentence seeds the next chunk at the overflowing paragraph
        assert_eq!(chunks[1].text, "bbbb bbbb bbbb bbbb bbbb bbbb");
        assert_eq!(chunks[1].y_start, 90.0);
    }

    #[test]
    fn test_split_too_small_seals_whole_accumulator() {
        let first = format!("{} {}", sentence("aaaa", 2), sentence("bbbb", 12));
        let overflow = "z".repeat(50);
        let chunks = build_chunks(&[para(&first, 0, 5.0), para(&overflow, 0, 90.0)], 40, 80);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, first);
        assert_eq!(chunks[1].text, overflow);
        assert_eq!(chunks[1].y_start, 90.0);
    }

    #[test]
    fn test_oversized_single_paragraph_is_own_chunk() {
        let big = "w".repeat(1000);
        let chunks = build_chunks(&[para(&big, 0, 0.0), para("tail", 0, 1.0)], 500, 800);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text.len(), 1000);
        assert_eq!(chunks[1].text, "tail");
    }

    #[test]
    fn test_no_paragraphs_no_chunks() {
        assert!(build_chunks(&[], MIN_CHUNK_CHARS, MAX_CHUNK_CHARS).is_empty());
    }

    #[test]
    fn test_simple_chunks_per_page() {
        let lines = vec![
            StyledLine::new("aaaa", 0, 10.0, 10.0),
            StyledLine::new("bbbb", 0, 10.0, 20.0),
            StyledLine::new("cccc", 0, 10.0, 30.0),
            StyledLine::new("dddd", 1, 10.0, 10.0),
        ];
        let chunks = build_simple_chunks(&lines, 10);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        // 4 + 4 < 10 merges; 9 + 4 >= 10 seals
        assert_eq!(texts, vec!["aaaa bbbb", "cccc", "dddd"]);
        assert_eq!(chunks[1].y_start, 30.0);
        assert_eq!(chunks[2].page, 1);
    }

    #[test]
    fn test_simple_long_line_stands_alone() {
        let lines = vec![
            StyledLine::new("x".repeat(20), 0, 10.0, 10.0),
            StyledLine::new("y", 0, 10.0, 20.0),
        ];
        let chunks = build_simple_chunks(&lines, 10);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text.len(), 20);
    }

    fn arb_paragraph() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z]{1,12}[.!?]?", 1..30).prop_map(|words| words.join(" "))
    }

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace()
            .map(|w| w.trim_end_matches(['.', '!', '?']).to_string())
            .filter(|w| !w.is_empty())
            .collect()
    }

    fn is_subsequence(needle: &[String], haystack: &[String]) -> bool {
        let mut rest = haystack.iter();
        needle.iter().all(|word| rest.any(|candidate| candidate == word))
    }

    #[test]
    fn test_seal_kinds() {
        let first = format!("{} {}", sentence("aaaa", 6), sentence("bbbb", 6));
        let overflow = "z".repeat(50);
        let kinds: Vec<Seal> = seal_chunks(&[para(&first, 0, 5.0), para(&overflow, 0, 90.0)], 20, 80)
            .into_iter()
            .map(|(_, seal)| seal)
            .collect();
        assert_eq!(kinds, vec![Seal::Split, Seal::Final]);

        let kinds: Vec<Seal> = seal_chunks(&[para(&first, 0, 5.0), para(&overflow, 0, 90.0)], 40, 80)
            .into_iter()
            .map(|(_, seal)| seal)
            .collect();
        assert_eq!(kinds, vec![Seal::Whole, Seal::Final]);
    }

    proptest! {
        #[test]
        fn prop_chunks_respect_max_when_paragraphs_fit(
            texts in prop::collection::vec(arb_paragraph(), 0..30),
            min_size in 0usize..200,
        ) {
            let max_size = 520;
            let paragraphs: Vec<Paragraph> = texts
                .iter()
                .enumerate()
                .map(|(i, t)| para(t, (i / 5) as u32, i as f32))
                .collect();

            let chunks = build_chunks(&paragraphs, min_size, max_size);
            prop_assert_eq!(chunks.is_empty(), paragraphs.is_empty());
            for chunk in &chunks {
                prop_assert!(char_len(&chunk.text) <= max_size);
                prop_assert!(!chunk.text.is_empty());
            }
        }

        #[test]
        fn prop_split_chunks_reach_min_size(
            texts in prop::collection::vec(arb_paragraph(), 0..30),
            min_size in 0usize..400,
        ) {
            let max_size = 520;
            let paragraphs: Vec<Paragraph> = texts
                .iter()
                .enumerate()
                .map(|(i, t)| para(t, 0, i as f32))
                .collect();

            for (chunk, seal) in seal_chunks(&paragraphs, min_size, max_size) {
                match seal {
                    Seal::Split => prop_assert!(char_len(&chunk.text) >= min_size),
                    // Sealed whole only when no cut reaches min_size
                    Seal::Whole => {
                        if let Some((head, _)) = split_at_last_sentence(&chunk.text) {
                            prop_assert!(char_len(&head) < min_size);
                        }
                    }
                    Seal::Final => {}
                }
            }
        }

        #[test]
        fn prop_chunk_words_follow_paragraph_order(
            texts in prop::collection::vec(arb_paragraph(), 0..30),
            min_size in 0usize..400,
        ) {
            let paragraphs: Vec<Paragraph> = texts
                .iter()
                .enumerate()
                .map(|(i, t)| para(t, 0, i as f32))
                .collect();
            let source: Vec<String> = texts.iter().flat_map(|t| words(t)).collect();

            let chunked: Vec<String> = build_chunks(&paragraphs, min_size, 520)
                .iter()
                .flat_map(|c| words(&c.text))
                .collect();
            // Words may be dropped with an overflowing paragraph but never reordered or invented
            prop_assert!(is_subsequence(&chunked, &source));
        }
    }
}
