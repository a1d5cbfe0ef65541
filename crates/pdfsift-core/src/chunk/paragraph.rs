//! Paragraph reconstruction from styled lines

use super::Paragraph;
use crate::extract::{lines_by_page, StyledLine};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SENTENCE_THEN_CAPITAL: Regex = Regex::new(r"[.!?]\s+[A-Z]").unwrap();
}

/// Characters inspected at the end of the paragraph for a blank-line marker
const BLANK_LINE_WINDOW: usize = 20;

/// Characters taken from each side of the seam for the punctuation test
const SEAM_WINDOW: usize = 10;

fn last_chars(text: &str, n: usize) -> &str {
    match text.char_indices().rev().nth(n.saturating_sub(1)) {
        Some((idx, _)) if n > 0 => &text[idx..],
        _ if n == 0 => "",
        _ => text,
    }
}

fn first_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Whether a paragraph break falls between `before` and `after`
pub fn is_paragraph_break(before: &str, after: &str) -> bool {
    if before.is_empty() || after.is_empty() {
        return false;
    }
    if last_chars(before, BLANK_LINE_WINDOW).contains("\n\n") {
        return true;
    }
    let seam = format!(
        "{}{}",
        last_chars(before, SEAM_WINDOW),
        first_chars(after, SEAM_WINDOW)
    );
    SENTENCE_THEN_CAPITAL.is_match(&seam)
}

/// Paragraph being accumulated
struct OpenParagraph {
    text: String,
    page: u32,
    y_start: f32,
    y_end: f32,
}

impl OpenParagraph {
    fn seal(self) -> Paragraph {
        Paragraph {
            text: self.text.trim().to_string(),
            page: self.page,
            y_start: self.y_start,
            y_end: self.y_end,
        }
    }
}

/// Merge lines into paragraphs, page by page
pub fn build_paragraphs(lines: &[StyledLine]) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();

    for (page, page_lines) in lines_by_page(lines) {
        let mut current: Option<OpenParagraph> = None;

        for line in page_lines {
            match current {
                Some(ref mut open) if !is_paragraph_break(&open.text, &line.text) => {
                    open.text.push(' ');
                    open.text.push_str(&line.text);
                    open.y_end = line.y_coord;
                }
                _ => {
                    if let Some(open) = current.take() {
                        paragraphs.push(open.seal());
                    }
                    current = Some(OpenParagraph {
                        text: line.text.clone(),
                        page,
                        y_start: line.y_coord,
                        y_end: line.y_coord,
                    });
                }
            }
        }

        if let Some(open) = current {
            paragraphs.push(open.seal());
        }
    }

    paragraphs
}
