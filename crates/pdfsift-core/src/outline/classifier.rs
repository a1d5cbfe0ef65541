//! Heading classification from font size and weight

use super::{HeadingEntry, HeadingIndex, HeadingLevel, Outline};
use crate::extract::StyledLine;

/// Form-field labels that are never headings (compared lowercased)
pub const SKIP_LABELS: &[&str] = &["s.no", "name", "age", "date", "rs.", "signature"];

/// Font sizes used by at least this share of lines are body styles
const RARE_SIZE_RATIO: f64 = 0.2;

/// Cleaned headings must be longer than this
const MIN_HEADING_CHARS: usize = 3;

/// Trim a heading and keep only the part before the first colon
pub fn clean_heading_text(text: &str) -> String {
    let text = text.trim();
    match text.split_once(':') {
        Some((label, _)) => label.trim().to_string(),
        None => text.to_string(),
    }
}

/// Whether cleaned text can stand as a heading
pub fn is_heading_candidate(cleaned: &str) -> bool {
    if cleaned.chars().count() <= MIN_HEADING_CHARS {
        return false;
    }
    let without_dots: String = cleaned.chars().filter(|c| *c != '.').collect();
    if !without_dots.is_empty() && without_dots.chars().all(|c| c.is_numeric()) {
        return false;
    }
    let lowered = cleaned.to_lowercase();
    !SKIP_LABELS.contains(&lowered.as_str())
}

/// Classify lines into a document title and a page-indexed heading map.
///
/// Bold lines, when any exist, are all H1 candidates and no title is produced.
/// Otherwise the four largest rare font sizes map to Title, H1, H2 and H3.
pub fn classify(lines: &[StyledLine]) -> Outline {
    if lines.is_empty() {
        return Outline::default();
    }

    let outline = if lines.iter().any(|l| l.is_bold) {
        classify_bold(lines)
    } else {
        classify_by_size(lines)
    };

    tracing::debug!(
        "Classified {} lines into {} headings (title: {})",
        lines.len(),
        outline.headings.len(),
        outline.title.is_some()
    );
    outline
}

fn classify_bold(lines: &[StyledLine]) -> Outline {
    let entries = lines.iter().filter(|l| l.is_bold).filter_map(|line| {
        let text = clean_heading_text(&line.text);
        is_heading_candidate(&text).then(|| HeadingEntry {
            level: HeadingLevel::H1,
            text,
            page: line.page,
            y_coord: line.y_coord,
        })
    });

    Outline {
        title: None,
        headings: HeadingIndex::from_entries(entries),
    }
}

/// Distinct font sizes with their line counts, in first-seen order
fn size_histogram(lines: &[StyledLine]) -> Vec<(f32, usize)> {
    let mut counts: Vec<(f32, usize)> = Vec::new();
    for line in lines {
        match counts.iter_mut().find(|(size, _)| *size == line.font_size) {
            Some(entry) => entry.1 += 1,
            None => counts.push((line.font_size, 1)),
        }
    }
    counts
}

fn classify_by_size(lines: &[StyledLine]) -> Outline {
    let histogram = size_histogram(lines);
    let total = lines.len() as f64;

    // Ties go to the size seen first
    let mut body_size = histogram[0];
    for entry in &histogram[1..] {
        if entry.1 > body_size.1 {
            body_size = *entry;
        }
    }
    let body_size = body_size.0;

    let mut rare_sizes: Vec<f32> = histogram
        .iter()
        .filter(|(size, count)| *size != body_size && (*count as f64) / total < RARE_SIZE_RATIO)
        .map(|(size, _)| *size)
        .collect();
    rare_sizes.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let level_for = |size: f32| -> Option<HeadingLevel> {
        rare_sizes
            .iter()
            .zip(HeadingLevel::RANKED.iter())
            .find(|(rare, _)| **rare == size)
            .map(|(_, level)| *level)
    };

    let mut title_parts = Vec::new();
    let mut entries = Vec::new();
    for line in lines {
        if line.font_size == body_size {
            continue;
        }
        let Some(level) = level_for(line.font_size) else {
            continue;
        };
        let text = clean_heading_text(&line.text);
        if !is_heading_candidate(&text) {
            continue;
        }
        if level == HeadingLevel::Title {
            title_parts.push(text);
        } else {
            entries.push(HeadingEntry {
                level,
                text,
                page: line.page,
                y_coord: line.y_coord,
            });
        }
    }

    Outline {
        title: (!title_parts.is_empty()).then(|| title_parts.join(" ")),
        headings: HeadingIndex::from_entries(entries),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(text: &str, page: u32, size: f32, y: f32) -> StyledLine {
        StyledLine::new(text, page, size, y)
    }

    /// Ten body lines at 10pt so that single-line sizes stay rare
    fn body(page: u32) -> Vec<StyledLine> {
        (0..10)
            .map(|i| line(&format!("Body text line number {}", i), page, 10.0, 100.0 + i as f32))
            .collect()
    }

    #[test]
    fn test_clean_heading_text() {
        assert_eq!(clean_heading_text("Chapter 1: Introduction"), "Chapter 1");
        assert_eq!(clean_heading_text("  Overview  "), "Overview");
        assert_eq!(clean_heading_text("Name : John"), "Name");
        assert_eq!(clean_heading_text(": leading"), "");
    }

    #[test]
    fn test_candidate_filters() {
        assert!(!is_heading_candidate("AB"));
        assert!(!is_heading_candidate("Abc"));
        assert!(!is_heading_candidate("12."));
        assert!(!is_heading_candidate("1.2.3"));
        assert!(!is_heading_candidate("Name"));
        assert!(!is_heading_candidate("SIGNATURE"));
        assert!(!is_heading_candidate("S.No"));
        assert!(is_heading_candidate("Abcd"));
        assert!(is_heading_candidate("2024 Plan"));
    }

    #[test]
    fn test_empty_document() {
        let outline = classify(&[]);
        assert!(outline.title.is_none());
        assert!(outline.headings.is_empty());
    }

    #[test]
    fn test_bold_mode_yields_h1_without_title() {
        let mut lines = body(0);
        lines.insert(0, line("Big Document Title", 0, 24.0, 5.0));
        lines.push(line("Methods Overview", 0, 12.0, 200.0).bold());
        lines.push(line("Results and Discussion", 1, 12.0, 30.0).bold());

        let outline = classify(&lines);
        assert!(outline.title.is_none());
        assert_eq!(outline.headings.len(), 2);
        assert!(outline.headings.entries().all(|h| h.level == HeadingLevel::H1));
        assert_eq!(outline.headings.page(1).unwrap()[0].text, "Results and Discussion");
    }

    #[test]
    fn test_font_size_mode_levels_and_title() {
        let mut lines = body(0);
        lines.insert(0, line("Quarterly Review", 0, 24.0, 5.0));
        lines.insert(1, line("Financial Summary", 0, 18.0, 30.0));
        lines.push(line("Revenue Details", 0, 14.0, 150.0));
        lines.push(line("Regional Notes", 0, 12.0, 170.0));
        lines.push(line("Footnote Style", 0, 8.0, 190.0));

        let outline = classify(&lines);
        assert_eq!(outline.title.as_deref(), Some("Quarterly Review"));

        let levels: Vec<(HeadingLevel, &str)> = outline
            .headings
            .entries()
            .map(|h| (h.level, h.text.as_str()))
            .collect();
        assert_eq!(
            levels,
            vec![
                (HeadingLevel::H1, "Financial Summary"),
                (HeadingLevel::H2, "Revenue Details"),
                (HeadingLevel::H3, "Regional Notes"),
            ]
        );
    }

    #[test]
    fn test_title_concatenates_across_pages() {
        let mut lines = body(0);
        lines.insert(0, line("Part One", 0, 24.0, 5.0));
        lines.push(line("Part Two", 1, 24.0, 5.0));

        let outline = classify(&lines);
        assert_eq!(outline.title.as_deref(), Some("Part One Part Two"));
    }

    #[test]
    fn test_frequent_secondary_size_is_not_heading() {
        // 10 body lines at 10pt, 3 lines at 11pt (3/13 >= 20%)
        let mut lines = body(0);
        for i in 0..3 {
            lines.push(line(&format!("Caption text {}", i), 0, 11.0, 300.0 + i as f32));
        }
        let outline = classify(&lines);
        assert!(outline.headings.is_empty());
        assert!(outline.title.is_none());
    }

    #[test]
    fn test_all_candidates_filtered_is_headingless() {
        let lines = vec![
            line("Name", 0, 12.0, 10.0).bold(),
            line("12.", 0, 12.0, 20.0).bold(),
            line("Date: 2024-01-01", 0, 12.0, 30.0).bold(),
            line("Some body text here", 0, 10.0, 40.0),
        ];
        let outline = classify(&lines);
        assert!(outline.headings.is_empty());
        assert!(outline.title.is_none());
    }

    #[test]
    fn test_colon_heading_is_truncated() {
        let lines = vec![line("Chapter 1: Introduction", 0, 12.0, 10.0).bold()];
        let outline = classify(&lines);
        assert_eq!(outline.headings.page(0).unwrap()[0].text, "Chapter 1");
    }

    proptest! {
        #[test]
        fn prop_reserved_labels_never_become_headings(
            idx in 0usize..8,
            bold in any::<bool>(),
            size in 8.0f32..30.0,
        ) {
            let reserved = ["Name", "Date", "S.No", "Rs.", "Signature", "12", "1.", "AB"];
            let mut lines = body(0);
            lines.push(line(reserved[idx], 0, size, 500.0));
            if bold {
                lines.last_mut().unwrap().is_bold = true;
            }

            let outline = classify(&lines);
            let lowered = reserved[idx].to_lowercase();
            prop_assert!(outline.headings.entries().all(|h| h.text.to_lowercase() != lowered));
            prop_assert!(outline.title.as_deref().map(|t| t.to_lowercase() != lowered).unwrap_or(true));
        }
    }
}
