//! Ranked output assembly

use crate::chunk::char_len;
use crate::store::ScoredSection;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref LEADING_NUMBER: Regex = Regex::new(r"^[0-9]+\.?\s*").unwrap();
    static ref LEADING_LABEL: Regex = Regex::new(r"^[A-Z\s]+:").unwrap();
}

/// Candidate lines at or above this length are not titles
const MAX_TITLE_LINE_CHARS: usize = 100;

/// Length of the fallback title taken from the first sentence
const FALLBACK_TITLE_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub document: String,
    pub section_title: String,
    pub importance_rank: usize,
    pub page_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub refined_text: String,
    pub page_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMetadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    pub processing_timestamp: String,
}

/// Final result of a retrieval run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedOutput {
    pub metadata: OutputMetadata,
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
}

/// Query text embedded for a persona and job
pub fn build_query(persona: &str, job: &str) -> String {
    format!("Persona: {}. Job: {}", persona, job)
}

/// Keep up to `top_k` hits of at least `min_text_len` chars, in score order,
/// then backfill with shorter hits when too few qualify
pub fn select_hits(hits: Vec<ScoredSection>, top_k: usize, min_text_len: usize) -> Vec<ScoredSection> {
    let (long, short): (Vec<ScoredSection>, Vec<ScoredSection>) = hits
        .into_iter()
        .partition(|hit| char_len(&hit.section.text) >= min_text_len);

    let mut selected: Vec<ScoredSection> = long.into_iter().take(top_k).collect();
    let missing = top_k.saturating_sub(selected.len());
    selected.extend(short.into_iter().take(missing));
    selected
}

/// Derive a title from section text when no heading was associated
pub fn extract_section_title(text: &str) -> String {
    if text.is_empty() {
        return "Untitled Section".to_string();
    }

    for line in text.split('\n') {
        let line = line.trim();
        if line.is_empty() || char_len(line) >= MAX_TITLE_LINE_CHARS || line.ends_with('.') {
            continue;
        }
        let title = LEADING_NUMBER.replace(line, "");
        let title = LEADING_LABEL.replace(&title, "");
        let title = title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
    }

    let first_sentence = text.split('.').next().unwrap_or_default();
    let head: String = first_sentence.chars().take(FALLBACK_TITLE_CHARS).collect();
    format!("{}...", head)
}

/// Collapse whitespace and cut overly long text at sentence boundaries
pub fn refine_text(text: &str, limit: usize) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if char_len(&cleaned) <= limit {
        return cleaned;
    }

    let mut result = String::new();
    let mut result_len = 0;
    for sentence in cleaned.split('.') {
        let sentence_len = char_len(sentence);
        if result_len + sentence_len >= limit {
            break;
        }
        result.push_str(sentence);
        result.push('.');
        result_len += sentence_len + 1;
    }
    result.trim().to_string()
}

/// Turn selected hits into ranked sections and refined subsections
pub fn assemble_output(
    hits: &[ScoredSection],
    metadata: OutputMetadata,
    refined_text_limit: usize,
) -> RankedOutput {
    let extracted_sections = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            let section = &hit.section;
            let section_title = if section.heading.is_empty() {
                extract_section_title(&section.text)
            } else {
                section.heading.clone()
            };
            ExtractedSection {
                document: section.file.clone(),
                section_title,
                importance_rank: i + 1,
                page_number: section.page,
            }
        })
        .collect();

    let subsection_analysis = hits
        .iter()
        .map(|hit| SubsectionAnalysis {
            document: hit.section.file.clone(),
            refined_text: refine_text(&hit.section.text, refined_text_limit),
            page_number: hit.section.page,
        })
        .collect();

    RankedOutput {
        metadata,
        extracted_sections,
        subsection_analysis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::SectionRecord;
    use proptest::prelude::*;

    fn hit(text: &str, heading: &str, score: f32) -> ScoredSection {
        ScoredSection {
            section: SectionRecord {
                text: text.to_string(),
                page: 3,
                file: "guide.pdf".to_string(),
                heading: heading.to_string(),
            },
            score,
        }
    }

    #[test]
    fn test_build_query() {
        assert_eq!(
            build_query("HR professional", "Create onboarding forms"),
            "Persona: HR professional. Job: Create onboarding forms"
        );
    }

    #[test]
    fn test_select_prefers_long_then_backfills() {
        let long = "x".repeat(250);
        let hits = vec![
            hit("short one", "", 0.9),
            hit(&long, "", 0.8),
            hit("short two", "", 0.7),
            hit(&long, "", 0.6),
        ];
        let selected = select_hits(hits, 3, 200);
        let scores: Vec<f32> = selected.iter().map(|h| h.score).collect();
        assert_eq!(scores, vec![0.8, 0.6, 0.9]);
    }

    #[test]
    fn test_section_title_from_first_line() {
        assert_eq!(extract_section_title("2. Coastal Adventures\nMore text."), "Coastal Adventures");
        assert_eq!(extract_section_title("NOTE: Pack light"), "Pack light");
        assert_eq!(extract_section_title("Tips and Tricks"), "Tips and Tricks");
    }

    #[test]
    fn test_section_title_falls_back_to_first_sentence() {
        let text = "This sentence ends with a period.";
        assert_eq!(extract_section_title(text), "This sentence ends with a period...");

        let long = format!("{} tail", "word ".repeat(30));
        let title = extract_section_title(&long);
        assert_eq!(title.chars().count(), 53);
        assert!(title.ends_with("..."));
        assert_eq!(extract_section_title(""), "Untitled Section");
    }

    #[test]
    fn test_refine_collapses_whitespace() {
        assert_eq!(refine_text("  a \n b\t\tc  ", 1000), "a b c");
    }

    #[test]
    fn test_refine_cuts_long_text_at_sentences() {
        let text = "Aaaa aaaa. Bbbb bbbb. Cccc cccc.";
        // 32 chars > 25: "Aaaa aaaa" and " Bbbb bbbb" fit, " Cccc cccc" would reach 31
        assert_eq!(refine_text(text, 25), "Aaaa aaaa. Bbbb bbbb.");
    }

    #[test]
    fn test_heading_wins_over_derived_title() {
        let metadata = OutputMetadata {
            input_documents: vec!["guide.pdf".to_string()],
            persona: "p".to_string(),
            job_to_be_done: "j".to_string(),
            processing_timestamp: "t".to_string(),
        };
        let hits = vec![hit("Body text here.", "Nightlife", 0.9), hit("Markets", "", 0.5)];
        let output = assemble_output(&hits, metadata, 1000);

        assert_eq!(output.extracted_sections[0].section_title, "Nightlife");
        assert_eq!(output.extracted_sections[0].importance_rank, 1);
        assert_eq!(output.extracted_sections[1].section_title, "Markets");
        assert_eq!(output.extracted_sections[1].page_number, 3);
        assert_eq!(output.subsection_analysis[0].refined_text, "Body text here.");
    }

    proptest! {
        #[test]
        fn prop_select_respects_top_k(
            lens in prop::collection::vec(0usize..400, 0..20),
            top_k in 1usize..8,
        ) {
            let hits: Vec<ScoredSection> = lens
                .iter()
                .enumerate()
                .map(|(i, len)| hit(&"y".repeat(*len), "", 1.0 - i as f32 * 0.01))
                .collect();
            let total = hits.len();
            let selected = select_hits(hits, top_k, 200);

            prop_assert_eq!(selected.len(), top_k.min(total));
            let long_count = lens.iter().filter(|l| **l >= 200).count();
            for (i, h) in selected.iter().enumerate() {
                if i < long_count.min(top_k) {
                    prop_assert!(h.section.text.len() >= 200);
                } else {
                    prop_assert!(h.section.text.len() < 200);
                }
            }
        }

        #[test]
        fn prop_refined_text_within_limit(words in prop::collection::vec("[a-z]{1,10}\\.?", 0..300)) {
            let text = words.join(" ");
            let refined = refine_text(&text, 1000);
            prop_assert!(refined.chars().count() <= 1000);
        }
    }
}
