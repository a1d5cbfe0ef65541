//! Input manifest describing a retrieval run

use crate::error::{Result, SiftError};
use chrono::{DateTime, Local};
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeInfo {
    pub challenge_id: String,
    pub test_case_name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub filename: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaInfo {
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    pub task: String,
}

/// Documents, persona and job of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputManifest {
    pub challenge_info: ChallengeInfo,
    pub documents: Vec<DocumentEntry>,
    pub persona: PersonaInfo,
    pub job_to_be_done: JobInfo,
}

/// PDF files directly inside `docs_dir`, sorted by file name
pub fn list_pdfs(docs_dir: &Path) -> Result<Vec<PathBuf>> {
    if !docs_dir.is_dir() {
        return Err(SiftError::DocumentNotFound(format!(
            "Documents directory not found: {}",
            docs_dir.display()
        )));
    }

    let pattern = Pattern::new("*.pdf")?;
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let mut pdfs = Vec::new();
    for entry in WalkDir::new(docs_dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if pattern.matches_with(&name, options) {
            pdfs.push(entry.into_path());
        }
    }
    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(pdfs)
}

/// File name component as a string
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Build the manifest for every PDF in `docs_dir`
pub fn generate_input_manifest(
    docs_dir: &Path,
    persona: &str,
    job: &str,
    now: DateTime<Local>,
) -> Result<InputManifest> {
    let documents: Vec<DocumentEntry> = list_pdfs(docs_dir)?
        .iter()
        .map(|path| {
            let filename = file_name(path);
            DocumentEntry {
                title: filename.replace(".pdf", ""),
                filename,
            }
        })
        .collect();

    tracing::info!("Manifest lists {} documents", documents.len());

    Ok(InputManifest {
        challenge_info: ChallengeInfo {
            challenge_id: format!("round_1b_{}", now.format("%m%d_%H%M")),
            test_case_name: persona.to_string(),
            description: job.to_string(),
        },
        documents,
        persona: PersonaInfo {
            role: persona.to_string(),
        },
        job_to_be_done: JobInfo {
            task: job.to_string(),
        },
    })
}

/// Write a value as JSON indented by four spaces
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    std::fs::write(path, buf)?;
    Ok(())
}
