//! Retrieval pipeline
//!
//! Generates the input manifest, chunks every PDF in parallel, embeds and
//! indexes the sections, then ranks them for a persona and job.

mod manifest;
mod output;
mod runner;

pub use manifest::{
    file_name, generate_input_manifest, list_pdfs, write_json, ChallengeInfo, DocumentEntry,
    InputManifest, JobInfo, PersonaInfo,
};
pub use output::{
    assemble_output, build_query, extract_section_title, refine_text, select_hits,
    ExtractedSection, OutputMetadata, RankedOutput, SubsectionAnalysis,
};
pub use runner::{
    ChunkReport, DocumentFailure, PipelineContext, RunRequest, RunSummary, INPUT_FILE_NAME,
    OUTPUT_FILE_NAME,
};
