//! End-to-end retrieval run

use super::manifest::{file_name, generate_input_manifest, list_pdfs, write_json};
use super::output::{assemble_output, build_query, select_hits, OutputMetadata, RankedOutput};
use crate::chunk::ChunkingStrategy;
use crate::config::Config;
use crate::error::{Result, SiftError};
use crate::extract::{LineExtractor, PdfLineExtractor};
use crate::llm::{Embedder, HttpEmbedder};
use crate::section::{extract_sections, DocumentSections, SectionRecord};
use crate::store::{open_store, IndexedSection, ScoredSection, VectorStore};
use chrono::Local;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Manifest file written next to the documents directory
pub const INPUT_FILE_NAME: &str = "challenge1b_input.json";

/// Result file written next to the documents directory
pub const OUTPUT_FILE_NAME: &str = "challenge1b_output.json";

/// Parameters of one run
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub docs_dir: PathBuf,
    pub persona: String,
    pub job: String,
    /// Output path; defaults to the parent of `docs_dir`
    pub output: Option<PathBuf>,
}

impl RunRequest {
    pub fn new(docs_dir: impl Into<PathBuf>, persona: &str, job: &str) -> Self {
        Self {
            docs_dir: docs_dir.into(),
            persona: persona.to_string(),
            job: job.to_string(),
            output: None,
        }
    }

    /// Directory receiving the manifest and default output
    pub fn work_dir(&self) -> Result<PathBuf> {
        let docs_dir = self.docs_dir.canonicalize().map_err(|e| {
            SiftError::DocumentNotFound(format!("{}: {}", self.docs_dir.display(), e))
        })?;
        Ok(docs_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(docs_dir))
    }
}

/// A document that could not be chunked
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFailure {
    pub file: String,
    pub error: String,
}

/// Sections of every successfully processed document, in input order
#[derive(Debug, Clone, Default)]
pub struct ChunkReport {
    pub documents: Vec<(String, DocumentSections)>,
    pub failures: Vec<DocumentFailure>,
}

impl ChunkReport {
    pub fn sections(&self) -> impl Iterator<Item = &SectionRecord> {
        self.documents.iter().flat_map(|(_, doc)| doc.sections.iter())
    }

    pub fn into_sections(self) -> Vec<SectionRecord> {
        self.documents
            .into_iter()
            .flat_map(|(_, doc)| doc.sections)
            .collect()
    }
}

/// What a run produced and where it was written
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: RankedOutput,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub indexed_sections: usize,
    pub failures: Vec<DocumentFailure>,
}

/// Everything one run needs; constructed once and passed down
pub struct PipelineContext {
    config: Config,
    embedder: Box<dyn Embedder>,
    store: Box<dyn VectorStore>,
    strategy: Arc<dyn ChunkingStrategy>,
    extractor: Arc<dyn LineExtractor>,
}

impl PipelineContext {
    pub fn new(config: Config, embedder: Box<dyn Embedder>, store: Box<dyn VectorStore>) -> Self {
        let strategy: Arc<dyn ChunkingStrategy> =
            Arc::from(config.chunking.strategy.build(&config.chunking));
        Self {
            config,
            embedder,
            store,
            strategy,
            extractor: Arc::new(PdfLineExtractor::new()),
        }
    }

    /// HTTP embedder and configured store backend
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let embedder = HttpEmbedder::new(config.embedding.clone())?;
        let store = open_store(&config.store, &config.retrieval.collection)?;
        Ok(Self::new(config, Box::new(embedder), store))
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn LineExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }

    /// Extract and chunk documents on blocking workers.
    ///
    /// A document that fails is logged and left out; the rest proceed.
    pub async fn chunk_documents(&self, paths: &[PathBuf]) -> ChunkReport {
        let workers = self.config.workers.max(1);

        let mut results: Vec<(usize, String, Result<DocumentSections>)> =
            stream::iter(paths.iter().cloned().enumerate())
                .map(|(idx, path)| {
                    let extractor = Arc::clone(&self.extractor);
                    let strategy = Arc::clone(&self.strategy);
                    async move {
                        let name = file_name(&path);
                        let task_name = name.clone();
                        let result = tokio::task::spawn_blocking(move || -> Result<DocumentSections> {
                            let lines = extractor.extract_file(&path)?;
                            Ok(extract_sections(&task_name, &lines, strategy.as_ref()))
                        })
                        .await
                        .unwrap_or_else(|e| {
                            Err(SiftError::Other(anyhow::anyhow!("Chunking task failed: {}", e)))
                        });
                        (idx, name, result)
                    }
                })
                .buffer_unordered(workers)
                .collect()
                .await;
        results.sort_by_key(|(idx, _, _)| *idx);

        let mut report = ChunkReport::default();
        for (_, name, result) in results {
            match result {
                Ok(doc) => {
                    tracing::debug!("{}: {} sections", name, doc.sections.len());
                    report.documents.push((name, doc));
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", name, e);
                    report.failures.push(DocumentFailure {
                        file: name,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Chunked {} documents into {} sections ({} failed)",
            report.documents.len(),
            report.sections().count(),
            report.failures.len()
        );
        report
    }

    /// Embed sections in batches and store them with ids 0..n
    pub async fn index_sections(&self, sections: Vec<SectionRecord>) -> Result<usize> {
        if sections.is_empty() {
            return Ok(0);
        }

        let batch_size = self.config.embedding.batch_size.max(1);
        let total = sections.len();
        let mut next_id = 0u64;

        for batch in sections.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|s| s.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(SiftError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }

            let points = batch
                .iter()
                .zip(vectors)
                .map(|(section, vector)| {
                    let point = IndexedSection {
                        id: next_id,
                        vector,
                        section: section.clone(),
                    };
                    next_id += 1;
                    point
                })
                .collect();
            self.store.upsert(points)?;
            tracing::debug!("Indexed {}/{} sections", next_id, total);
        }

        tracing::info!(
            "Indexed {} sections with {}",
            total,
            self.embedder.model_name()
        );
        Ok(total)
    }

    /// Ranked hits for a persona and job, after length filtering
    pub async fn retrieve(&self, persona: &str, job: &str) -> Result<Vec<ScoredSection>> {
        let retrieval = &self.config.retrieval;
        let query = build_query(persona, job);
        let vector = self.embedder.embed(&query).await?;

        let limit = retrieval.top_k.saturating_mul(retrieval.oversample.max(1));
        let hits = self.store.search(&vector, limit)?;
        tracing::debug!("Query returned {} candidates", hits.len());

        Ok(select_hits(hits, retrieval.top_k, retrieval.min_text_len))
    }

    /// Full run: manifest, chunking, indexing, retrieval, output
    pub async fn run(&self, request: &RunRequest) -> Result<RunSummary> {
        let work_dir = request.work_dir()?;
        let now = Local::now();

        let manifest =
            generate_input_manifest(&request.docs_dir, &request.persona, &request.job, now)?;
        let input_path = work_dir.join(INPUT_FILE_NAME);
        write_json(&input_path, &manifest)?;
        tracing::info!("Wrote {}", input_path.display());

        let paths = list_pdfs(&request.docs_dir)?;
        let report = self.chunk_documents(&paths).await;
        let failures = report.failures.clone();

        self.store.clear()?;
        let indexed_sections = self.index_sections(report.into_sections()).await?;

        let hits = if indexed_sections == 0 {
            tracing::warn!("No sections to search");
            Vec::new()
        } else {
            self.retrieve(&request.persona, &request.job).await?
        };

        let metadata = OutputMetadata {
            input_documents: paths.iter().map(|p| file_name(p)).collect(),
            persona: request.persona.clone(),
            job_to_be_done: request.job.clone(),
            processing_timestamp: now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        };
        let output = assemble_output(&hits, metadata, self.config.retrieval.refined_text_limit);

        let output_path = request
            .output
            .clone()
            .unwrap_or_else(|| work_dir.join(OUTPUT_FILE_NAME));
        write_json(&output_path, &output)?;
        tracing::info!("Wrote {}", output_path.display());

        Ok(RunSummary {
            output,
            input_path,
            output_path,
            indexed_sections,
            failures,
        })
    }
}
