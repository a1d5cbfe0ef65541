//! Chunk command

use crate::app::{ChunkArgs, OutputFormat};
use anyhow::Result;
use pdfsift_core::pipeline::file_name;
use pdfsift_core::{extract_sections, Config, LineExtractor, PdfLineExtractor};

pub async fn run(args: ChunkArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let kind = args.strategy.unwrap_or(config.chunking.strategy);
    let strategy = kind.build(&config.chunking);

    let lines = PdfLineExtractor::new().extract_file(&args.file)?;
    let doc = extract_sections(&file_name(&args.file), &lines, strategy.as_ref());

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&doc.sections)?);
        }
        OutputFormat::Cli => {
            for (i, section) in doc.sections.iter().enumerate() {
                let heading = if section.heading.is_empty() {
                    "(no heading)"
                } else {
                    section.heading.as_str()
                };
                println!("[{}] page {} | {}", i + 1, section.page, heading);
                println!("    {}", section.text);
            }
            println!("{} sections ({})", doc.sections.len(), kind);
        }
    }
    Ok(())
}
