//! Outline command

use crate::app::{OutlineArgs, OutputFormat};
use anyhow::Result;
use pdfsift_core::{classify, LineExtractor, PdfLineExtractor};

pub async fn run(args: OutlineArgs, format: OutputFormat) -> Result<()> {
    let lines = PdfLineExtractor::new().extract_file(&args.file)?;
    let outline = classify(&lines);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outline)?);
        }
        OutputFormat::Cli => {
            println!("Title: {}", outline.title.as_deref().unwrap_or("-"));
            for heading in outline.headings.entries() {
                println!(
                    "  p{:<4} {:<3} {}",
                    heading.page + 1,
                    heading.level.as_str(),
                    heading.text
                );
            }
            if outline.headings.is_empty() {
                println!("No headings found");
            }
        }
    }
    Ok(())
}
