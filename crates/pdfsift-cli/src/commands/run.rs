//! Run command

use crate::app::RunArgs;
use anyhow::Result;
use pdfsift_core::{Config, PipelineContext, RunRequest};

pub async fn run(args: RunArgs, mut config: Config) -> Result<()> {
    if let Some(top_k) = args.top_k {
        config.retrieval.top_k = top_k;
    }
    if let Some(strategy) = args.strategy {
        config.chunking.strategy = strategy;
    }
    if let Some(store) = args.store {
        config.store.backend = store;
    }

    let context = PipelineContext::from_config(config)?;
    let request = RunRequest {
        docs_dir: args.docs_dir,
        persona: args.persona,
        job: args.job,
        output: args.output,
    };

    let summary = context.run(&request).await?;

    for failure in &summary.failures {
        eprintln!("Skipped {}: {}", failure.file, failure.error);
    }
    println!("Generated {}", summary.input_path.display());
    println!(
        "Ranked {} of {} sections",
        summary.output.extracted_sections.len(),
        summary.indexed_sections
    );
    println!("Generated {}", summary.output_path.display());
    Ok(())
}
