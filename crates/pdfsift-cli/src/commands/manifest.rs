//! Manifest command

use crate::app::ManifestArgs;
use anyhow::Result;
use pdfsift_core::pipeline::{generate_input_manifest, write_json, INPUT_FILE_NAME};
use pdfsift_core::RunRequest;

pub async fn run(args: ManifestArgs) -> Result<()> {
    let manifest =
        generate_input_manifest(&args.docs_dir, &args.persona, &args.job, chrono::Local::now())?;

    let path = match args.output {
        Some(path) => path,
        None => RunRequest::new(&args.docs_dir, &args.persona, &args.job)
            .work_dir()?
            .join(INPUT_FILE_NAME),
    };
    write_json(&path, &manifest)?;

    println!(
        "Generated {} with {} documents",
        path.display(),
        manifest.documents.len()
    );
    Ok(())
}
