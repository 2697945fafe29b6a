use crate::source::scan_folder;
use anyhow::{Context, Result};
use std::path::Path;

pub fn run<P: AsRef<Path>>(folder: P) -> Result<()> {
    let folder = folder.as_ref();
    let sources = scan_folder(folder)
        .with_context(|| format!("Failed to scan folder: {}", folder.display()))?;

    if sources.is_empty() {
        println!("No PDFs or images found.");
        return Ok(());
    }

    for source in &sources {
        println!("{:<8} {}", source.kind(), source.path().display());
    }
    println!("\n{} source(s) found.", sources.len());

    Ok(())
}
