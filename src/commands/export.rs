use crate::build::BuildList;
use crate::pdf::assemble::export;
use anyhow::{Context, Result};
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(project: P, output: Q) -> Result<()> {
    let project = project.as_ref();
    let output = output.as_ref();

    let list = BuildList::load(project)
        .with_context(|| format!("Failed to load project: {}", project.display()))?;

    let summary = export(list.entries(), output)
        .with_context(|| format!("Failed to export {}", output.display()))?;

    println!(
        "Exported {} entr{} ({} pages) to {}",
        summary.entries,
        if summary.entries == 1 { "y" } else { "ies" },
        summary.pages,
        summary.output.display()
    );

    Ok(())
}
