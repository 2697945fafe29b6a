use crate::cli::ResolveTarget;
use crate::page_range::{resolve_page_ranges, RangeSpec};
use crate::session::Preview;
use anyhow::Result;

pub fn run(range: &str, target: &ResolveTarget) -> Result<()> {
    // syntax errors are reported before any file is opened
    RangeSpec::parse(range)?;

    let total = match (&target.count, &target.source) {
        (Some(count), _) => *count,
        (None, Some(path)) => Preview::open(path)?.page_count(),
        (None, None) => anyhow::bail!("Specify --count or --source"),
    };

    let pages: Vec<String> = resolve_page_ranges(range, total)?
        .into_iter()
        .map(|index| (index + 1).to_string())
        .collect();

    println!("{}", pages.join(","));
    Ok(())
}

