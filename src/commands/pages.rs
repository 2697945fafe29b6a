use crate::session::Preview;
use crate::source::Source;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let preview = Preview::open(&path)?;

    println!("File: {}", path.as_ref().display());
    println!("Kind: {}", preview.source.kind());
    println!("Pages: {}", preview.page_count());

    let unit = match preview.source {
        Source::Document(_) => "pt",
        Source::Image(_) => "px",
    };
    for page in &preview.pages {
        let rotate = if page.rotate != 0 {
            format!(" (rotated {})", page.rotate)
        } else {
            String::new()
        };
        println!(
            "  p{}: {} x {} {}{}",
            page.number, page.width, page.height, unit, rotate
        );
    }

    Ok(())
}
