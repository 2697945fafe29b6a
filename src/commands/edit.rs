//! Editing a project's build list on disk.

use crate::build::{BuildEntry, BuildList, Direction};
use crate::rotation::Rotation;
use crate::session::Preview;
use crate::source::Source;
use anyhow::{Context, Result};
use std::path::Path;

fn load(project: &Path) -> Result<BuildList> {
    BuildList::load(project)
        .with_context(|| format!("Failed to load project: {}", project.display()))
}

fn save(project: &Path, list: &BuildList) -> Result<()> {
    list.save(project)
        .with_context(|| format!("Failed to save project: {}", project.display()))
}

/// Convert a 1-based position from the command line.
fn position(index: usize) -> Result<usize> {
    index
        .checked_sub(1)
        .context("Entry positions start at 1")
}

pub fn add<P: AsRef<Path>, Q: AsRef<Path>>(
    project: P,
    path: Q,
    range: &str,
    rotation: Rotation,
) -> Result<()> {
    let project = project.as_ref();
    let mut list = BuildList::load_or_default(project)
        .with_context(|| format!("Failed to load project: {}", project.display()))?;

    // Same checks as staging from a preview: the file must open and the
    // range must fit it.
    let preview = Preview::open(&path)?;
    let entry = BuildEntry::new(preview.source, range, rotation)?;
    if let Source::Document(_) = entry.source {
        entry.range.resolve(preview.pages.len())?;
    }

    println!("Added {}", entry.label());
    list.add(entry);
    save(project, &list)
}

pub fn list<P: AsRef<Path>>(project: P) -> Result<()> {
    let list = load(project.as_ref())?;

    if list.is_empty() {
        println!("Build list is empty.");
        return Ok(());
    }

    for (i, entry) in list.entries().iter().enumerate() {
        println!("{:>3}. {}", i + 1, entry.label());
    }
    Ok(())
}

pub fn move_entry<P: AsRef<Path>>(project: P, index: usize, direction: Direction) -> Result<()> {
    let project = project.as_ref();
    let mut list = load(project)?;
    let from = position(index)?;

    match list.move_entry(from, direction) {
        Some(to) => {
            println!("Moved entry {} to position {}", index, to + 1);
            save(project, &list)
        }
        None => {
            println!("Entry {} cannot move {:?}", index, direction);
            Ok(())
        }
    }
}

pub fn remove<P: AsRef<Path>>(project: P, index: usize) -> Result<()> {
    let project = project.as_ref();
    let mut list = load(project)?;
    let removed = list.remove(position(index)?)?;
    println!("Removed {}", removed.label());
    save(project, &list)
}

pub fn clear<P: AsRef<Path>>(project: P) -> Result<()> {
    let project = project.as_ref();
    let mut list = load(project)?;
    let count = list.len();
    list.clear();
    println!("Removed {} entr{}", count, if count == 1 { "y" } else { "ies" });
    save(project, &list)
}
