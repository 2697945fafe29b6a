use crate::error::{BuildError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tiff"];

/// A source file, tagged by how it is assembled. The kind is decided once,
/// from the extension, when the source is first seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum Source {
    Document(PathBuf),
    Image(PathBuf),
}

impl Source {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase());

        match ext.as_deref() {
            Some(ext) if DOCUMENT_EXTENSIONS.contains(&ext) => Ok(Source::Document(path.into())),
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => Ok(Source::Image(path.into())),
            _ => Err(BuildError::UnsupportedSource { path: path.into() }),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Source::Document(path) | Source::Image(path) => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Source::Document(_) => "document",
            Source::Image(_) => "image",
        }
    }

    /// File name for display, falling back to the full path.
    pub fn file_name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path().display().to_string())
    }
}

/// List the supported files directly inside `folder`, sorted by name.
pub fn scan_folder<P: AsRef<Path>>(folder: P) -> Result<Vec<Source>> {
    let folder = folder.as_ref();
    if !folder.is_dir() {
        return Err(BuildError::source_read(folder, "not a directory"));
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| BuildError::source_read(folder, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        match Source::from_path(entry.path()) {
            Ok(source) => sources.push(source),
            Err(_) => debug!(path = %entry.path().display(), "skipping unsupported file"),
        }
    }

    Ok(sources)
}
