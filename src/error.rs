use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors raised while resolving sources, page ranges, and exports.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A page range spec is malformed or points outside the document.
    #[error("Invalid page range '{spec}': {reason}")]
    InvalidRange { spec: String, reason: String },

    /// A source file or folder is missing, unreadable, or corrupt.
    #[error("Failed to read {}: {reason}", .path.display())]
    SourceRead { path: PathBuf, reason: String },

    /// The merged output could not be written.
    #[error("Failed to write {}: {reason}", .path.display())]
    ExportWrite { path: PathBuf, reason: String },

    #[error("Unsupported file type: {}", .path.display())]
    UnsupportedSource { path: PathBuf },

    #[error("Invalid rotation {0}: must be one of 0, 90, 180, 270")]
    InvalidRotation(i64),

    /// Nothing to export: the build list is empty or resolves to zero pages.
    #[error("Nothing to export: {0}")]
    EmptyBuild(&'static str),

    #[error("No source is open for preview")]
    NoPreview,

    #[error("Build entry {index} not found (list has {len} entries)")]
    NoSuchEntry { index: usize, len: usize },

    /// Failure attributed to a single build entry (1-based position).
    #[error("Entry {position} ({}): {source}", .path.display())]
    Entry {
        position: usize,
        path: PathBuf,
        #[source]
        source: Box<BuildError>,
    },

    #[error("Invalid project file {}: {reason}", .path.display())]
    Project { path: PathBuf, reason: String },
}

impl BuildError {
    pub fn invalid_range(spec: &str, reason: impl Into<String>) -> Self {
        BuildError::InvalidRange {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }

    pub fn source_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        BuildError::SourceRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn export_write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        BuildError::ExportWrite {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Attach the entry position and source path to an error.
    pub fn in_entry(self, position: usize, path: impl Into<PathBuf>) -> Self {
        BuildError::Entry {
            position,
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through entry wrappers.
    #[cfg(test)]
    pub fn root(&self) -> &BuildError {
        match self {
            BuildError::Entry { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_message_names_position_and_path() {
        let err = BuildError::invalid_range("9", "page 9 exceeds total pages 3")
            .in_entry(2, "scans/report.pdf");
        assert_eq!(
            err.to_string(),
            "Entry 2 (scans/report.pdf): Invalid page range '9': page 9 exceeds total pages 3"
        );
    }

    #[test]
    fn test_root_unwraps_entry() {
        let err = BuildError::NoPreview.in_entry(1, "a.pdf");
        assert!(matches!(err.root(), BuildError::NoPreview));
    }
}
