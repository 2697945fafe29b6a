use crate::error::{BuildError, Result};
use crate::page_range::{RangeSpec, ALL};
use crate::rotation::Rotation;
use crate::source::Source;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// A staged selection: which source, which pages, and how to rotate them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEntry {
    pub source: Source,
    pub range: RangeSpec,
    pub rotation: Rotation,
}

impl BuildEntry {
    pub fn new(source: Source, range: &str, rotation: Rotation) -> Result<Self> {
        Ok(BuildEntry {
            source,
            range: RangeSpec::parse(range)?,
            rotation,
        })
    }

    /// One-line summary, e.g. "scan.pdf | Pgs: 1,3-5 | Rot: 90".
    pub fn label(&self) -> String {
        format!(
            "{} | Pgs: {} | Rot: {}",
            self.source.file_name(),
            self.range,
            self.rotation
        )
    }

    fn to_record(&self) -> EntryRecord {
        EntryRecord {
            path: self.source.path().to_path_buf(),
            range: self.range.to_string(),
            rotation: self.rotation,
        }
    }

    fn from_record(record: EntryRecord) -> Result<Self> {
        let source = Source::from_path(&record.path)?;
        BuildEntry::new(source, &record.range, record.rotation)
    }
}

/// On-disk form of a build entry.
#[derive(Debug, Serialize, Deserialize)]
struct EntryRecord {
    path: PathBuf,
    #[serde(default = "default_range")]
    range: String,
    #[serde(default)]
    rotation: Rotation,
}

fn default_range() -> String {
    ALL.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(format!("expected 'up' or 'down', got '{}'", other)),
        }
    }
}

/// The ordered list of entries that an export concatenates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildList {
    entries: Vec<BuildEntry>,
}

impl BuildList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[BuildEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, entry: BuildEntry) {
        debug!(entry = %entry.label(), "adding build entry");
        self.entries.push(entry);
    }

    /// Remove the entry at a 0-based index.
    pub fn remove(&mut self, index: usize) -> Result<BuildEntry> {
        if index >= self.entries.len() {
            return Err(BuildError::NoSuchEntry {
                index: index + 1,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Swap the entry at `index` with its neighbour. Returns the new index,
    /// or `None` when the move would leave the list.
    pub fn move_entry(&mut self, index: usize, direction: Direction) -> Option<usize> {
        let target = match direction {
            Direction::Up => index.checked_sub(1)?,
            Direction::Down => index + 1,
        };
        if index >= self.entries.len() || target >= self.entries.len() {
            return None;
        }
        self.entries.swap(index, target);
        Some(target)
    }

    pub fn to_json(&self) -> Result<String> {
        let records: Vec<EntryRecord> = self.entries.iter().map(BuildEntry::to_record).collect();
        serde_json::to_string_pretty(&records).map_err(|e| BuildError::Project {
            path: PathBuf::new(),
            reason: e.to_string(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<EntryRecord> = serde_json::from_str(json).map_err(|e| BuildError::Project {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?;
        let entries = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                let path = record.path.clone();
                BuildEntry::from_record(record).map_err(|e| e.in_entry(i + 1, path))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(BuildList { entries })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| BuildError::source_read(path, e))?;
        Self::from_json(&json).map_err(|e| match e {
            BuildError::Project { reason, .. } => BuildError::Project {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Load a project file, starting empty when it does not exist yet.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        fs::write(path, json + "\n").map_err(|e| BuildError::export_write(path, e))
    }
}
