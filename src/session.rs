//! Interactive state: the source being previewed, its rotation, and the
//! build list that selections are staged into.

use crate::build::{BuildEntry, BuildList, Direction};
use crate::error::{BuildError, Result};
use crate::page_range::{normalize, RangeSpec};
use crate::pdf::assemble::{export, ExportSummary};
use crate::pdf::document::PageInfo;
use crate::pdf::image_page;
use crate::pdf::PdfDocument;
use crate::rotation::Rotation;
use crate::source::Source;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_OUTPUT: &str = "Final_Project.pdf";

/// A source opened for preview, with the geometry of each of its pages.
#[derive(Debug, Clone)]
pub struct Preview {
    pub source: Source,
    pub pages: Vec<PageInfo>,
}

impl Preview {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = Source::from_path(path)?;
        let pages = match &source {
            Source::Document(path) => {
                let pdf = PdfDocument::open(path)?;
                (0..pdf.page_count())
                    .map(|i| pdf.page_info(i))
                    .collect::<Result<Vec<_>>>()?
            }
            Source::Image(path) => {
                let (width, height) = image_page::dimensions(path)?;
                vec![PageInfo {
                    number: 1,
                    width: width as f32,
                    height: height as f32,
                    rotate: 0,
                }]
            }
        };
        Ok(Preview { source, pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// What the preview currently shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewPage {
    pub path: String,
    pub kind: &'static str,
    pub page: usize,
    pub page_count: usize,
    pub width: f32,
    pub height: f32,
    pub page_rotation: i64,
    pub rotation: i64,
    pub orientation: Orientation,
}

#[derive(Debug)]
pub struct Session {
    preview: Option<Preview>,
    page_index: usize,
    rotation: Rotation,
    build: BuildList,
    status: String,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            preview: None,
            page_index: 0,
            rotation: Rotation::None,
            build: BuildList::new(),
            status: "Ready".to_string(),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn build(&self) -> &BuildList {
        &self.build
    }

    pub fn replace_build(&mut self, build: BuildList) {
        self.build = build;
    }

    /// Record the outcome of an action as the status line.
    fn track<T>(&mut self, result: Result<T>, done: impl FnOnce(&T) -> String) -> Result<T> {
        match &result {
            Ok(value) => self.status = done(value),
            Err(e) => {
                warn!(error = %e, "action failed");
                self.status = format!("Error: {}", e);
            }
        }
        result
    }

    /// Open a source for preview. Rotation and page position start over.
    /// On failure the previous preview stays in place.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<PreviewPage> {
        let result = Preview::open(path).map(|preview| {
            self.preview = Some(preview);
            self.page_index = 0;
            self.rotation = Rotation::None;
        });
        self.track(result, |_| "Preview loaded".to_string())?;
        self.current_page()
    }

    /// Step through pages; moves past either end are ignored.
    pub fn change_page(&mut self, delta: isize) -> Result<PreviewPage> {
        let count = self.preview.as_ref().ok_or(BuildError::NoPreview)?.page_count();
        if let Some(next) = self.page_index.checked_add_signed(delta) {
            if next < count {
                self.page_index = next;
            }
        }
        self.current_page()
    }

    /// Rotate the preview a further 90° clockwise.
    pub fn rotate(&mut self) -> Rotation {
        self.rotation = self.rotation.rotated();
        self.rotation
    }

    pub fn current_page(&self) -> Result<PreviewPage> {
        let preview = self.preview.as_ref().ok_or(BuildError::NoPreview)?;
        let info = preview
            .pages
            .get(self.page_index)
            .ok_or_else(|| BuildError::source_read(preview.source.path(), "document has no pages"))?;
        let turned = (self.rotation.apply_to(info.rotate) / 90) % 2 == 1;
        let (width, height) = if turned {
            (info.height, info.width)
        } else {
            (info.width, info.height)
        };

        Ok(PreviewPage {
            path: preview.source.path().display().to_string(),
            kind: preview.source.kind(),
            page: info.number,
            page_count: preview.page_count(),
            width: info.width,
            height: info.height,
            page_rotation: info.rotate,
            rotation: self.rotation.degrees(),
            orientation: if width > height {
                Orientation::Landscape
            } else {
                Orientation::Portrait
            },
        })
    }

    /// Stage the previewed source with `range` and the current rotation.
    /// An empty range means every page.
    pub fn add_to_build(&mut self, range: &str) -> Result<BuildEntry> {
        let result = self.entry_for(range);
        let entry = self.track(result, |_| "Added to queue".to_string())?;
        self.build.add(entry.clone());
        Ok(entry)
    }

    fn entry_for(&self, range: &str) -> Result<BuildEntry> {
        let preview = self.preview.as_ref().ok_or(BuildError::NoPreview)?;
        let range = normalize(range);
        if let Source::Document(_) = preview.source {
            RangeSpec::parse(&range)?.resolve(preview.page_count())?;
        }
        BuildEntry::new(preview.source.clone(), &range, self.rotation)
    }

    /// Move the entry at a 0-based index; returns its new index if it moved.
    pub fn move_entry(&mut self, index: usize, direction: Direction) -> Option<usize> {
        self.build.move_entry(index, direction)
    }

    pub fn remove_entry(&mut self, index: usize) -> Result<BuildEntry> {
        let result = self.build.remove(index);
        self.track(result, |e| format!("Removed {}", e.source.file_name()))
    }

    pub fn clear_build(&mut self) {
        self.build.clear();
        self.status = "Build list cleared".to_string();
    }

    /// Export the build list. Failures become the status line and nothing is
    /// written.
    pub fn export<P: AsRef<Path>>(&mut self, output: P) -> Result<ExportSummary> {
        self.status = "Building PDF...".to_string();
        info!(entries = self.build.len(), "starting export");
        let result = export(self.build.entries(), output);
        self.track(result, |_| "Export complete".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::testing::{labelled_pdf, page_labels, write_labelled_pdf};
    use crate::pdf::image_page::testing::write_png;

    #[test]
    fn test_actions_need_a_preview() {
        let mut session = Session::new();
        assert_eq!(session.status(), "Ready");
        assert!(matches!(session.current_page(), Err(BuildError::NoPreview)));
        assert!(matches!(session.add_to_build("1"), Err(BuildError::NoPreview)));
        assert_eq!(session.status(), "Error: No source is open for preview");
        assert!(session.build().is_empty());
    }

    #[test]
    fn test_open_and_navigate() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        write_labelled_pdf(&a, &["1", "2", "3"], (612, 792));

        let mut session = Session::new();
        let page = session.open(&a).unwrap();
        assert_eq!((page.page, page.page_count, page.kind), (1, 3, "document"));

        assert_eq!(session.change_page(-1).unwrap().page, 1);
        assert_eq!(session.change_page(1).unwrap().page, 2);
        assert_eq!(session.change_page(1).unwrap().page, 3);
        assert_eq!(session.change_page(1).unwrap().page, 3);
    }

    #[test]
    fn test_rotation_resets_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("wide.png");
        write_png(&png, 40, 10);

        let mut session = Session::new();
        let page = session.open(&png).unwrap();
        assert_eq!(page.orientation, Orientation::Landscape);

        session.rotate();
        let page = session.current_page().unwrap();
        assert_eq!((page.rotation, page.orientation), (90, Orientation::Portrait));

        for _ in 0..3 {
            session.rotate();
        }
        assert_eq!(session.current_page().unwrap().rotation, 0);

        session.rotate();
        assert_eq!(session.open(&png).unwrap().rotation, 0);
    }

    #[test]
    fn test_orientation_includes_page_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        labelled_pdf(&["x"], (612, 792), Some(90)).save(&a).unwrap();

        let mut session = Session::new();
        let page = session.open(&a).unwrap();
        assert_eq!(page.page_rotation, 90);
        assert_eq!(page.orientation, Orientation::Landscape);
    }

    #[test]
    fn test_failed_open_keeps_previous_preview() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        write_labelled_pdf(&a, &["1"], (612, 792));

        let mut session = Session::new();
        session.open(&a).unwrap();
        assert!(session.open(dir.path().join("missing.pdf")).is_err());
        assert!(session.status().starts_with("Error: Failed to read"));
        assert_eq!(session.current_page().unwrap().path, a.display().to_string());
    }

    #[test]
    fn test_add_validates_against_page_count() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        write_labelled_pdf(&a, &["1", "2"], (612, 792));

        let mut session = Session::new();
        session.open(&a).unwrap();
        assert!(matches!(
            session.add_to_build("3"),
            Err(BuildError::InvalidRange { .. })
        ));
        assert!(session.build().is_empty());

        session.rotate();
        let entry = session.add_to_build(" 2, 1 ").unwrap();
        assert_eq!(entry.label(), "a.pdf | Pgs: 2,1 | Rot: 90");
        assert_eq!(session.add_to_build("").unwrap().range, RangeSpec::All);
        assert_eq!(session.status(), "Added to queue");
        assert_eq!(session.build().len(), 2);
    }

    #[test]
    fn test_full_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        write_labelled_pdf(&a, &["a1", "a2", "a3"], (612, 792));
        write_labelled_pdf(&b, &["b1", "b2"], (612, 792));

        let mut session = Session::new();
        session.open(&a).unwrap();
        session.add_to_build("1-2").unwrap();
        session.open(&b).unwrap();
        session.add_to_build("2").unwrap();
        session.open(&a).unwrap();
        session.add_to_build("3").unwrap();

        assert_eq!(session.move_entry(1, Direction::Up), Some(0));
        session.remove_entry(2).unwrap();

        let out = dir.path().join(DEFAULT_OUTPUT);
        let summary = session.export(&out).unwrap();
        assert_eq!(summary.pages, 3);
        assert_eq!(session.status(), "Export complete");

        let written = PdfDocument::open(&out).unwrap();
        assert_eq!(page_labels(&written.doc), vec!["b2", "a1", "a2"]);

        session.clear_build();
        assert!(session.export(&out).is_err());
        assert!(session.status().starts_with("Error: Nothing to export"));
    }
}
