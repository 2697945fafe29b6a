//! Concatenating build entries into one output document.

use super::document::{existing_rotation, inherited_attribute, page_ids, PdfDocument, INHERITABLE};
use super::image_page::image_to_document;
use crate::build::BuildEntry;
use crate::error::{BuildError, Result};
use crate::rotation::Rotation;
use crate::source::Source;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub output: PathBuf,
    pub entries: usize,
    pub pages: usize,
}

/// Collects pages from any number of source documents under one page tree.
struct Assembler {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl Assembler {
    fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Assembler {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Append the pages at `indices` (0-based, in that order) from `source`,
    /// adding `rotation` on top of each page's own rotation.
    fn append(&mut self, mut source: Document, indices: &[usize], rotation: Rotation) -> Result<()> {
        source.renumber_objects_with(self.doc.max_id + 1);
        let source_pages = page_ids(&source);

        let mut selected: Vec<(ObjectId, Dictionary)> = Vec::with_capacity(indices.len());
        for &index in indices {
            let page_id = *source_pages.get(index).ok_or_else(|| {
                BuildError::invalid_range(
                    &(index + 1).to_string(),
                    format!("page {} exceeds total pages {}", index + 1, source_pages.len()),
                )
            })?;
            selected.push((page_id, detach_page(&source, page_id, rotation)?));
        }

        // Everything except the old page tree moves across; pages that were
        // not selected are dropped again by prune_objects in finish().
        let page_set: HashSet<ObjectId> = source_pages.into_iter().collect();
        for (id, object) in std::mem::take(&mut source.objects) {
            if page_set.contains(&id) {
                continue;
            }
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Outlines" | b"Outline" => {}
                _ => {
                    self.doc.objects.insert(id, object);
                }
            }
        }
        self.doc.max_id = self.doc.max_id.max(source.max_id);

        // A page selected twice needs its own object the second time.
        let mut placed = HashSet::new();
        for (page_id, mut dict) in selected {
            let id = if placed.insert(page_id) {
                page_id
            } else {
                self.doc.new_object_id()
            };
            dict.set("Parent", self.pages_id);
            self.doc.objects.insert(id, Object::Dictionary(dict));
            self.kids.push(id);
        }

        Ok(())
    }

    fn finish(mut self) -> Result<Document> {
        if self.kids.is_empty() {
            return Err(BuildError::EmptyBuild("selection resolves to zero pages"));
        }

        let count = self.kids.len() as i64;
        let kids: Vec<Object> = self.kids.into_iter().map(Object::Reference).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let pruned = self.doc.prune_objects();
        debug!(pruned = pruned.len(), "dropped unreferenced objects");
        self.doc.compress();
        Ok(self.doc)
    }
}

/// Copy a page dictionary out of its tree: inherited attributes become its
/// own and the relative rotation is folded into `/Rotate`.
fn detach_page(source: &Document, page_id: ObjectId, rotation: Rotation) -> Result<Dictionary> {
    let mut dict = source
        .get_dictionary(page_id)
        .map_err(|e| BuildError::source_read("page object", e))?
        .clone();

    for key in INHERITABLE {
        if !dict.has(key) {
            if let Some(value) = inherited_attribute(source, page_id, key) {
                dict.set(key.to_vec(), value);
            }
        }
    }

    match rotation.apply_to(existing_rotation(source, page_id)) {
        0 => {
            dict.remove(b"Rotate");
        }
        degrees => dict.set("Rotate", degrees),
    }
    Ok(dict)
}

/// Open an entry's source and work out which of its pages to take.
fn load_entry(entry: &BuildEntry) -> Result<(Document, Vec<usize>, Rotation)> {
    match &entry.source {
        // rotation is applied to the pixels, so the page itself stays upright
        Source::Image(path) => Ok((image_to_document(path, entry.rotation)?, vec![0], Rotation::None)),
        Source::Document(path) => {
            let pdf = PdfDocument::open(path)?;
            let indices = entry.range.resolve(pdf.page_count())?;
            Ok((pdf.doc, indices, entry.rotation))
        }
    }
}

/// Build the merged document for `entries`, in list order.
pub fn assemble(entries: &[BuildEntry]) -> Result<Document> {
    if entries.is_empty() {
        return Err(BuildError::EmptyBuild("build list is empty"));
    }

    let mut assembler = Assembler::new();
    for (i, entry) in entries.iter().enumerate() {
        let path = entry.source.path();
        let (doc, indices, rotation) =
            load_entry(entry).map_err(|e| e.in_entry(i + 1, path))?;
        debug!(
            entry = i + 1,
            path = %path.display(),
            pages = indices.len(),
            "appending entry"
        );
        assembler
            .append(doc, &indices, rotation)
            .map_err(|e| e.in_entry(i + 1, path))?;
    }
    assembler.finish()
}

/// Assemble `entries` and write the result to `output`, replacing any
/// existing file. Nothing is written unless the whole build succeeds.
pub fn export<P: AsRef<Path>>(entries: &[BuildEntry], output: P) -> Result<ExportSummary> {
    let output = output.as_ref();
    let mut doc = assemble(entries)?;
    let pages = doc.get_pages().len();

    save_atomically(&mut doc, output)?;

    info!(
        output = %output.display(),
        entries = entries.len(),
        pages,
        "export complete"
    );
    Ok(ExportSummary {
        output: output.to_path_buf(),
        entries: entries.len(),
        pages,
    })
}

/// Write to a temporary sibling, then rename over `output`.
fn save_atomically(doc: &mut Document, output: &Path) -> Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| BuildError::export_write(output, e))?;
    doc.save_to(&mut tmp)
        .map_err(|e| BuildError::export_write(output, e))?;
    tmp.persist(output)
        .map_err(|e| BuildError::export_write(output, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::testing::{labelled_pdf, page_labels, write_labelled_pdf};
    use crate::pdf::image_page::testing::write_png;
    use std::fs;

    fn doc_entry(path: &Path, range: &str, degrees: i64) -> BuildEntry {
        BuildEntry::new(
            Source::from_path(path).unwrap(),
            range,
            Rotation::from_degrees(degrees).unwrap(),
        )
        .unwrap()
    }

    fn rotations(doc: &Document) -> Vec<i64> {
        page_ids(doc)
            .into_iter()
            .map(|id| existing_rotation(doc, id))
            .collect()
    }

    #[test]
    fn test_explicit_ranges_keep_list_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        write_labelled_pdf(&a, &["a1", "a2", "a3"], (612, 792));
        write_labelled_pdf(&b, &["b1", "b2"], (612, 792));

        let doc = assemble(&[doc_entry(&a, "3,1", 0), doc_entry(&b, "2,1-2", 0)]).unwrap();
        assert_eq!(page_labels(&doc), vec!["a3", "a1", "b2", "b1", "b2"]);

        // the repeated page is a separate object
        let ids = page_ids(&doc);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 5);
    }

    #[test]
    fn test_all_uses_natural_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        write_labelled_pdf(&a, &["p1", "p2", "p3"], (612, 792));

        let doc = assemble(&[doc_entry(&a, "All", 0), doc_entry(&a, "2", 0)]).unwrap();
        assert_eq!(page_labels(&doc), vec!["p1", "p2", "p3", "p2"]);
    }

    #[test]
    fn test_rotation_is_relative_to_existing() {
        let dir = tempfile::tempdir().unwrap();
        let rotated = dir.path().join("rotated.pdf");
        labelled_pdf(&["r1", "r2"], (612, 792), Some(90))
            .save(&rotated)
            .unwrap();

        let doc = assemble(&[
            doc_entry(&rotated, "1", 270),
            doc_entry(&rotated, "2", 90),
            doc_entry(&rotated, "1", 0),
        ])
        .unwrap();
        assert_eq!(rotations(&doc), vec![0, 180, 90]);
    }

    #[test]
    fn test_inherited_attributes_survive() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        write_labelled_pdf(&a, &["x"], (300, 200));

        let doc = assemble(&[doc_entry(&a, "All", 0)]).unwrap();
        let page = doc.get_dictionary(page_ids(&doc)[0]).unwrap();
        assert!(page.has(b"Resources"));
        assert!(page.has(b"MediaBox"));
    }

    #[test]
    fn test_single_image_rotated_right() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("wide.png");
        write_png(&png, 40, 10);
        let out = dir.path().join("out.pdf");

        let summary = export(&[doc_entry(&png, "All", 90)], &out).unwrap();
        assert_eq!(summary.pages, 1);

        let info = PdfDocument::open(&out).unwrap().page_info(0).unwrap();
        assert_eq!((info.width, info.height, info.rotate), (10.0, 40.0, 0));
    }

    #[test]
    fn test_images_and_documents_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let png = dir.path().join("pic.png");
        write_labelled_pdf(&a, &["a1", "a2"], (612, 792));
        write_png(&png, 8, 8);

        let doc = assemble(&[
            doc_entry(&a, "2", 0),
            doc_entry(&png, "All", 0),
            doc_entry(&a, "1", 0),
        ])
        .unwrap();
        assert_eq!(page_labels(&doc), vec!["a2", "", "a1"]);
    }

    #[test]
    fn test_empty_build_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.pdf");
        let err = export(&[], &out).unwrap_err();
        assert!(matches!(err, BuildError::EmptyBuild(_)));
        assert!(!out.exists());
    }

    #[test]
    fn test_zero_page_build_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.pdf");
        write_labelled_pdf(&empty, &[], (612, 792));
        let out = dir.path().join("out.pdf");

        let err = export(&[doc_entry(&empty, "All", 0)], &out).unwrap_err();
        assert!(matches!(err, BuildError::EmptyBuild(_)));
        assert!(!out.exists());
    }

    #[test]
    fn test_failure_leaves_existing_output_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        write_labelled_pdf(&a, &["a1", "a2"], (612, 792));
        let out = dir.path().join("out.pdf");
        fs::write(&out, b"previous export").unwrap();

        let err = export(&[doc_entry(&a, "1", 0), doc_entry(&a, "5", 0)], &out).unwrap_err();
        assert!(matches!(err, BuildError::Entry { position: 2, .. }));
        assert!(matches!(err.root(), BuildError::InvalidRange { .. }));
        assert_eq!(fs::read(&out).unwrap(), b"previous export");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_missing_source_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = assemble(&[doc_entry(&dir.path().join("gone.pdf"), "All", 0)]).unwrap_err();
        assert!(matches!(err.root(), BuildError::SourceRead { .. }));
        assert!(err.to_string().starts_with("Entry 1 ("));
    }

    #[test]
    fn test_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        write_labelled_pdf(&a, &["a1"], (612, 792));

        let out = dir.path().join("no-such-dir").join("out.pdf");
        let err = export(&[doc_entry(&a, "All", 0)], &out).unwrap_err();
        assert!(matches!(err, BuildError::ExportWrite { .. }));
    }

    #[test]
    fn test_export_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        write_labelled_pdf(&a, &["a1", "a2"], (612, 792));
        let out = dir.path().join("Final_Project.pdf");
        fs::write(&out, b"stale").unwrap();

        let summary = export(&[doc_entry(&a, "2", 0)], &out).unwrap();
        assert_eq!(summary.pages, 1);
        let written = PdfDocument::open(&out).unwrap();
        assert_eq!(page_labels(&written.doc), vec!["a2"]);
    }
}
