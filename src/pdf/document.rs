use crate::error::{BuildError, Result};
use lopdf::{Document, Object, ObjectId};
use serde::Serialize;
use std::path::Path;

/// Page attributes a page may inherit from its ancestors in the page tree.
pub const INHERITABLE: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// US Letter, used when neither the page nor its ancestors carry a MediaBox.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

pub struct PdfDocument {
    pub doc: Document,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path).map_err(|e| BuildError::source_read(path, e))?;
        Ok(PdfDocument { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Page object IDs in natural page order.
    pub fn page_ids(&self) -> Vec<ObjectId> {
        page_ids(&self.doc)
    }

    /// Geometry and rotation of the page at a 0-based index.
    pub fn page_info(&self, index: usize) -> Result<PageInfo> {
        let ids = self.page_ids();
        let page_id = *ids.get(index).ok_or_else(|| {
            BuildError::invalid_range(
                &(index + 1).to_string(),
                format!("page {} exceeds total pages {}", index + 1, ids.len()),
            )
        })?;

        let media_box = inherited_attribute(&self.doc, page_id, b"MediaBox")
            .and_then(|obj| rect(&self.doc, &obj))
            .unwrap_or(DEFAULT_MEDIA_BOX);

        Ok(PageInfo {
            number: index + 1,
            width: (media_box[2] - media_box[0]).abs(),
            height: (media_box[3] - media_box[1]).abs(),
            rotate: existing_rotation(&self.doc, page_id),
        })
    }
}

/// Size of a page in points and its own `/Rotate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageInfo {
    pub number: usize,
    pub width: f32,
    pub height: f32,
    pub rotate: i64,
}

pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    // get_pages is keyed by 1-based page number, so values come out in order
    doc.get_pages().into_values().collect()
}

/// Look up `key` on a page, walking up `/Parent` links when it is inherited.
pub fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    // Bounded walk; malformed files can contain parent cycles.
    for _ in 0..64 {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// The page's effective `/Rotate`, normalised into [0, 360).
pub fn existing_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|obj| resolve(doc, &obj).as_i64().ok())
        .map(|deg| deg.rem_euclid(360))
        .unwrap_or(0)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn rect(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let values = resolve(doc, obj).as_array().ok()?;
    if values.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = resolve(doc, value).as_float().ok()?;
    }
    Some(out)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_page_info_inherits_from_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.pdf");
        labelled_pdf(&["a", "b"], (842, 595), Some(450)).save(&path).unwrap();

        let doc = PdfDocument::open(&path).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(
            doc.page_info(1).unwrap(),
            PageInfo {
                number: 2,
                width: 842.0,
                height: 595.0,
                rotate: 90,
            }
        );
        assert!(matches!(
            doc.page_info(2),
            Err(BuildError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = PdfDocument::open(dir.path().join("nope.pdf"));
        assert!(matches!(result, Err(BuildError::SourceRead { .. })));
    }

    #[test]
    fn test_open_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();
        assert!(matches!(
            PdfDocument::open(&path),
            Err(BuildError::SourceRead { .. })
        ));
    }

    #[test]
    fn test_page_labels_helper() {
        let doc = labelled_pdf(&["one", "two", "three"], (612, 792), None);
        assert_eq!(page_labels(&doc), vec!["one", "two", "three"]);
    }
}
