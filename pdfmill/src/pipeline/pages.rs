//! Page tree plumbing shared by the pipelines.
//!
//! An [`OutputDocument`] starts as a bare catalog plus an empty page tree
//! and grows one page at a time, either by copying pages out of a loaded
//! source or by appending freshly built page dictionaries. The page tree is
//! flat: every page hangs directly off the root `Pages` node.

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use tracing::trace;

use crate::error::{PdfMillError, Result};

/// PDF version written into new documents.
pub const OUTPUT_PDF_VERSION: &str = "1.7";

/// Page attributes a page may inherit from its ancestors in the tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Upper bound on page tree depth when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 64;

/// A document under construction.
#[derive(Debug)]
pub struct OutputDocument {
    doc: Document,
    catalog_id: ObjectId,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl OutputDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::with_reserved_ids(0)
    }

    /// Create an empty document whose own objects are numbered above
    /// `reserved`.
    ///
    /// Object numbers `1..=reserved` stay free, so the pages of a source
    /// with `max_id <= reserved` can be copied without renumbering it.
    pub fn with_reserved_ids(reserved: u32) -> Self {
        let mut doc = Document::with_version(OUTPUT_PDF_VERSION);
        doc.max_id = reserved;

        let pages_id = doc.new_object_id();
        let catalog_id = doc.new_object_id();

        Self {
            doc,
            catalog_id,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Mutable access to the underlying document, for adding resources.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Copy every page of `source`, in its native order.
    ///
    /// The source is renumbered above this document's objects first, so its
    /// object graph can be moved over without collisions.
    ///
    /// Returns the number of pages copied.
    ///
    /// # Errors
    ///
    /// Returns an error if a page in the source tree is not a dictionary.
    pub fn import_document(&mut self, mut source: Document) -> Result<usize> {
        source.renumber_objects_with(self.doc.max_id + 1);

        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
        self.copy_pages(&source, &page_ids)?;
        self.doc.max_id = self.doc.max_id.max(source.max_id);

        Ok(page_ids.len())
    }

    /// Copy the given pages of `source`, in the given order.
    ///
    /// The caller guarantees that `source` object numbers do not collide
    /// with this document's own objects (see
    /// [`OutputDocument::with_reserved_ids`]).
    ///
    /// # Errors
    ///
    /// Returns an error if a page is missing or is not a dictionary.
    pub fn copy_pages(&mut self, source: &Document, page_ids: &[ObjectId]) -> Result<()> {
        for &page_id in page_ids {
            self.copy_page(source, page_id)?;
        }
        Ok(())
    }

    fn copy_page(&mut self, source: &Document, page_id: ObjectId) -> Result<()> {
        let mut page = source
            .get_dictionary(page_id)
            .map_err(|e| PdfMillError::other(format!("Page {page_id:?} is unusable: {e}")))?
            .clone();

        for (key, value) in inherited_attributes(source, &page) {
            page.set(key, value);
        }
        page.remove(b"Parent");

        // Placed first so back-references (annotation /P) resolve to the copy.
        self.doc
            .objects
            .insert(page_id, Object::Dictionary(page.clone()));
        for (_, value) in page.iter() {
            copy_references(&mut self.doc, source, value);
        }

        page.set("Parent", self.pages_id);
        self.doc.objects.insert(page_id, Object::Dictionary(page));
        self.doc.max_id = self.doc.max_id.max(page_id.0);

        trace!(?page_id, "copied page");
        self.kids.push(page_id);
        Ok(())
    }

    /// Append a freshly built page dictionary.
    ///
    /// `Type` and `Parent` are filled in.
    pub fn append_page(&mut self, mut page: Dictionary) -> ObjectId {
        page.set("Type", "Page");
        page.set("Parent", self.pages_id);

        let page_id = self.doc.add_object(page);
        self.kids.push(page_id);
        page_id
    }

    /// Finish the page tree and return the document.
    pub fn into_document(mut self) -> Document {
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
        self.doc.objects.insert(
            self.catalog_id,
            Object::Dictionary(dictionary! {
                "Type" => "Catalog",
                "Pages" => self.pages_id,
            }),
        );
        self.doc.trailer.set("Root", self.catalog_id);

        self.doc
    }
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect the inheritable attributes `page` does not set itself, resolved
/// from the nearest ancestor that does.
fn inherited_attributes(source: &Document, page: &Dictionary) -> Vec<(Vec<u8>, Object)> {
    let mut found: Vec<(Vec<u8>, Object)> = Vec::new();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(node_id) = parent {
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            break;
        }

        let Ok(node) = source.get_dictionary(node_id) else {
            break;
        };

        for key in INHERITABLE_KEYS {
            if page.has(key) || found.iter().any(|(k, _)| k.as_slice() == key) {
                continue;
            }
            if let Ok(value) = node.get(key) {
                found.push((key.to_vec(), value.clone()));
            }
        }

        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    found
}

/// Recursively copy every object reachable from `obj` out of `source` into
/// `target`, keeping object numbers. Objects already present in `target`
/// are not revisited.
fn copy_references(target: &mut Document, source: &Document, obj: &Object) {
    match obj {
        Object::Reference(ref_id) => {
            if !target.objects.contains_key(ref_id)
                && let Ok(referenced_obj) = source.get_object(*ref_id)
            {
                target.objects.insert(*ref_id, referenced_obj.clone());
                target.max_id = target.max_id.max(ref_id.0);
                copy_references(target, source, referenced_obj);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter() {
                copy_references(target, source, value);
            }
        }
        Object::Array(arr) => {
            for item in arr {
                copy_references(target, source, item);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter() {
                copy_references(target, source, value);
            }
        }
        _ => {}
    }
}
