//! Pending items and the ordered collection that holds them.
//!
//! Collection order is the one meaningful invariant here: it is the page
//! order of merge and images-to-pdf output. Items are keyed by an opaque
//! [`ItemId`] that stays stable while the item is repositioned.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{PdfMillError, Result};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

/// Opaque identifier of a pending item, unique within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Generate a random 9-character base-36 token.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let token = (0..ID_LEN)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect();
        Self(token)
    }

    /// Generate a token for which `taken` returns false.
    pub fn generate_unique(taken: impl Fn(&ItemId) -> bool) -> Self {
        loop {
            let id = Self::generate();
            if !taken(&id) {
                return id;
            }
        }
    }

    /// The token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// What a pending item is, and therefore which pipeline may consume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A PDF document.
    Document,
    /// A raster image.
    Image,
}

impl ItemKind {
    /// Plural noun used in intake messages.
    pub fn plural_label(&self) -> &'static str {
        match self {
            Self::Document => "archivos PDF",
            Self::Image => "imágenes",
        }
    }

    /// Adjective ending agreeing with [`plural_label`](Self::plural_label).
    pub(crate) fn plural_suffix(&self) -> &'static str {
        match self {
            Self::Document => "os",
            Self::Image => "as",
        }
    }

    /// Noun agreeing with `count`.
    pub fn count_label(&self, count: usize) -> &'static str {
        match (self, count) {
            (Self::Document, 1) => "archivo PDF",
            (Self::Document, _) => "archivos PDF",
            (Self::Image, 1) => "imagen",
            (Self::Image, _) => "imágenes",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => f.write_str("pdf"),
            Self::Image => f.write_str("image"),
        }
    }
}

/// Raw content handle of an item. Nothing is read until a pipeline runs.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Content lives in a file.
    Path(PathBuf),
    /// Content already in memory.
    Bytes(Arc<[u8]>),
}

impl Payload {
    /// Read the full content.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` or `FileNotAccessible` for file payloads that
    /// cannot be read.
    pub async fn read(&self) -> Result<Vec<u8>> {
        match self {
            Self::Path(path) => tokio::fs::read(path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PdfMillError::file_not_found(path.clone())
                } else {
                    PdfMillError::FileNotAccessible {
                        path: path.clone(),
                        source: e,
                    }
                }
            }),
            Self::Bytes(bytes) => Ok(bytes.to_vec()),
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes.into())
    }
}

/// One accepted input awaiting processing.
#[derive(Debug, Clone)]
pub struct PendingItem {
    /// Stable identifier, the only key for removal.
    pub id: ItemId,

    /// Unread content.
    pub payload: Payload,

    /// Original file name.
    pub display_name: String,

    /// Human-readable size, computed at intake.
    pub display_size: String,

    /// Document or image.
    pub kind: ItemKind,

    /// Declared content type, e.g. `image/png`.
    pub content_type: String,
}

/// Ordered list of pending items.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    items: Vec<PendingItem>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in order.
    pub fn items(&self) -> &[PendingItem] {
        &self.items
    }

    /// Iterate over items in order.
    pub fn iter(&self) -> std::slice::Iter<'_, PendingItem> {
        self.items.iter()
    }

    /// Item at a zero-based position.
    pub fn get(&self, index: usize) -> Option<&PendingItem> {
        self.items.get(index)
    }

    /// Position of the item with the given id.
    pub fn position_of(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    /// Whether an item with the given id is present.
    pub fn contains_id(&self, id: &ItemId) -> bool {
        self.position_of(id).is_some()
    }

    /// Append items at the end, keeping their order.
    ///
    /// Callers hand over items whose ids are not yet in the collection.
    pub fn extend(&mut self, items: impl IntoIterator<Item = PendingItem>) {
        for item in items {
            debug_assert!(!self.contains_id(&item.id), "duplicate item id {}", item.id);
            self.items.push(item);
        }
    }

    /// Remove the item with the given id. Returns false if it was absent.
    pub fn remove(&mut self, id: &ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        self.items.len() != before
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Move the item at `source` so that it ends up at `target`.
    ///
    /// Items between the two positions shift by one slot. Returns false when
    /// `source == target`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPosition` if either index is out of range.
    pub fn reorder(&mut self, source: usize, target: usize) -> Result<bool> {
        let len = self.items.len();
        for index in [source, target] {
            if index >= len {
                return Err(PdfMillError::InvalidPosition { index, len });
            }
        }

        if source == target {
            return Ok(false);
        }

        let item = self.items.remove(source);
        self.items.insert(target, item);
        Ok(true)
    }

    /// Clone the current items for a pipeline run.
    pub fn snapshot(&self) -> Vec<PendingItem> {
        self.items.clone()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a PendingItem;
    type IntoIter = std::slice::Iter<'a, PendingItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
