//! PDF serialization.
//!
//! Output documents are turned into bytes here; where those bytes end up
//! is the business of an [`ArtifactSink`](crate::io::sink::ArtifactSink).

use lopdf::Document;
use tokio::task;
use tracing::debug;

use crate::error::{PdfMillError, Result};

/// Serializes output documents.
///
/// Unreachable objects are always dropped and the rest renumbered before
/// saving, so imported pages never drag unused source objects along.
#[derive(Debug, Clone)]
pub struct PdfWriter {
    compress: bool,
}

impl PdfWriter {
    /// Create a writer that compresses content streams.
    pub fn new() -> Self {
        Self { compress: true }
    }

    /// Create a writer without compression (faster but larger files).
    pub fn without_compression() -> Self {
        Self { compress: false }
    }

    /// Serialize a document to bytes, consuming it.
    ///
    /// # Errors
    ///
    /// Returns `FailedToSerialize` if `lopdf` cannot write the document.
    pub fn serialize(&self, mut doc: Document) -> Result<Vec<u8>> {
        doc.prune_objects();
        doc.renumber_objects();

        if self.compress {
            doc.compress();
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| PdfMillError::FailedToSerialize {
                reason: e.to_string(),
            })?;

        debug!(
            bytes = buffer.len(),
            compressed = self.compress,
            "serialized document"
        );
        Ok(buffer)
    }

    /// Serialize a document on a blocking task.
    ///
    /// # Errors
    ///
    /// Same as [`PdfWriter::serialize`].
    pub async fn serialize_async(&self, doc: Document) -> Result<Vec<u8>> {
        let writer = self.clone();
        task::spawn_blocking(move || writer.serialize(doc))
            .await
            .map_err(|e| PdfMillError::other(format!("Write task failed: {e}")))?
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}
