//! PDF loading.
//!
//! Payloads are read asynchronously and parsed on a blocking task so the
//! runtime keeps serving other work while `lopdf` walks the file.
//!
//! # Examples
//!
//! ```no_run
//! use pdfmill::io::reader::PdfReader;
//!
//! # async fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let loaded = reader.load_bytes("document.pdf", bytes).await?;
//! println!("Loaded {} pages", loaded.page_count);
//! # Ok(())
//! # }
//! ```

use std::time::Instant;

use lopdf::Document;
use tokio::task;
use tracing::debug;

use crate::collection::PendingItem;
use crate::error::{PdfMillError, Result};

/// A successfully loaded PDF document.
#[derive(Debug, Clone)]
pub struct LoadedPdf {
    /// The parsed document.
    pub document: Document,

    /// Number of pages.
    pub page_count: usize,
}

/// Loads PDF payloads, refusing encrypted and page-less documents.
#[derive(Debug, Clone, Default)]
pub struct PdfReader;

impl PdfReader {
    /// Create a new PDF reader.
    pub fn new() -> Self {
        Self
    }

    /// Load the PDF behind a pending item.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The payload cannot be read
    /// - The payload is not a valid PDF
    /// - The PDF is encrypted
    /// - The PDF has no pages
    pub async fn load(&self, item: &PendingItem) -> Result<LoadedPdf> {
        let bytes = item.payload.read().await?;
        self.load_bytes(&item.display_name, bytes).await
    }

    /// Parse raw bytes as a PDF document.
    ///
    /// # Errors
    ///
    /// Same as [`PdfReader::load`], minus payload access.
    pub async fn load_bytes(&self, name: &str, bytes: Vec<u8>) -> Result<LoadedPdf> {
        let start = Instant::now();
        let byte_size = bytes.len();
        let owned_name = name.to_string();

        let document = task::spawn_blocking(move || Document::load_mem(&bytes))
            .await
            .map_err(|e| PdfMillError::other(format!("Load task failed: {e}")))?
            .map_err(|e| {
                let err_msg = e.to_string();
                let lowered = err_msg.to_lowercase();
                if lowered.contains("encrypt") || lowered.contains("password") {
                    PdfMillError::EncryptedPdf {
                        name: owned_name.clone(),
                    }
                } else {
                    PdfMillError::failed_to_load_pdf(owned_name.clone(), err_msg)
                }
            })?;

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PdfMillError::failed_to_load_pdf(name, "PDF has no pages"));
        }

        let load_time = start.elapsed();
        debug!(name, page_count, byte_size, ?load_time, "loaded pdf");

        Ok(LoadedPdf {
            document,
            page_count,
        })
    }
}
