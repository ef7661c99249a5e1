//! File intake: turning a user selection into pending items.
//!
//! A selection batch is filtered against the active mode's accepted kind.
//! Rejected files are dropped silently; a batch with nothing acceptable is
//! refused as a whole with one message naming the expected kind.

use std::path::Path;

use tracing::debug;

use crate::collection::{ItemId, ItemKind, Payload, PendingItem};
use crate::config::Mode;
use crate::error::{PdfMillError, Result};
use crate::utils::format_file_size;

/// Content type reported for PDF documents.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// One file as delivered by the selection control.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    /// File name, without directories.
    pub name: String,

    /// Declared content type.
    pub content_type: String,

    /// Size in bytes.
    pub size: u64,

    /// Unread content.
    pub payload: Payload,
}

impl SelectedFile {
    /// Describe a file on disk. The content type comes from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or is not a regular file.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PdfMillError::file_not_found(path.to_path_buf())
            } else {
                PdfMillError::FileNotAccessible {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        if !metadata.is_file() {
            return Err(PdfMillError::other(format!(
                "Not a file: {}",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            content_type: guess_content_type(&name).to_string(),
            name,
            size: metadata.len(),
            payload: Payload::Path(path.to_path_buf()),
        })
    }

    /// Describe an in-memory file with an explicit content type.
    pub fn from_bytes(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size: bytes.len() as u64,
            payload: Payload::from(bytes),
        }
    }
}

/// Guess a content type from a file name's extension.
pub fn guess_content_type(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());

    match extension.as_deref() {
        Some("pdf") => PDF_CONTENT_TYPE,
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Whether `mode` accepts a file with the given content type.
pub fn accepts(mode: Mode, content_type: &str) -> bool {
    match mode.accepted_kind() {
        ItemKind::Image => content_type.starts_with("image/"),
        ItemKind::Document => content_type == PDF_CONTENT_TYPE,
    }
}

/// Turn a selection batch into pending items for `mode`.
///
/// Accepted files keep their batch order. Ids are unique against `taken`
/// (the live collection) and against each other.
///
/// # Errors
///
/// Returns `NoAcceptedFiles` if no file in the batch is acceptable.
pub fn intake(
    mode: Mode,
    batch: Vec<SelectedFile>,
    taken: impl Fn(&ItemId) -> bool,
) -> Result<Vec<PendingItem>> {
    let kind = mode.accepted_kind();
    let offered = batch.len();
    let mut accepted: Vec<PendingItem> = Vec::with_capacity(offered);

    for file in batch {
        if !accepts(mode, &file.content_type) {
            debug!(name = %file.name, content_type = %file.content_type, %mode, "dropping file at intake");
            continue;
        }

        let id = ItemId::generate_unique(|candidate| {
            taken(candidate) || accepted.iter().any(|item| &item.id == candidate)
        });

        accepted.push(PendingItem {
            id,
            payload: file.payload,
            display_size: format_file_size(file.size),
            display_name: file.name,
            kind,
            content_type: file.content_type,
        });
    }

    if accepted.is_empty() {
        return Err(PdfMillError::NoAcceptedFiles { expected: kind });
    }

    debug!(offered, accepted = accepted.len(), %mode, "intake complete");
    Ok(accepted)
}
