//! Error types for pdfmill.
//!
//! Every failure surfaced to a user ends up as a single human-readable
//! string. The variants below keep enough structure for the CLI to pick an
//! exit code and for logs to carry the underlying cause, while their
//! `Display` output is the message the user sees.
//!
//! # Error Categories
//!
//! - **Intake errors**: a selection batch with no acceptable file
//! - **Precondition errors**: too few items for the chosen pipeline
//! - **Processing errors**: anything that fails while loading, copying,
//!   embedding or serializing, reported with one generic message per mode
//! - **Session errors**: mutations attempted while a pipeline is running
//! - **I/O errors**: reading inputs and persisting artifacts

use std::io;
use std::path::PathBuf;

use crate::collection::ItemKind;
use crate::config::Mode;

/// Result type alias for pdfmill operations.
pub type Result<T> = std::result::Result<T, PdfMillError>;

/// Main error type for pdfmill operations.
#[derive(Debug, thiserror::Error)]
pub enum PdfMillError {
    /// A selection batch contained no file of the kind the mode accepts.
    #[error("Por favor selecciona solo {} válid{}", expected.plural_label(), expected.plural_suffix())]
    NoAcceptedFiles {
        /// Kind the active mode accepts.
        expected: ItemKind,
    },

    /// The collection holds fewer items than the pipeline requires.
    #[error("Necesitas al menos {required} {} para {}", mode.accepted_kind().count_label(*required), mode.verb())]
    NotEnoughItems {
        /// Mode whose pipeline was requested.
        mode: Mode,
        /// Minimum number of items.
        required: usize,
    },

    /// A pipeline failed. Only the generic message for the mode is shown.
    #[error("{}", mode.failure_message())]
    ProcessingFailed {
        /// Mode whose pipeline failed.
        mode: Mode,
        /// Underlying cause, kept for diagnostics.
        cause: Box<PdfMillError>,
    },

    /// A pipeline is running and the session refuses mutations.
    #[error("Hay un proceso en curso, espera a que termine")]
    Busy,

    /// Reordering is not available in the given mode.
    #[error("El orden no se puede cambiar en el modo {mode}")]
    ReorderDisabled {
        /// Active mode.
        mode: Mode,
    },

    /// A list position is outside the collection.
    #[error("Posición {} fuera de rango (hay {len} elemento(s))", index + 1)]
    InvalidPosition {
        /// Zero-based position that was requested.
        index: usize,
        /// Current collection length.
        len: usize,
    },

    /// Input file was not found.
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Input file exists but cannot be read.
    #[error("Cannot access file: {}\n  Reason: {source}", path.display())]
    FileNotAccessible {
        /// Path to the inaccessible file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A payload could not be parsed as a PDF document.
    #[error("Failed to load PDF: {name}\n  Reason: {reason}")]
    FailedToLoadPdf {
        /// Display name of the item.
        name: String,
        /// Reason for the failure.
        reason: String,
    },

    /// A payload is an encrypted PDF.
    #[error("PDF is encrypted and cannot be processed: {name}")]
    EncryptedPdf {
        /// Display name of the item.
        name: String,
    },

    /// A payload could not be decoded or embedded as an image.
    #[error("Failed to embed image: {name}\n  Reason: {reason}")]
    UnsupportedImage {
        /// Display name of the item.
        name: String,
        /// Reason for the failure.
        reason: String,
    },

    /// An output document could not be serialized.
    #[error("Failed to serialize PDF: {reason}")]
    FailedToSerialize {
        /// Reason for the failure.
        reason: String,
    },

    /// Output file already exists and overwrite is not allowed.
    #[error("Output file already exists: {}\n  Use --force to overwrite or choose a different output directory", path.display())]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to create an output file.
    #[error("Failed to create output file: {}\n  Reason: {source}", path.display())]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write to an output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// User cancelled the operation.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<lopdf::Error> for PdfMillError {
    fn from(err: lopdf::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl From<image::ImageError> for PdfMillError {
    fn from(err: image::ImageError) -> Self {
        Self::other(err.to_string())
    }
}

impl From<anyhow::Error> for PdfMillError {
    fn from(err: anyhow::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl PdfMillError {
    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create a FailedToLoadPdf error.
    pub fn failed_to_load_pdf(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FailedToLoadPdf {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedImage error.
    pub fn unsupported_image(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedImage {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Wrap a pipeline failure into the generic per-mode error.
    pub fn processing_failed(mode: Mode, cause: PdfMillError) -> Self {
        Self::ProcessingFailed {
            mode,
            cause: Box::new(cause),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// The underlying cause of a processing failure, or the error itself.
    pub fn root_cause(&self) -> &PdfMillError {
        match self {
            Self::ProcessingFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Check whether this error stems from what the user asked for
    /// rather than from a fault while doing it.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NoAcceptedFiles { .. }
                | Self::NotEnoughItems { .. }
                | Self::Busy
                | Self::ReorderDisabled { .. }
                | Self::InvalidPosition { .. }
                | Self::InvalidConfig { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoAcceptedFiles { .. } => 1,
            Self::NotEnoughItems { .. } => 1,
            Self::Busy => 1,
            Self::ReorderDisabled { .. } => 1,
            Self::InvalidPosition { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::FileNotFound { .. } => 2,
            Self::FileNotAccessible { .. } => 2,
            Self::ProcessingFailed { cause, .. } => cause.exit_code(),
            Self::FailedToLoadPdf { .. } => 3,
            Self::EncryptedPdf { .. } => 3,
            Self::UnsupportedImage { .. } => 3,
            Self::OutputExists { .. } => 4,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::Io { .. } => 5,
            Self::FailedToSerialize { .. } => 6,
            Self::Cancelled => 130, // Standard exit code for SIGINT
            Self::Other { .. } => 1,
        }
    }
}
