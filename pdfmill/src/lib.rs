//! pdfmill - Merge PDFs, split them into single pages, and turn images into
//! a PDF.
//!
//! The library is organised around a [`Session`]: pick a [`Mode`], feed it
//! selection batches, arrange the resulting collection, then run the
//! mode's pipeline into an [`ArtifactSink`](io::ArtifactSink).
//!
//! - **Merge**: concatenates every page of two or more PDFs
//! - **Split**: writes one single-page PDF per page
//! - **Images to PDF**: places each JPEG or PNG centered on its own A4 page
//!
//! # Examples
//!
//! ## Interactive-style session
//!
//! ```no_run
//! use pdfmill::config::Mode;
//! use pdfmill::intake::SelectedFile;
//! use pdfmill::io::MemorySink;
//! use pdfmill::Session;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::new(Mode::Merge);
//! session.select(vec![
//!     SelectedFile::from_path(Path::new("a.pdf")).await?,
//!     SelectedFile::from_path(Path::new("b.pdf")).await?,
//! ])?;
//! session.reorder(1, 0)?;
//!
//! let mut sink = MemorySink::new();
//! let report = session.process(&mut sink).await?;
//! println!("{} page(s)", report.total_pages());
//! # Ok(())
//! # }
//! ```
//!
//! ## Writing artifacts to a directory
//!
//! ```no_run
//! use pdfmill::config::{Mode, OverwriteMode};
//! use pdfmill::io::DirectorySink;
//! use pdfmill::Session;
//!
//! # async fn example(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
//! session.set_mode(Mode::Split)?;
//! let mut sink = DirectorySink::new("out", OverwriteMode::NoClobber);
//! session.process(&mut sink).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod config;
pub mod error;
pub mod intake;
pub mod io;
pub mod output;
pub mod pipeline;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use collection::{Collection, ItemId, ItemKind, PendingItem};
pub use config::{Config, Mode};
pub use error::{PdfMillError, Result};
pub use pipeline::ProcessReport;
pub use session::Session;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
