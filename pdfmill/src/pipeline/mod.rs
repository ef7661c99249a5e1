//! The three processing pipelines.
//!
//! A pipeline consumes a snapshot of the collection and hands every
//! produced artifact to an [`ArtifactSink`]:
//!
//! - **Merge**: every page of every document, in collection order, into one
//!   file
//! - **Split**: one single-page file per page of every document
//! - **Images to PDF**: one page per image, each image fitted and centered
//!
//! # Examples
//!
//! ```no_run
//! use pdfmill::config::{Mode, ProcessOptions};
//! use pdfmill::io::MemorySink;
//! use pdfmill::pipeline::Pipeline;
//! # use pdfmill::collection::PendingItem;
//!
//! # async fn example(items: Vec<PendingItem>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut sink = MemorySink::new();
//! let report = Pipeline::from(Mode::Merge)
//!     .run(&items, &ProcessOptions::default(), &mut sink)
//!     .await?;
//! println!("{} artifact(s) in {:?}", report.artifacts.len(), report.elapsed);
//! # Ok(())
//! # }
//! ```

pub mod images;
pub mod merge;
pub mod pages;
pub mod split;

use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use tracing::{Instrument, info, info_span};

use crate::collection::PendingItem;
use crate::config::{Mode, ProcessOptions};
use crate::error::{PdfMillError, Result};
use crate::io::{ArtifactSink, DeliveredArtifact, PdfWriter};

pub use images::{Placement, fit_image};
pub use pages::OutputDocument;
pub use split::split_file_name;

/// A runnable pipeline, one per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// Concatenate documents.
    Merge,
    /// Explode documents into single pages.
    Split,
    /// Lay images out as pages.
    ImagesToPdf,
}

impl From<Mode> for Pipeline {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Merge => Self::Merge,
            Mode::Split => Self::Split,
            Mode::ImagesToPdf => Self::ImagesToPdf,
        }
    }
}

impl Pipeline {
    /// Mode this pipeline belongs to.
    pub fn mode(&self) -> Mode {
        match self {
            Self::Merge => Mode::Merge,
            Self::Split => Mode::Split,
            Self::ImagesToPdf => Mode::ImagesToPdf,
        }
    }

    /// Check the item-count precondition.
    ///
    /// # Errors
    ///
    /// Returns `NotEnoughItems` if `len` is below the mode's minimum.
    pub fn check(&self, len: usize) -> Result<()> {
        let mode = self.mode();
        let required = mode.min_items();
        if len < required {
            return Err(PdfMillError::NotEnoughItems { mode, required });
        }
        Ok(())
    }

    /// Run the pipeline over `items`, delivering artifacts to `sink`.
    ///
    /// Items are processed strictly in the given order. Errors are returned
    /// as their underlying cause; wrapping them into the user-facing message
    /// is left to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the precondition fails or any item cannot be
    /// loaded, embedded, serialized or delivered.
    pub async fn run<S>(
        &self,
        items: &[PendingItem],
        options: &ProcessOptions,
        sink: &mut S,
    ) -> Result<ProcessReport>
    where
        S: ArtifactSink + ?Sized,
    {
        self.check(items.len())?;

        let mode = self.mode();
        let start = Instant::now();
        let span = info_span!("pipeline", %mode, items = items.len());

        let artifacts = async {
            match self {
                Self::Merge => merge::merge(items, options, sink).await,
                Self::Split => split::split(items, options, sink).await,
                Self::ImagesToPdf => images::images_to_pdf(items, options, sink).await,
            }
        }
        .instrument(span)
        .await?;

        let elapsed = start.elapsed();
        info!(%mode, artifacts = artifacts.len(), ?elapsed, "pipeline finished");

        Ok(ProcessReport {
            mode,
            items: items.len(),
            artifacts,
            elapsed,
        })
    }
}

/// Writer configured from the run options.
pub(crate) fn writer_for(options: &ProcessOptions) -> PdfWriter {
    if options.compress {
        PdfWriter::new()
    } else {
        PdfWriter::without_compression()
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    /// Mode that ran.
    pub mode: Mode,

    /// Number of items processed.
    pub items: usize,

    /// Artifacts delivered, in production order.
    pub artifacts: Vec<DeliveredArtifact>,

    /// Wall time of the run.
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl ProcessReport {
    /// Total pages across all artifacts.
    pub fn total_pages(&self) -> usize {
        self.artifacts.iter().map(|a| a.page_count).sum()
    }

    /// Total bytes across all artifacts.
    pub fn total_size(&self) -> u64 {
        self.artifacts.iter().map(|a| a.size).sum()
    }
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}
