//! Input/output operations for PDF documents and produced artifacts.

pub mod reader;
pub mod sink;
pub mod writer;

pub use reader::{LoadedPdf, PdfReader};
pub use sink::{Artifact, ArtifactSink, DeliveredArtifact, DirectorySink, MemorySink};
pub use writer::PdfWriter;
