//! Artifact delivery.
//!
//! A pipeline hands every produced file to an [`ArtifactSink`]. The sink
//! owns the bytes from then on and drops them once they are persisted, so
//! no artifact outlives its delivery.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::task;
use tracing::{debug, info};

use crate::config::OverwriteMode;
use crate::error::{PdfMillError, Result};

/// One produced output file.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// File name the artifact is offered under.
    pub file_name: String,

    /// Serialized PDF bytes.
    pub bytes: Vec<u8>,

    /// Number of pages in the document.
    pub page_count: usize,
}

/// Record of an artifact after a sink accepted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveredArtifact {
    /// File name the artifact was offered under.
    pub file_name: String,

    /// Number of pages in the document.
    pub page_count: usize,

    /// Size in bytes.
    pub size: u64,

    /// Where the artifact was persisted, if anywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
}

/// Destination for produced artifacts.
pub trait ArtifactSink {
    /// Take ownership of an artifact and persist or keep it.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be delivered.
    fn deliver(
        &mut self,
        artifact: Artifact,
    ) -> impl Future<Output = Result<DeliveredArtifact>> + Send;
}

/// Callback consulted before replacing an existing file.
///
/// It runs on a blocking thread, so it may wait for user input.
pub type ConfirmOverwrite = Box<dyn FnMut(&Path) -> bool + Send>;

/// Writes artifacts into a directory.
///
/// Each file is written to a temporary sibling first and then renamed into
/// place, so a failed write never leaves a truncated artifact behind.
pub struct DirectorySink {
    dir: PathBuf,
    overwrite_mode: OverwriteMode,
    confirm: Option<ConfirmOverwrite>,
}

impl DirectorySink {
    /// Create a sink writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>, overwrite_mode: OverwriteMode) -> Self {
        Self {
            dir: dir.into(),
            overwrite_mode,
            confirm: None,
        }
    }

    /// Install the callback asked in [`OverwriteMode::Prompt`].
    ///
    /// Without one, prompting behaves like [`OverwriteMode::NoClobber`].
    pub fn with_confirm(mut self, confirm: impl FnMut(&Path) -> bool + Send + 'static) -> Self {
        self.confirm = Some(Box::new(confirm));
        self
    }

    /// Directory artifacts are written into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an artifact with `file_name` would be written to.
    pub fn target_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    async fn check_overwrite(&mut self, path: &Path) -> Result<()> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(());
        }

        match self.overwrite_mode {
            OverwriteMode::Force => Ok(()),
            OverwriteMode::NoClobber => Err(PdfMillError::output_exists(path.to_path_buf())),
            OverwriteMode::Prompt => {
                let Some(mut confirm) = self.confirm.take() else {
                    return Err(PdfMillError::output_exists(path.to_path_buf()));
                };

                let target = path.to_path_buf();
                let (confirm, accepted) = task::spawn_blocking(move || {
                    let accepted = confirm(&target);
                    (confirm, accepted)
                })
                .await
                .map_err(|e| PdfMillError::other(format!("Confirmation task failed: {e}")))?;
                self.confirm = Some(confirm);

                if accepted {
                    Ok(())
                } else {
                    Err(PdfMillError::Cancelled)
                }
            }
        }
    }
}

impl std::fmt::Debug for DirectorySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectorySink")
            .field("dir", &self.dir)
            .field("overwrite_mode", &self.overwrite_mode)
            .field("confirm", &self.confirm.is_some())
            .finish()
    }
}

/// Write `bytes` to `path` through a temporary sibling file.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let write_path = path.with_extension("pdf.tmp");

    let file =
        std::fs::File::create(&write_path).map_err(|e| PdfMillError::FailedToCreateOutput {
            path: write_path.clone(),
            source: e,
        })?;

    let mut writer = std::io::BufWriter::new(file);
    writer
        .write_all(bytes)
        .and_then(|()| writer.flush())
        .map_err(|e| {
            let _ = std::fs::remove_file(&write_path);
            PdfMillError::FailedToWrite {
                path: write_path.clone(),
                source: e,
            }
        })?;
    drop(writer);

    std::fs::rename(&write_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&write_path);
        PdfMillError::FailedToWrite {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

impl ArtifactSink for DirectorySink {
    async fn deliver(&mut self, artifact: Artifact) -> Result<DeliveredArtifact> {
        let path = self.target_path(&artifact.file_name);
        self.check_overwrite(&path).await?;

        let Artifact {
            file_name,
            bytes,
            page_count,
        } = artifact;
        let size = bytes.len() as u64;

        let target = path.clone();
        task::spawn_blocking(move || write_atomically(&target, &bytes))
            .await
            .map_err(|e| PdfMillError::other(format!("Write task failed: {e}")))??;

        info!(path = %path.display(), size, "artifact written");

        Ok(DeliveredArtifact {
            file_name,
            page_count,
            size,
            location: Some(path),
        })
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Vec<Artifact>,
    retain: bool,
}

impl MemorySink {
    /// Create a sink that keeps every artifact it receives.
    pub fn new() -> Self {
        Self {
            artifacts: Vec::new(),
            retain: true,
        }
    }

    /// Create a sink that records deliveries and discards the bytes.
    pub fn discarding() -> Self {
        Self {
            artifacts: Vec::new(),
            retain: false,
        }
    }

    /// Artifacts received so far.
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Take the received artifacts out of the sink.
    pub fn into_artifacts(self) -> Vec<Artifact> {
        self.artifacts
    }

    /// Whether nothing has been delivered.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ArtifactSink for MemorySink {
    async fn deliver(&mut self, artifact: Artifact) -> Result<DeliveredArtifact> {
        let delivered = DeliveredArtifact {
            file_name: artifact.file_name.clone(),
            page_count: artifact.page_count,
            size: artifact.bytes.len() as u64,
            location: None,
        };
        debug!(file_name = %delivered.file_name, size = delivered.size, "artifact kept in memory");

        if self.retain {
            self.artifacts.push(artifact);
        }
        Ok(delivered)
    }
}

impl<S: ArtifactSink + ?Sized> ArtifactSink for &mut S {
    fn deliver(
        &mut self,
        artifact: Artifact,
    ) -> impl Future<Output = Result<DeliveredArtifact>> + Send {
        (**self).deliver(artifact)
    }
}
