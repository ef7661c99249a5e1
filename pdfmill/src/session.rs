//! The session controller.
//!
//! A [`Session`] owns everything a user interacts with between runs: the
//! active mode, the ordered collection, the in-progress drag, the last
//! error message and the busy flag. While a pipeline runs, every mutation
//! is refused with [`PdfMillError::Busy`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, warn};

use crate::collection::{Collection, ItemId, PendingItem};
use crate::config::{Mode, ProcessOptions};
use crate::error::{PdfMillError, Result};
use crate::intake::{SelectedFile, intake};
use crate::io::ArtifactSink;
use crate::pipeline::{Pipeline, ProcessReport};

/// Shared "a pipeline is running" flag.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    /// Create a cleared flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the flag is currently held.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Hold the flag, unless somebody already does.
    ///
    /// The flag is released when the returned guard is dropped.
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(&self.0)))
    }
}

/// Holds a [`BusyFlag`] until dropped.
#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Interactive state of the tool.
#[derive(Debug, Default)]
pub struct Session {
    mode: Mode,
    collection: Collection,
    busy: BusyFlag,
    last_error: Option<String>,
    drag_source: Option<usize>,
    options: ProcessOptions,
}

impl Session {
    /// Create an empty session in `mode`.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Replace the pipeline settings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the margin leaves no drawable area.
    pub fn with_options(mut self, options: ProcessOptions) -> Result<Self> {
        options.layout.validate()?;
        self.options = options;
        Ok(self)
    }

    /// Active mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Items in processing order.
    pub fn items(&self) -> &[PendingItem] {
        self.collection.items()
    }

    /// The collection.
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Pipeline settings.
    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    /// Last user-visible error, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether a pipeline is running.
    pub fn is_busy(&self) -> bool {
        self.busy.is_set()
    }

    /// Handle on the busy flag, shared with this session.
    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    /// Position where a drag started, if one is in progress.
    pub fn drag_source(&self) -> Option<usize> {
        self.drag_source
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_busy() {
            return Err(PdfMillError::Busy);
        }
        Ok(())
    }

    fn fail<T>(&mut self, err: PdfMillError) -> Result<T> {
        self.last_error = Some(err.to_string());
        Err(err)
    }

    /// Switch the active mode.
    ///
    /// The collection is kept as it is, even when it holds items the new
    /// mode would not accept.
    ///
    /// # Errors
    ///
    /// Returns `Busy` while a pipeline runs.
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.ensure_idle()?;
        if mode == self.mode {
            return Ok(());
        }

        let kind = mode.accepted_kind();
        let mismatched = self.collection.iter().filter(|i| i.kind != kind).count();
        if mismatched > 0 {
            warn!(from = %self.mode, to = %mode, mismatched, "mode switched with items of another kind");
        }

        debug!(from = %self.mode, to = %mode, "mode switched");
        self.mode = mode;
        self.drag_source = None;
        Ok(())
    }

    /// Take a selection batch and append the accepted files.
    ///
    /// Returns the number of items added.
    ///
    /// # Errors
    ///
    /// Returns `Busy` while a pipeline runs, or `NoAcceptedFiles` (also kept
    /// as the last error) when nothing in the batch is acceptable.
    pub fn select(&mut self, batch: Vec<SelectedFile>) -> Result<usize> {
        self.ensure_idle()?;

        let collection = &self.collection;
        match intake(self.mode, batch, |id| collection.contains_id(id)) {
            Ok(items) => {
                let added = items.len();
                self.collection.extend(items);
                self.last_error = None;
                debug!(added, total = self.collection.len(), "items selected");
                Ok(added)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Remove the item with `id`. An unknown id is a no-op.
    ///
    /// Returns whether an item was removed.
    ///
    /// # Errors
    ///
    /// Returns `Busy` while a pipeline runs.
    pub fn remove(&mut self, id: &ItemId) -> Result<bool> {
        self.ensure_idle()?;
        let removed = self.collection.remove(id);
        if removed {
            self.drag_source = None;
        }
        Ok(removed)
    }

    /// Remove every item.
    ///
    /// # Errors
    ///
    /// Returns `Busy` while a pipeline runs.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.collection.clear();
        self.drag_source = None;
        Ok(())
    }

    /// Start dragging the item at `index`.
    ///
    /// # Errors
    ///
    /// Returns `Busy`, `ReorderDisabled` or `InvalidPosition`.
    pub fn begin_drag(&mut self, index: usize) -> Result<()> {
        self.ensure_idle()?;
        self.ensure_reorderable()?;

        let len = self.collection.len();
        if index >= len {
            return Err(PdfMillError::InvalidPosition { index, len });
        }
        self.drag_source = Some(index);
        Ok(())
    }

    /// Drop the dragged item onto `index`.
    ///
    /// Returns whether the order changed. Without a drag in progress this
    /// is a no-op. The drag ends whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns `Busy`, `ReorderDisabled` or `InvalidPosition`.
    pub fn drop_on(&mut self, index: usize) -> Result<bool> {
        self.ensure_idle()?;
        let Some(source) = self.drag_source.take() else {
            return Ok(false);
        };
        self.reorder(source, index)
    }

    /// Abandon the drag in progress, if any.
    pub fn cancel_drag(&mut self) {
        self.drag_source = None;
    }

    /// Move the item at `source` to `target`.
    ///
    /// Returns whether the order changed.
    ///
    /// # Errors
    ///
    /// Returns `Busy`, `ReorderDisabled` or `InvalidPosition`.
    pub fn reorder(&mut self, source: usize, target: usize) -> Result<bool> {
        self.ensure_idle()?;
        self.ensure_reorderable()?;

        let moved = self.collection.reorder(source, target)?;
        if moved {
            debug!(source, target, "item moved");
        }
        Ok(moved)
    }

    fn ensure_reorderable(&self) -> Result<()> {
        if !self.mode.allows_reorder() {
            return Err(PdfMillError::ReorderDisabled { mode: self.mode });
        }
        Ok(())
    }

    /// Run the active mode's pipeline over the collection.
    ///
    /// The precondition is checked before the session turns busy. Any
    /// failure after that is reported with the mode's generic message and
    /// kept as the last error; the underlying cause is logged. The busy
    /// flag is released on every path, including a dropped future.
    ///
    /// # Errors
    ///
    /// Returns `Busy`, `NotEnoughItems` or `ProcessingFailed`.
    pub async fn process<S>(&mut self, sink: &mut S) -> Result<ProcessReport>
    where
        S: ArtifactSink + ?Sized,
    {
        let pipeline = Pipeline::from(self.mode);

        if let Err(err) = pipeline.check(self.collection.len()) {
            return self.fail(err);
        }

        let Some(_guard) = self.busy.try_acquire() else {
            return Err(PdfMillError::Busy);
        };
        self.last_error = None;
        self.drag_source = None;

        let items = self.collection.snapshot();
        let options = self.options;
        info!(mode = %self.mode, items = items.len(), "processing started");

        match pipeline.run(&items, &options, sink).await {
            Ok(report) => Ok(report),
            Err(cause) => {
                error!(mode = %self.mode, error = %cause, "processing failed");
                let err = PdfMillError::processing_failed(self.mode, cause);
                self.fail(err)
            }
        }
    }
}
