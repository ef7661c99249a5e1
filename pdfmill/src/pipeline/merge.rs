//! Merge pipeline.

use tracing::debug;

use crate::collection::PendingItem;
use crate::config::{MERGED_FILE_NAME, ProcessOptions};
use crate::error::Result;
use crate::io::{Artifact, ArtifactSink, DeliveredArtifact, PdfReader};
use crate::pipeline::pages::OutputDocument;
use crate::pipeline::writer_for;

/// Concatenate every page of every item into a single document.
///
/// Items are loaded one at a time, in collection order, and each source is
/// moved into the output as soon as it is parsed.
pub(crate) async fn merge<S>(
    items: &[PendingItem],
    options: &ProcessOptions,
    sink: &mut S,
) -> Result<Vec<DeliveredArtifact>>
where
    S: ArtifactSink + ?Sized,
{
    let reader = PdfReader::new();
    let mut output = OutputDocument::new();

    for item in items {
        let loaded = reader.load(item).await?;
        let copied = output.import_document(loaded.document)?;
        debug!(name = %item.display_name, pages = copied, "appended document");
    }

    let page_count = output.page_count();
    let bytes = writer_for(options)
        .serialize_async(output.into_document())
        .await?;

    let delivered = sink.deliver(Artifact {
        file_name: MERGED_FILE_NAME.to_string(),
        bytes,
        page_count,
    })
    .await?;

    Ok(vec![delivered])
}
