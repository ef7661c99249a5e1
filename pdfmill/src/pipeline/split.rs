//! Split pipeline.

use tracing::debug;

use crate::collection::PendingItem;
use crate::config::ProcessOptions;
use crate::error::Result;
use crate::io::{Artifact, ArtifactSink, DeliveredArtifact, PdfReader};
use crate::pipeline::pages::OutputDocument;
use crate::pipeline::writer_for;

/// Name of the artifact holding page `page_number` (1-based) of `name`.
///
/// Only the first `.pdf` occurrence is removed, wherever it sits in the
/// name.
///
/// # Examples
///
/// ```
/// use pdfmill::pipeline::split_file_name;
///
/// assert_eq!(split_file_name("report.pdf", 3), "report_pagina_3.pdf");
/// assert_eq!(split_file_name("a.pdf.pdf", 1), "a.pdf_pagina_1.pdf");
/// ```
pub fn split_file_name(name: &str, page_number: u32) -> String {
    format!("{}_pagina_{page_number}.pdf", name.replacen(".pdf", "", 1))
}

/// Deliver one single-page document per page of every item.
///
/// Artifacts are delivered as they are produced: items in collection
/// order, pages in each document's native order.
pub(crate) async fn split<S>(
    items: &[PendingItem],
    options: &ProcessOptions,
    sink: &mut S,
) -> Result<Vec<DeliveredArtifact>>
where
    S: ArtifactSink + ?Sized,
{
    let reader = PdfReader::new();
    let writer = writer_for(options);
    let mut delivered = Vec::new();

    for item in items {
        let loaded = reader.load(item).await?;
        let source = loaded.document;
        debug!(name = %item.display_name, pages = loaded.page_count, "splitting document");

        for (page_number, page_id) in source.get_pages() {
            let mut output = OutputDocument::with_reserved_ids(source.max_id);
            output.copy_pages(&source, &[page_id])?;

            let bytes = writer.serialize_async(output.into_document()).await?;
            delivered.push(sink.deliver(Artifact {
                file_name: split_file_name(&item.display_name, page_number),
                bytes,
                page_count: 1,
            })
            .await?);
        }
    }

    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_file_name() {
        assert_eq!(split_file_name("informe.pdf", 1), "informe_pagina_1.pdf");
        assert_eq!(split_file_name("scan", 2), "scan_pagina_2.pdf");
        assert_eq!(split_file_name("x.pdf.backup.pdf", 10), "x.backup.pdf_pagina_10.pdf");
        assert_eq!(split_file_name("REPORT.PDF", 1), "REPORT.PDF_pagina_1.pdf");
    }
}
