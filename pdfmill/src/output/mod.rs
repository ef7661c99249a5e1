//! Output formatting and display for pdfmill.
//!
//! Human-readable rendering of the collection, the "how it works" guide
//! and run reports. Diagnostics go through `tracing` instead.

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use crate::collection::PendingItem;
use crate::config::Mode;
use crate::pipeline::ProcessReport;
use crate::utils::format_file_size;

/// One-line description of an item, as shown in listings.
pub fn describe_item(item: &PendingItem) -> String {
    format!(
        "{} ({}) [{}]",
        item.display_name, item.display_size, item.id
    )
}

/// Print the collection as a numbered list.
pub fn display_collection(formatter: &OutputFormatter, mode: Mode, items: &[PendingItem]) {
    if items.is_empty() {
        formatter.info(&format!(
            "No hay archivos seleccionados ({})",
            mode.accepted_kind().plural_label()
        ));
        return;
    }

    formatter.info(&format!(
        "Archivos seleccionados ({})",
        items.len()
    ));
    for (index, item) in items.iter().enumerate() {
        formatter.list_item(index + 1, &describe_item(item));
    }

    if items.len() < mode.min_items() {
        formatter.warning(&format!(
            "{} necesita al menos {} {}",
            mode.title(),
            mode.min_items(),
            mode.accepted_kind().count_label(mode.min_items())
        ));
    }
}

/// Print the mode's title, description and three steps.
pub fn display_steps(formatter: &OutputFormatter, mode: Mode) {
    formatter.section(mode.title());
    formatter.info(mode.description());
    for step in mode.steps() {
        formatter.list_item(step.num as usize, &format!("{}: {}", step.title, step.text));
    }
}

/// Print what a finished run produced.
pub fn display_report(formatter: &OutputFormatter, report: &ProcessReport) {
    for artifact in &report.artifacts {
        let target = artifact
            .location
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| artifact.file_name.clone());
        formatter.success(&format!(
            "{target} ({} página(s), {})",
            artifact.page_count,
            format_file_size(artifact.size)
        ));
    }

    formatter.info(&format!(
        "{} archivo(s) generados a partir de {} elemento(s) en {:.2}s",
        report.artifacts.len(),
        report.items,
        report.elapsed.as_secs_f64()
    ));

    if formatter.is_verbose() {
        formatter.section("Estadísticas");
        formatter.detail("Modo", report.mode.as_str());
        formatter.detail("Páginas", &report.total_pages().to_string());
        formatter.detail("Tamaño total", &format_file_size(report.total_size()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{ItemId, ItemKind, Payload};
    use crate::io::DeliveredArtifact;
    use std::time::Duration;

    fn item(name: &str) -> PendingItem {
        PendingItem {
            id: ItemId::from("k3j9x0a1b"),
            payload: Payload::from(Vec::new()),
            display_name: name.to_string(),
            display_size: "1.5 KB".to_string(),
            kind: ItemKind::Document,
            content_type: "application/pdf".to_string(),
        }
    }

    #[test]
    fn test_describe_item() {
        assert_eq!(
            describe_item(&item("informe.pdf")),
            "informe.pdf (1.5 KB) [k3j9x0a1b]"
        );
    }

    #[test]
    fn test_display_helpers_do_not_panic() {
        let formatter = OutputFormatter::verbose().plain();
        display_collection(&formatter, Mode::Merge, &[]);
        display_collection(&formatter, Mode::Merge, &[item("a.pdf")]);
        display_steps(&formatter, Mode::ImagesToPdf);

        let report = ProcessReport {
            mode: Mode::Merge,
            items: 2,
            artifacts: vec![DeliveredArtifact {
                file_name: "documento-unido.pdf".to_string(),
                page_count: 3,
                size: 2048,
                location: None,
            }],
            elapsed: Duration::from_millis(5),
        };
        display_report(&formatter, &report);
    }
}
