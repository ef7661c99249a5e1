//! Integration tests for the session life cycle across modes.

use pdfmill::config::Mode;
use pdfmill::intake::SelectedFile;
use pdfmill::io::MemorySink;
use pdfmill::{ItemKind, PdfMillError, Session};

use crate::common::{page_markers, png_bytes, selected_pdf};

#[tokio::test]
async fn test_error_then_success_clears_last_error() {
    let mut session = Session::new(Mode::Merge);
    session
        .select(vec![selected_pdf("a.pdf", &["a1"])])
        .unwrap();

    let mut sink = MemorySink::new();
    assert!(session.process(&mut sink).await.is_err());
    assert!(session.last_error().is_some());

    session
        .select(vec![selected_pdf("b.pdf", &["b1"])])
        .unwrap();
    assert!(session.last_error().is_none());

    session.process(&mut sink).await.unwrap();
    assert!(session.last_error().is_none());
    assert_eq!(page_markers(&sink.artifacts()[0].bytes), vec!["a1", "b1"]);
}

#[tokio::test]
async fn test_process_keeps_collection() {
    let mut session = Session::new(Mode::Split);
    session
        .select(vec![selected_pdf("a.pdf", &["1", "2"])])
        .unwrap();

    session.process(&mut MemorySink::new()).await.unwrap();
    assert_eq!(session.items().len(), 1);

    let report = session.process(&mut MemorySink::new()).await.unwrap();
    assert_eq!(report.artifacts.len(), 2);
}

#[tokio::test]
async fn test_mode_switch_keeps_mismatched_items() {
    let mut session = Session::new(Mode::ImagesToPdf);
    session
        .select(vec![SelectedFile::from_bytes(
            "a.png",
            "image/png",
            png_bytes(2, 2, false),
        )])
        .unwrap();

    session.set_mode(Mode::Split).unwrap();
    assert_eq!(session.items()[0].kind, ItemKind::Image);

    // The PNG is handed to the PDF parser and fails there.
    let err = session.process(&mut MemorySink::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "Error al procesar los archivos PDF.");
    assert!(matches!(
        err.root_cause(),
        PdfMillError::FailedToLoadPdf { .. }
    ));

    session.clear().unwrap();
    session
        .select(vec![selected_pdf("ok.pdf", &["x"])])
        .unwrap();
    let report = session.process(&mut MemorySink::new()).await.unwrap();
    assert_eq!(report.artifacts[0].file_name, "ok_pagina_1.pdf");
}

#[tokio::test]
async fn test_ids_stay_unique_across_batches() {
    let mut session = Session::new(Mode::Merge);
    for round in 0..5 {
        session
            .select(vec![
                selected_pdf(&format!("{round}a.pdf"), &["x"]),
                selected_pdf(&format!("{round}b.pdf"), &["y"]),
            ])
            .unwrap();
    }

    let mut ids: Vec<&str> = session.items().iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids.len(), 10);
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}
