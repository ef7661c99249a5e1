//! Integration tests for the merge pipeline.

use pdfmill::config::{MERGED_FILE_NAME, Mode, OverwriteMode};
use pdfmill::intake::SelectedFile;
use pdfmill::io::{DirectorySink, MemorySink};
use pdfmill::{PdfMillError, Session};
use tempfile::TempDir;

use crate::common::{page_markers, pdf_with_markers, selected_pdf, write_fixture};

#[tokio::test]
async fn test_merge_keeps_collection_then_page_order() {
    let mut session = Session::new(Mode::Merge);
    session
        .select(vec![
            selected_pdf("a.pdf", &["a1", "a2"]),
            selected_pdf("b.pdf", &["b1"]),
        ])
        .unwrap();

    let mut sink = MemorySink::new();
    let report = session.process(&mut sink).await.unwrap();

    assert_eq!(report.artifacts.len(), 1);
    assert_eq!(report.artifacts[0].file_name, MERGED_FILE_NAME);
    assert_eq!(report.artifacts[0].page_count, 3);

    let artifacts = sink.into_artifacts();
    assert_eq!(page_markers(&artifacts[0].bytes), vec!["a1", "a2", "b1"]);
}

#[tokio::test]
async fn test_merge_after_reorder() {
    let mut session = Session::new(Mode::Merge);
    session
        .select(vec![
            selected_pdf("a.pdf", &["a1", "a2"]),
            selected_pdf("b.pdf", &["b1"]),
            selected_pdf("c.pdf", &["c1"]),
        ])
        .unwrap();

    session.begin_drag(2).unwrap();
    session.drop_on(0).unwrap();

    let mut sink = MemorySink::new();
    session.process(&mut sink).await.unwrap();

    let artifacts = sink.into_artifacts();
    assert_eq!(
        page_markers(&artifacts[0].bytes),
        vec!["c1", "a1", "a2", "b1"]
    );
}

#[tokio::test]
async fn test_merge_same_document_twice() {
    let mut session = Session::new(Mode::Merge);
    session
        .select(vec![
            selected_pdf("a.pdf", &["x", "y"]),
            selected_pdf("a.pdf", &["x", "y"]),
        ])
        .unwrap();

    let mut sink = MemorySink::new();
    session.process(&mut sink).await.unwrap();

    let artifacts = sink.into_artifacts();
    assert_eq!(page_markers(&artifacts[0].bytes), vec!["x", "y", "x", "y"]);
}

#[tokio::test]
async fn test_merge_files_into_directory() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let first = write_fixture(input_dir.path(), "uno.pdf", &pdf_with_markers(&["1"]));
    let second = write_fixture(input_dir.path(), "dos.pdf", &pdf_with_markers(&["2", "3"]));

    let mut session = Session::new(Mode::Merge);
    session
        .select(vec![
            SelectedFile::from_path(&first).await.unwrap(),
            SelectedFile::from_path(&second).await.unwrap(),
        ])
        .unwrap();

    let mut sink = DirectorySink::new(output_dir.path(), OverwriteMode::NoClobber);
    let report = session.process(&mut sink).await.unwrap();

    let output = output_dir.path().join(MERGED_FILE_NAME);
    assert_eq!(report.artifacts[0].location.as_deref(), Some(output.as_path()));
    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(page_markers(&bytes), vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_merge_with_broken_input_produces_nothing() {
    let mut session = Session::new(Mode::Merge);
    session
        .select(vec![
            selected_pdf("a.pdf", &["a1"]),
            SelectedFile::from_bytes("roto.pdf", "application/pdf", b"garbage".to_vec()),
        ])
        .unwrap();

    let mut sink = MemorySink::new();
    let err = session.process(&mut sink).await.unwrap_err();

    assert!(matches!(err, PdfMillError::ProcessingFailed { .. }));
    assert_eq!(err.to_string(), "Error al procesar los archivos PDF.");
    assert!(sink.is_empty());
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_merge_with_missing_file_reports_not_found_cause() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "gone.pdf", &pdf_with_markers(&["g"]));

    let mut session = Session::new(Mode::Merge);
    session
        .select(vec![
            SelectedFile::from_path(&path).await.unwrap(),
            selected_pdf("b.pdf", &["b1"]),
        ])
        .unwrap();
    std::fs::remove_file(&path).unwrap();

    let err = session.process(&mut MemorySink::new()).await.unwrap_err();
    assert!(matches!(err.root_cause(), PdfMillError::FileNotFound { .. }));
    assert_eq!(err.exit_code(), 2);
}
