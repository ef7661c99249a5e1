//! Integration tests for the split pipeline.

use pdfmill::config::{Mode, OverwriteMode};
use pdfmill::io::{DirectorySink, MemorySink};
use pdfmill::{PdfMillError, Session};
use tempfile::TempDir;

use crate::common::{page_markers, selected_pdf};

#[tokio::test]
async fn test_split_three_page_document() {
    let mut session = Session::new(Mode::Split);
    session
        .select(vec![selected_pdf("informe.pdf", &["p1", "p2", "p3"])])
        .unwrap();

    let mut sink = MemorySink::new();
    let report = session.process(&mut sink).await.unwrap();
    assert_eq!(report.artifacts.len(), 3);
    assert_eq!(report.total_pages(), 3);

    let artifacts = sink.into_artifacts();
    let names: Vec<&str> = artifacts.iter().map(|a| a.file_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "informe_pagina_1.pdf",
            "informe_pagina_2.pdf",
            "informe_pagina_3.pdf"
        ]
    );

    for (artifact, expected) in artifacts.iter().zip(["p1", "p2", "p3"]) {
        assert_eq!(page_markers(&artifact.bytes), vec![expected]);
        assert_eq!(artifact.page_count, 1);
    }
}

#[tokio::test]
async fn test_split_several_documents_in_collection_order() {
    let mut session = Session::new(Mode::Split);
    session
        .select(vec![
            selected_pdf("a.pdf", &["a1", "a2"]),
            selected_pdf("b.pdf", &["b1"]),
        ])
        .unwrap();

    let mut sink = MemorySink::new();
    session.process(&mut sink).await.unwrap();

    let artifacts = sink.into_artifacts();
    let names: Vec<&str> = artifacts.iter().map(|a| a.file_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["a_pagina_1.pdf", "a_pagina_2.pdf", "b_pagina_1.pdf"]
    );
    assert_eq!(page_markers(&artifacts[2].bytes), vec!["b1"]);
}

#[tokio::test]
async fn test_split_pages_inherit_media_box() {
    let mut session = Session::new(Mode::Split);
    session
        .select(vec![selected_pdf("doc.pdf", &["only"])])
        .unwrap();

    let mut sink = MemorySink::new();
    session.process(&mut sink).await.unwrap();

    let artifact = &sink.artifacts()[0];
    let doc = lopdf::Document::load_mem(&artifact.bytes).unwrap();
    let page_id = *doc.get_pages().get(&1).unwrap();
    let page = doc.get_dictionary(page_id).unwrap();
    let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
    assert_eq!(media_box[3].as_i64().unwrap(), 792);
}

#[tokio::test]
async fn test_split_into_directory_refuses_to_clobber() {
    let output_dir = TempDir::new().unwrap();

    let mut session = Session::new(Mode::Split);
    session
        .select(vec![selected_pdf("doc.pdf", &["1", "2"])])
        .unwrap();

    let mut sink = DirectorySink::new(output_dir.path(), OverwriteMode::NoClobber);
    session.process(&mut sink).await.unwrap();
    assert!(output_dir.path().join("doc_pagina_1.pdf").exists());
    assert!(output_dir.path().join("doc_pagina_2.pdf").exists());

    let err = session.process(&mut sink).await.unwrap_err();
    assert!(matches!(err.root_cause(), PdfMillError::OutputExists { .. }));
    assert_eq!(
        session.last_error(),
        Some("Error al procesar los archivos PDF.")
    );
}

#[tokio::test]
async fn test_split_requires_one_document() {
    let mut session = Session::new(Mode::Split);
    let err = session.process(&mut MemorySink::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "Necesitas al menos 1 archivo PDF para separar");
}
