//! Integration tests for the images-to-pdf pipeline.

use lopdf::{Dictionary, Document};
use pdfmill::config::{IMAGES_FILE_NAME, Mode, PageLayout, PageSize, ProcessOptions};
use pdfmill::intake::SelectedFile;
use pdfmill::io::MemorySink;
use pdfmill::{PdfMillError, Session};
use tempfile::TempDir;

use crate::common::{cmyk_jpeg_bytes, jpeg_bytes, png_bytes, write_fixture};

fn image_of_page<'a>(doc: &'a Document, page: &Dictionary) -> &'a Dictionary {
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let image_id = xobjects.get(b"Im1").unwrap().as_reference().unwrap();
    &doc.get_object(image_id).unwrap().as_stream().unwrap().dict
}

#[tokio::test]
async fn test_two_images_make_two_pages() {
    let mut session = Session::new(Mode::ImagesToPdf);
    session
        .select(vec![
            SelectedFile::from_bytes("foto.jpg", "image/jpeg", jpeg_bytes(64, 32)),
            SelectedFile::from_bytes("logo.png", "image/png", png_bytes(16, 16, true)),
        ])
        .unwrap();

    let mut sink = MemorySink::new();
    let report = session.process(&mut sink).await.unwrap();
    assert_eq!(report.artifacts[0].file_name, IMAGES_FILE_NAME);
    assert_eq!(report.artifacts[0].page_count, 2);

    let doc = Document::load_mem(&sink.artifacts()[0].bytes).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 2);

    let first = doc.get_dictionary(pages[&1]).unwrap();
    let jpeg = image_of_page(&doc, first);
    assert_eq!(jpeg.get(b"Subtype").unwrap().as_name().unwrap(), b"Image");
    assert_eq!(jpeg.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
    assert_eq!(jpeg.get(b"Width").unwrap().as_i64().unwrap(), 64);

    let second = doc.get_dictionary(pages[&2]).unwrap();
    let png = image_of_page(&doc, second);
    assert_eq!(png.get(b"Width").unwrap().as_i64().unwrap(), 16);
    assert!(png.has(b"SMask"));

    let media_box = first.get(b"MediaBox").unwrap().as_array().unwrap();
    assert!((media_box[2].as_float().unwrap() - 595.28).abs() < 0.01);
    assert!((media_box[3].as_float().unwrap() - 841.89).abs() < 0.01);
}

#[tokio::test]
async fn test_images_from_disk_with_letter_layout() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "scan.png", &png_bytes(100, 300, false));

    let options = ProcessOptions {
        compress: false,
        layout: PageLayout::new(PageSize::Letter),
    };
    let mut session = Session::new(Mode::ImagesToPdf)
        .with_options(options)
        .unwrap();
    session
        .select(vec![SelectedFile::from_path(&path).await.unwrap()])
        .unwrap();

    let mut sink = MemorySink::new();
    session.process(&mut sink).await.unwrap();

    let doc = Document::load_mem(&sink.artifacts()[0].bytes).unwrap();
    let page_id = doc.get_pages()[&1];
    let page = doc.get_dictionary(page_id).unwrap();
    let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
    assert_eq!(media_box[2].as_float().unwrap(), 612.0);
    assert!(!image_of_page(&doc, page).has(b"SMask"));
}

#[tokio::test]
async fn test_cmyk_jpeg_keeps_its_color_space() {
    let mut session = Session::new(Mode::ImagesToPdf);
    session
        .select(vec![SelectedFile::from_bytes(
            "imprenta.jpg",
            "image/jpeg",
            cmyk_jpeg_bytes(24, 12),
        )])
        .unwrap();

    let mut sink = MemorySink::new();
    session.process(&mut sink).await.unwrap();

    let doc = Document::load_mem(&sink.artifacts()[0].bytes).unwrap();
    let page = doc.get_dictionary(doc.get_pages()[&1]).unwrap();
    let image = image_of_page(&doc, page);
    assert_eq!(
        image.get(b"ColorSpace").unwrap().as_name().unwrap(),
        b"DeviceCMYK"
    );
    assert_eq!(image.get(b"Decode").unwrap().as_array().unwrap().len(), 8);
    assert_eq!(image.get(b"Width").unwrap().as_i64().unwrap(), 24);
}

#[tokio::test]
async fn test_unsupported_image_reports_generic_message() {
    let mut session = Session::new(Mode::ImagesToPdf);
    session
        .select(vec![
            SelectedFile::from_bytes("ok.png", "image/png", png_bytes(4, 4, false)),
            SelectedFile::from_bytes("anim.gif", "image/gif", b"GIF89a\x01\x00".to_vec()),
        ])
        .unwrap();

    let mut sink = MemorySink::new();
    let err = session.process(&mut sink).await.unwrap_err();

    assert_eq!(err.to_string(), "Error al procesar las imágenes.");
    assert!(matches!(
        err.root_cause(),
        PdfMillError::UnsupportedImage { .. }
    ));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_pdf_batch_rejected_in_image_mode() {
    let mut session = Session::new(Mode::ImagesToPdf);
    let err = session
        .select(vec![SelectedFile::from_bytes(
            "doc.pdf",
            "application/pdf",
            b"%PDF-1.5".to_vec(),
        )])
        .unwrap_err();

    assert_eq!(err.to_string(), "Por favor selecciona solo imágenes válidas");
    assert!(session.items().is_empty());
}
