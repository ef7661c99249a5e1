//! Images-to-PDF pipeline.
//!
//! Two embedding paths exist, picked by the item's declared content type:
//! JPEG data is passed through untouched as a `DCTDecode` stream, and
//! everything else is decoded as PNG and re-encoded as Flate-compressed
//! RGB with an optional soft mask for the alpha channel.

use std::io::{Cursor, Write};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::codecs::jpeg::JpegDecoder;
use image::{ImageDecoder, ImageFormat};
use lopdf::{Object, ObjectId, Stream, dictionary};
use tokio::task;
use tracing::debug;

use crate::collection::PendingItem;
use crate::config::{IMAGES_FILE_NAME, PageLayout, ProcessOptions};
use crate::error::{PdfMillError, Result};
use crate::io::{Artifact, ArtifactSink, DeliveredArtifact};
use crate::pipeline::pages::OutputDocument;
use crate::pipeline::writer_for;

/// Resource name of the image on its page.
const IMAGE_RESOURCE: &str = "Im1";

/// Where an image is drawn on its page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge.
    pub x: f32,
    /// Bottom edge.
    pub y: f32,
    /// Drawn width.
    pub width: f32,
    /// Drawn height.
    pub height: f32,
}

/// Scale an image uniformly so it fits the page minus the margin, and
/// center it.
///
/// The scale is the smaller of the two axis ratios, so whichever dimension
/// is the binding constraint fills its available extent exactly. Small
/// images are scaled up.
pub fn fit_image(image_width: f32, image_height: f32, layout: &PageLayout) -> Placement {
    let available_width = layout.width - layout.margin;
    let available_height = layout.height - layout.margin;
    let scale = (available_width / image_width).min(available_height / image_height);

    let width = image_width * scale;
    let height = image_height * scale;

    Placement {
        x: (layout.width - width) / 2.0,
        y: (layout.height - height) / 2.0,
        width,
        height,
    }
}

/// Whether a content type selects the JPEG embedding path.
pub fn is_jpeg(content_type: &str) -> bool {
    content_type.contains("jpeg") || content_type.contains("jpg")
}

/// Number of color components declared by the first JPEG frame header.
///
/// Walks the marker segments up to the start of scan. Returns `None` when
/// no frame header is found or the data is truncated.
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    if bytes.get(..2)? != [0xFF, 0xD8] {
        return None;
    }

    let mut pos = 2;
    loop {
        if *bytes.get(pos)? != 0xFF {
            return None;
        }
        // Fill bytes may pad any marker.
        while *bytes.get(pos + 1)? == 0xFF {
            pos += 1;
        }
        let marker = *bytes.get(pos + 1)?;

        match marker {
            0xD9 | 0xDA => return None,
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                // length (2), precision (1), height (2), width (2), components
                return bytes.get(pos + 9).copied();
            }
            _ => {}
        }

        let length = u16::from_be_bytes([*bytes.get(pos + 2)?, *bytes.get(pos + 3)?]) as usize;
        pos += 2 + length;
    }
}

/// An image ready to be added to a document.
#[derive(Debug)]
struct EmbeddedImage {
    width: u32,
    height: u32,
    image: Stream,
    soft_mask: Option<Stream>,
}

impl EmbeddedImage {
    fn decode(name: &str, content_type: &str, bytes: Vec<u8>) -> Result<Self> {
        let embedded = if is_jpeg(content_type) {
            Self::from_jpeg(name, bytes)?
        } else {
            Self::from_png(name, &bytes)?
        };

        if embedded.width == 0 || embedded.height == 0 {
            return Err(PdfMillError::unsupported_image(name, "image has no pixels"));
        }
        Ok(embedded)
    }

    fn from_jpeg(name: &str, bytes: Vec<u8>) -> Result<Self> {
        let decoder = JpegDecoder::new(Cursor::new(bytes.as_slice()))
            .map_err(|e| PdfMillError::unsupported_image(name, e.to_string()))?;
        let (width, height) = decoder.dimensions();

        // The decoder converts CMYK to RGB, so the declared color type does
        // not describe the stream. The frame header does.
        let components = jpeg_components(&bytes).ok_or_else(|| {
            PdfMillError::unsupported_image(name, "JPEG has no frame header")
        })?;

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        };
        match components {
            1 => dict.set("ColorSpace", "DeviceGray"),
            3 => dict.set("ColorSpace", "DeviceRGB"),
            4 => {
                dict.set("ColorSpace", "DeviceCMYK");
                // Adobe writes CMYK JPEGs inverted.
                dict.set(
                    "Decode",
                    Object::Array([1, 0, 1, 0, 1, 0, 1, 0].into_iter().map(Object::from).collect()),
                );
            }
            other => {
                return Err(PdfMillError::unsupported_image(
                    name,
                    format!("unsupported JPEG component count {other}"),
                ));
            }
        }

        let mut image = Stream::new(dict, bytes);
        image.allows_compression = false;

        Ok(Self {
            width,
            height,
            image,
            soft_mask: None,
        })
    }

    fn from_png(name: &str, bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .map_err(|e| PdfMillError::unsupported_image(name, e.to_string()))?;
        let (width, height) = (decoded.width(), decoded.height());

        let (rgb, alpha) = if decoded.color().has_alpha() {
            let rgba = decoded.to_rgba8();
            let mut rgb = Vec::with_capacity((width * height * 3) as usize);
            let mut alpha = Vec::with_capacity((width * height) as usize);
            for pixel in rgba.pixels() {
                rgb.extend_from_slice(&pixel.0[..3]);
                alpha.push(pixel.0[3]);
            }
            (rgb, Some(alpha))
        } else {
            (decoded.to_rgb8().into_raw(), None)
        };

        let soft_mask = alpha
            .map(|alpha| flate_image(name, width, height, "DeviceGray", &alpha))
            .transpose()?;
        let image = flate_image(name, width, height, "DeviceRGB", &rgb)?;

        Ok(Self {
            width,
            height,
            image,
            soft_mask,
        })
    }
}

/// Build a Flate-compressed 8-bit image XObject.
fn flate_image(
    name: &str,
    width: u32,
    height: u32,
    color_space: &str,
    samples: &[u8],
) -> Result<Stream> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(samples)
        .map_err(|e| PdfMillError::unsupported_image(name, e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| PdfMillError::unsupported_image(name, e.to_string()))?;

    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        compressed,
    );
    stream.allows_compression = false;
    Ok(stream)
}

/// Add a page showing `embedded`, fitted to `layout`.
fn add_image_page(
    output: &mut OutputDocument,
    embedded: EmbeddedImage,
    layout: &PageLayout,
) -> ObjectId {
    let placement = fit_image(embedded.width as f32, embedded.height as f32, layout);
    let doc = output.document_mut();

    let mut image = embedded.image;
    if let Some(soft_mask) = embedded.soft_mask {
        let mask_id = doc.add_object(soft_mask);
        image.dict.set("SMask", mask_id);
    }
    let image_id = doc.add_object(image);

    let content = format!(
        "q {:.4} 0 0 {:.4} {:.4} {:.4} cm /{IMAGE_RESOURCE} Do Q",
        placement.width, placement.height, placement.x, placement.y
    );
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    output.append_page(dictionary! {
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(layout.width),
            Object::Real(layout.height),
        ],
        "Resources" => dictionary! {
            "XObject" => dictionary! { IMAGE_RESOURCE => image_id },
        },
        "Contents" => content_id,
    })
}

/// Place every image on its own page of a single document.
pub(crate) async fn images_to_pdf<S>(
    items: &[PendingItem],
    options: &ProcessOptions,
    sink: &mut S,
) -> Result<Vec<DeliveredArtifact>>
where
    S: ArtifactSink + ?Sized,
{
    let mut output = OutputDocument::new();

    for item in items {
        let bytes = item.payload.read().await?;
        let name = item.display_name.clone();
        let content_type = item.content_type.clone();

        let embedded = task::spawn_blocking(move || EmbeddedImage::decode(&name, &content_type, bytes))
            .await
            .map_err(|e| PdfMillError::other(format!("Decode task failed: {e}")))??;

        debug!(
            name = %item.display_name,
            width = embedded.width,
            height = embedded.height,
            jpeg = is_jpeg(&item.content_type),
            "embedding image"
        );
        add_image_page(&mut output, embedded, &options.layout);
    }

    let page_count = output.page_count();
    let bytes = writer_for(options)
        .serialize_async(output.into_document())
        .await?;

    let delivered = sink.deliver(Artifact {
        file_name: IMAGES_FILE_NAME.to_string(),
        bytes,
        page_count,
    })
    .await?;

    Ok(vec![delivered])
}
