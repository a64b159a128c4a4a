//! Image to single-page PDF.
//!
//! The image is decoded, flattened to 8-bit RGB (alpha is dropped) and
//! re-encoded as JPEG, which PDF embeds natively through `DCTDecode`. The
//! page is one point per pixel, so a 640×480 image gives a 640×480 pt page.

use crate::error::FileError;
use crate::output::ConversionResult;
use crate::pipeline::intake::pdf_name;
use image::{DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;
use tracing::debug;

/// Decode the upload. Used for the preview as well as the conversion.
pub fn decode(file: &str, bytes: &[u8]) -> Result<DynamicImage, FileError> {
    image::load_from_memory(bytes).map_err(|e| FileError::Decode {
        file: file.to_string(),
        detail: format!("Could not decode image: {e}"),
    })
}

/// Convert a `.jpg`/`.png` upload to a PDF download named `<stem>.pdf`.
pub fn convert(file: &str, bytes: &[u8]) -> Result<ConversionResult, FileError> {
    let img = decode(file, bytes)?;
    let pdf = image_to_pdf(file, img)?;
    Ok(ConversionResult {
        file_name: pdf_name(file),
        mime_type: "application/pdf".to_string(),
        bytes: pdf,
    })
}

fn image_to_pdf(file: &str, img: DynamicImage) -> Result<Vec<u8>, FileError> {
    let ser_err = |detail: String| FileError::Serialize {
        file: file.to_string(),
        detail,
    };

    let rgb = img.to_rgb8();
    let (w, h) = (i64::from(rgb.width()), i64::from(rgb.height()));
    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .map_err(|e| ser_err(format!("JPEG encoding failed: {e}")))?;

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => w,
                "Height" => h,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false),
    );

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_bytes = content
        .encode()
        .map_err(|e| ser_err(format!("PDF content error: {e}")))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ser_err(format!("PDF save error: {e}")))?;
    debug!("{}: {}x{} image → {} bytes PDF", file, w, h, out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn png(img: DynamicImage) -> Vec<u8> {
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
        out
    }

    fn media_box(pdf: &[u8]) -> Vec<i64> {
        let doc = Document::load_mem(pdf).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        doc.get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_i64().unwrap())
            .collect()
    }

    #[test]
    fn page_matches_pixel_size() {
        let bytes = png(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            40,
            30,
            Rgb([200, 10, 10]),
        )));
        let result = convert("photo.png", &bytes).unwrap();
        assert_eq!(result.file_name, "photo.pdf");
        assert_eq!(result.mime_type, "application/pdf");
        assert!(result.bytes.starts_with(b"%PDF"));
        assert_eq!(media_box(&result.bytes), vec![0, 0, 40, 30]);
    }

    #[test]
    fn alpha_is_flattened() {
        let bytes = png(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            8,
            8,
            Rgba([0, 0, 255, 128]),
        )));
        let result = convert("logo.PNG", &bytes).unwrap();
        assert_eq!(result.file_name, "logo.pdf");
        assert_eq!(media_box(&result.bytes), vec![0, 0, 8, 8]);
    }

    #[test]
    fn undecodable_bytes_are_decode_error() {
        let err = convert("fake.jpg", b"definitely not a jpeg").unwrap_err();
        assert!(matches!(err, FileError::Decode { .. }));
        assert_eq!(err.file(), "fake.jpg");
    }
}
