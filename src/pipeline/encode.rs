//! Image encoding: `DynamicImage` → base64 PNG text for the request body.
//!
//! Ollama's `generate` endpoint takes images as bare base64 strings (no
//! `data:` URI prefix). PNG keeps rendered glyph edges intact; JPEG
//! artefacts around thin strokes measurably hurt transcription.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// A page image serialised as PNG and wrapped in standard base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Wrap base64 text produced elsewhere. The content is not validated.
    pub fn from_base64(b64: impl Into<String>) -> Self {
        Self(b64.into())
    }

    /// The base64 text exactly as it goes on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode back to the PNG byte stream.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Encode a rasterised page as base64 PNG.
pub fn encode_page(img: &DynamicImage) -> Result<EncodedImage, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes PNG, {} bytes base64", buf.len(), b64.len());

    Ok(EncodedImage(b64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn gradient() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(17, 9, |x, y| {
            Rgb([(x * 15) as u8, (y * 28) as u8, ((x + y) * 7) as u8])
        }))
    }

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let data = encode_page(&img).expect("encode should succeed");
        assert!(!data.is_empty());

        let png = data.to_png_bytes().expect("valid base64");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn round_trip_is_pixel_identical() {
        let img = gradient();
        let data = encode_page(&img).unwrap();

        let png = data.to_png_bytes().unwrap();
        let decoded = image::load_from_memory_with_format(&png, image::ImageFormat::Png).unwrap();

        assert_eq!(decoded.width(), img.width());
        assert_eq!(decoded.height(), img.height());
        assert_eq!(decoded.to_rgb8().into_raw(), img.to_rgb8().into_raw());
    }

    #[test]
    fn encoding_is_deterministic() {
        let img = gradient();
        assert_eq!(encode_page(&img).unwrap(), encode_page(&img).unwrap());
    }

    #[test]
    fn uses_standard_alphabet_with_padding() {
        let data = encode_page(&gradient()).unwrap();
        assert_eq!(data.len() % 4, 0);
        assert!(!data.as_str().contains('-') && !data.as_str().contains('_'));
    }
}
