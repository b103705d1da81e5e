//! Image encoding: `DynamicImage` → base64 PNG for the model endpoint.
//!
//! Ollama's `/api/generate` takes images as bare base64 strings in the
//! `images` array (no data-URI prefix). PNG keeps rendered text crisp;
//! JPEG artefacts around glyphs measurably hurt cell transcription.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// PNG-encode a page image and wrap it in base64.
pub fn encode_page(img: &DynamicImage) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(b64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let b64 = encode_page(&img).expect("encode should succeed");
        let decoded = STANDARD.decode(&b64).expect("valid base64");
        assert_eq!(&decoded[1..4], b"PNG");
        let back = image::load_from_memory(&decoded).expect("valid png");
        assert_eq!((back.width(), back.height()), (10, 10));
    }
}
