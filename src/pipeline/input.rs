//! Input classification: is this a PDF or a single image?
//!
//! The file extension decides first. Files with an unfamiliar extension are
//! sniffed for the `%PDF` magic bytes, and anything that is not a PDF is
//! handed to the image decoder, which reports its own error if the bytes
//! are not an image either.

use crate::error::TableExtractError;
use image::DynamicImage;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Extensions treated as single-page images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "tif", "bmp", "webp"];

/// What kind of document a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Image,
}

impl InputKind {
    pub fn detect(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let kind = match ext.as_deref() {
            Some("pdf") => InputKind::Pdf,
            Some(e) if IMAGE_EXTENSIONS.contains(&e) => InputKind::Image,
            _ if has_pdf_magic(path) => InputKind::Pdf,
            _ => InputKind::Image,
        };
        debug!("Input {} classified as {:?}", path.display(), kind);
        kind
    }
}

pub fn is_pdf(path: &Path) -> bool {
    InputKind::detect(path) == InputKind::Pdf
}

fn has_pdf_magic(path: &Path) -> bool {
    let mut magic = [0u8; 4];
    std::fs::File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .is_ok_and(|()| &magic == b"%PDF")
}

/// Decode a single image file.
pub async fn load_image(path: &Path) -> Result<DynamicImage, TableExtractError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || image::open(&path))
        .await
        .map_err(|e| TableExtractError::Internal(format!("Image decode task panicked: {e}")))?
        .map_err(TableExtractError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn extension_decides() {
        assert_eq!(InputKind::detect(Path::new("a/report.PDF")), InputKind::Pdf);
        assert_eq!(InputKind::detect(Path::new("scan.jpeg")), InputKind::Image);
        assert_eq!(InputKind::detect(Path::new("scan.TIF")), InputKind::Image);
    }

    #[test]
    fn unknown_extension_is_sniffed() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("download.bin");
        std::fs::write(&pdf, b"%PDF-1.7\n...").unwrap();
        let other = dir.path().join("picture");
        std::fs::write(&other, b"\x89PNG....").unwrap();

        assert!(is_pdf(&pdf));
        assert!(!is_pdf(&other));
        assert!(!is_pdf(&dir.path().join("missing")));
    }

    #[tokio::test]
    async fn load_image_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("px.png");
        image::RgbImage::from_pixel(3, 2, image::Rgb([0, 0, 0]))
            .save(&path)
            .unwrap();
        let img = load_image(&path).await.unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
    }

    #[tokio::test]
    async fn load_image_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(
            load_image(&path).await,
            Err(TableExtractError::Image(_))
        ));
    }
}
