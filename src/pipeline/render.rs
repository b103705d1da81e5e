//! PDF rasterisation: render selected pages to `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! All pdfium work runs on a blocking-pool thread. Rendered pages are handed
//! back one at a time over a channel of capacity one, so a long document
//! never holds more than a page or two of 300 DPI bitmaps in memory.
//!
//! ## Locating pdfium
//!
//! `PDFIUM_LIB_PATH` (a library file or the directory holding it) wins,
//! then a library next to the working directory, then the system library.

use crate::error::TableExtractError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

const PDFIUM_HINT: &str = "Set PDFIUM_LIB_PATH to an existing libpdfium, or install a build \
from https://github.com/bblanchon/pdfium-binaries into the system library path.";

/// A rendered page: 0-based index and bitmap.
pub type RenderedPage = (usize, DynamicImage);

/// Bind to the pdfium shared library.
pub fn bind_pdfium() -> Result<Pdfium, TableExtractError> {
    let from_env = std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from);

    let bindings = match from_env {
        Some(path) => {
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from PDFIUM_LIB_PATH: {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    };

    bindings
        .map(Pdfium::new)
        .map_err(|e| TableExtractError::DependencyMissing {
            dependency: "pdfium".to_string(),
            hint: format!("{PDFIUM_HINT} ({e:?})"),
        })
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
) -> Result<PdfDocument<'a>, TableExtractError> {
    pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| TableExtractError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })
}

/// Number of pages in a PDF.
pub async fn page_count(pdf_path: &Path) -> Result<usize, TableExtractError> {
    let path = pdf_path.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = open_document(&pdfium, &path)?;
        let total = document.pages().len() as usize;
        info!("PDF loaded: {} pages", total);
        Ok(total)
    })
    .await
    .map_err(|e| TableExtractError::Internal(format!("Page-count task panicked: {}", e)))?
}

/// Rasterise the given 0-based page indices at `dpi`, in order.
///
/// The indices must already be within the document; see
/// [`crate::PageSet::within`]. Pages arrive on the returned channel as they
/// are rendered. A failure is sent as the last item.
pub fn render_pages(
    pdf_path: &Path,
    dpi: u32,
    page_indices: Vec<usize>,
) -> mpsc::Receiver<Result<RenderedPage, TableExtractError>> {
    let path = pdf_path.to_path_buf();
    let (tx, rx) = mpsc::channel(1);

    tokio::task::spawn_blocking(move || {
        if let Err(e) = render_pages_blocking(&path, dpi, &page_indices, &tx) {
            let _ = tx.blocking_send(Err(e));
        }
    });

    rx
}

/// Blocking implementation of page rendering.
///
/// Stops quietly when the receiver has been dropped.
fn render_pages_blocking(
    pdf_path: &Path,
    dpi: u32,
    page_indices: &[usize],
    tx: &mpsc::Sender<Result<RenderedPage, TableExtractError>>,
) -> Result<(), TableExtractError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path)?;
    let pages = document.pages();

    let render_config =
        PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / POINTS_PER_INCH);

    for &idx in page_indices {
        let page_index = PdfPageIndex::try_from(idx).map_err(|_| {
            TableExtractError::RasterisationFailed {
                page: idx + 1,
                detail: "page index exceeds pdfium's limit".to_string(),
            }
        })?;

        let page = pages
            .get(page_index)
            .map_err(|e| TableExtractError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            TableExtractError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        if tx.blocking_send(Ok((idx, image))).is_err() {
            debug!("Render receiver dropped; stopping after page {}", idx + 1);
            break;
        }
    }

    Ok(())
}
