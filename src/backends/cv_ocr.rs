//! CV/OCR backend: ruled-grid detection plus tesseract.
//!
//! Each page image is searched for bordered tables; pages with at least one
//! table are written to a temporary PNG and OCR'd once, and the recognised
//! words are dropped into the detected cells. Borderless tables are not
//! detected.

use crate::config::ExtractionConfig;
use crate::error::TableExtractError;
use crate::pages::PageSet;
use crate::pipeline::engine::Engine;
use crate::pipeline::grid::{self, DetectedTable};
use crate::pipeline::ocr;
use crate::pipeline::source::{PageImage, PageImages};
use crate::progress::ProgressCallback;
use crate::table::{Frame, Table};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

pub(crate) const INSTALL_HINT: &str =
    "Install with: apt install tesseract-ocr (Debian/Ubuntu) or brew install tesseract (macOS)";

/// Extracts bordered tables with classical line detection and OCR.
#[derive(Clone)]
pub struct CvOcrBackend {
    tesseract_bin: PathBuf,
    lang: String,
    dpi: u32,
    progress: ProgressCallback,
}

impl CvOcrBackend {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            tesseract_bin: config.tesseract_bin.clone(),
            lang: config.ocr_lang.clone(),
            dpi: config.dpi,
            progress: config.progress.clone(),
        }
    }

    fn engine(&self) -> Engine<'_> {
        Engine {
            name: "tesseract",
            bin: &self.tesseract_bin,
            install_hint: INSTALL_HINT,
        }
    }

    pub async fn extract(
        &self,
        path: &Path,
        pages: Option<&PageSet>,
    ) -> Result<Vec<Table>, TableExtractError> {
        let mut images = PageImages::open(path, pages, self.dpi).await?;
        let total = images.total();
        self.progress.on_extraction_start("cv-ocr", total);

        let work_dir = TempDir::new()?;
        let mut tables = Vec::new();
        let mut n = 0;
        while let Some(page) = images.next().await {
            let page = page?;
            n += 1;
            self.progress.on_page_start(n, total);

            let found = self.extract_page(page, &work_dir).await?;
            debug!("Page {}/{}: {} table(s)", n, total, found.len());
            self.progress.on_page_complete(n, total, found.len());
            tables.extend(found);
        }

        self.progress.on_extraction_complete(tables.len());
        Ok(tables)
    }

    async fn extract_page(
        &self,
        page: PageImage,
        work_dir: &TempDir,
    ) -> Result<Vec<Table>, TableExtractError> {
        let PageImage { page, image } = page;
        let png = work_dir.path().join("page.png");

        let png_out = png.clone();
        let detected = tokio::task::spawn_blocking(move || {
            let detected = grid::detect_tables(&image);
            if !detected.is_empty() {
                image.save_with_format(&png_out, ImageFormat::Png)?;
            }
            Ok::<_, TableExtractError>(detected)
        })
        .await
        .map_err(|e| TableExtractError::Internal(format!("Grid detection task panicked: {e}")))??;

        if detected.is_empty() {
            return Ok(Vec::new());
        }

        let words = ocr::recognise(&self.engine(), &png, &self.lang).await?;
        Ok(tables_from_grids(&detected, &words, page))
    }
}

/// One table per detected grid; grids whose cells are all blank are dropped.
pub(crate) fn tables_from_grids(
    detected: &[DetectedTable],
    words: &[ocr::OcrWord],
    page: Option<usize>,
) -> Vec<Table> {
    detected
        .iter()
        .map(|grid| Frame::unlabelled(ocr::cell_texts(grid, words)))
        .filter(|frame| !frame.is_empty() && !frame.is_blank())
        .map(|frame| {
            let table = frame.into_table();
            match page {
                Some(p) => table.on_page(p),
                None => table,
            }
        })
        .collect()
}
