//! Page images for the image-based backends.
//!
//! A PDF yields one image per selected page, rasterised lazily; a single
//! image file yields itself once, without page provenance.

use crate::error::TableExtractError;
use crate::pages::PageSet;
use crate::pipeline::input::{self, InputKind};
use crate::pipeline::render::{self, RenderedPage};
use image::DynamicImage;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::warn;

/// One unit of work for an image backend.
#[derive(Debug)]
pub struct PageImage {
    /// 0-based PDF page, `None` for a plain image.
    pub page: Option<usize>,
    pub image: DynamicImage,
}

enum Source {
    Pdf(mpsc::Receiver<Result<RenderedPage, TableExtractError>>),
    Image(Option<DynamicImage>),
}

/// Ordered page images for one document.
pub struct PageImages {
    source: Source,
    total: usize,
    yielded: usize,
}

/// 0-based pages to render, ascending. Requested pages past the end of the
/// document are skipped with a warning.
fn select_pages(pages: Option<&PageSet>, total_pages: usize) -> Vec<usize> {
    let Some(set) = pages else {
        return (0..total_pages).collect();
    };
    for skipped in set.iter().filter(|&p| p >= total_pages) {
        warn!(
            "Skipping page {} (out of range, total={})",
            skipped + 1,
            total_pages
        );
    }
    set.within(total_pages)
}

impl PageImages {
    /// Open `path`, restricting PDFs to `pages` when given.
    ///
    /// Requested pages past the end of the document are skipped with a
    /// warning. The page filter is ignored for images.
    pub async fn open(
        path: &Path,
        pages: Option<&PageSet>,
        dpi: u32,
    ) -> Result<Self, TableExtractError> {
        match InputKind::detect(path) {
            InputKind::Pdf => {
                let total_pages = render::page_count(path).await?;
                let indices = select_pages(pages, total_pages);
                let total = indices.len();
                Ok(Self {
                    source: Source::Pdf(render::render_pages(path, dpi, indices)),
                    total,
                    yielded: 0,
                })
            }
            InputKind::Image => {
                if pages.is_some() {
                    warn!("Page filter ignored for image input {}", path.display());
                }
                let image = input::load_image(path).await?;
                Ok(Self {
                    source: Source::Image(Some(image)),
                    total: 1,
                    yielded: 0,
                })
            }
        }
    }

    /// Number of page images this source will yield.
    pub fn total(&self) -> usize {
        self.total
    }

    /// The next page image, or `None` when all have been yielded.
    pub async fn next(&mut self) -> Option<Result<PageImage, TableExtractError>> {
        let item = match &mut self.source {
            Source::Image(slot) => slot.take().map(|image| Ok(PageImage { page: None, image })),
            Source::Pdf(rx) => match rx.recv().await {
                Some(Ok((idx, image))) => Some(Ok(PageImage {
                    page: Some(idx),
                    image,
                })),
                Some(Err(e)) => Some(Err(e)),
                None if self.yielded < self.total => {
                    let missing = self.total - self.yielded;
                    self.total = self.yielded;
                    Some(Err(TableExtractError::Internal(format!(
                        "Render task stopped with {missing} page(s) outstanding"
                    ))))
                }
                None => None,
            },
        };

        if matches!(item, Some(Ok(_))) {
            self.yielded += 1;
        }
        item
    }
}
