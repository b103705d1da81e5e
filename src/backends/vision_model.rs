//! Vision-model backend: page images sent to a local Ollama model.
//!
//! ```text
//! probe /api/tags ──▶ page images ──▶ for each page: PNG → base64
//!                                       ──▶ /api/generate ──▶ parse CSV reply
//! ```
//!
//! Pages are handled strictly one after another; any failed request aborts
//! the extraction.

use crate::config::ExtractionConfig;
use crate::error::TableExtractError;
use crate::pages::PageSet;
use crate::pipeline::encode::encode_page;
use crate::pipeline::ollama::OllamaClient;
use crate::pipeline::response::parse_csv_response;
use crate::pipeline::source::PageImages;
use crate::progress::ProgressCallback;
use crate::prompts::EXTRACT_PROMPT;
use crate::table::Table;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Extracts tables by asking a vision-language model for CSV.
#[derive(Clone)]
pub struct VisionModelBackend {
    client: OllamaClient,
    model: String,
    dpi: u32,
    progress: ProgressCallback,
}

impl VisionModelBackend {
    pub fn new(config: &ExtractionConfig) -> Result<Self, TableExtractError> {
        let client = OllamaClient::new(
            config.ollama_url.clone(),
            Duration::from_secs(config.probe_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self {
            client,
            model: config.model.clone(),
            dpi: config.dpi,
            progress: config.progress.clone(),
        })
    }

    pub async fn extract(
        &self,
        path: &Path,
        pages: Option<&PageSet>,
    ) -> Result<Vec<Table>, TableExtractError> {
        self.client.check_reachable().await?;
        info!("Ollama reachable at {}, model {}", self.client.base_url(), self.model);

        let mut images = PageImages::open(path, pages, self.dpi).await?;
        let total = images.total();
        self.progress.on_extraction_start("vision-model", total);

        let mut tables = Vec::new();
        let mut n = 0;
        while let Some(page) = images.next().await {
            let page = page?;
            n += 1;
            self.progress.on_page_start(n, total);

            let b64 = encode_page(&page.image)?;
            drop(page.image);
            let reply = self.client.generate(&self.model, EXTRACT_PROMPT, b64).await?;

            let found = parse_csv_response(&reply);
            debug!("Page {}/{}: {} table(s)", n, total, found.len());
            self.progress.on_page_complete(n, total, found.len());

            tables.extend(found.into_iter().map(|t| match page.page {
                Some(p) => t.on_page(p),
                None => t,
            }));
        }

        self.progress.on_extraction_complete(tables.len());
        Ok(tables)
    }
}
