//! Extraction entry points.
//!
//! [`extract_tables`] is the one call most callers need: it checks the
//! input, resolves a backend by name and runs it. Use
//! [`Backend::from_config`](crate::backends::Backend::from_config) directly
//! to reuse one configured backend across many documents.

use crate::backends::{Backend, BackendKind};
use crate::config::ExtractionConfig;
use crate::error::TableExtractError;
use crate::pages::PageSet;
use crate::table::Table;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Extract every table from a PDF or image.
///
/// # Arguments
/// * `path` — Local PDF or image file
/// * `backend` — Backend name or alias (`cv-ocr`, `docling`, `ollama`, …)
/// * `pages` — 0-indexed pages to keep; `None` for all. Ignored for images.
/// * `config` — Extraction configuration
///
/// # Errors
/// - `FileNotFound` when `path` does not exist, checked before the backend
///   name is looked at
/// - `UnknownBackend` for an unrecognised name
/// - whatever the backend itself reports (missing engine, unreachable
///   service, corrupt PDF, …)
pub async fn extract_tables(
    path: impl AsRef<Path>,
    backend: &str,
    pages: Option<&PageSet>,
    config: &ExtractionConfig,
) -> Result<Vec<Table>, TableExtractError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(TableExtractError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let kind: BackendKind = backend.parse()?;
    let backend = Backend::from_config(kind, config)?;

    let start = Instant::now();
    let tables = backend.extract(path, pages).await?;
    info!(
        "{} found {} table(s) in {}ms",
        kind,
        tables.len(),
        start.elapsed().as_millis()
    );
    Ok(tables)
}

/// Blocking wrapper around [`extract_tables`].
///
/// Creates its own Tokio runtime, so it must not be called from inside one.
pub fn extract_tables_sync(
    path: impl AsRef<Path>,
    backend: &str,
    pages: Option<&PageSet>,
    config: &ExtractionConfig,
) -> Result<Vec<Table>, TableExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TableExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_tables(path, backend, pages, config))
}
