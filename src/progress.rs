//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress`] to receive events as
//! the image backends work through each page. The document-pipeline backend
//! hands the whole file to one external process, so it reports only the
//! start and end of the extraction.
//!
//! # Example
//!
//! ```rust
//! use table_extract::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     tables: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, tables_found: usize) {
//!         self.tables.fetch_add(tables_found, Ordering::SeqCst);
//!         eprintln!("Page {}/{}: {} table(s)", page_num, total_pages, tables_found);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { tables: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the backends as they process each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Pages are processed one at a time, but the
/// callback may be invoked from a blocking worker thread, hence
/// `Send + Sync`.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any page is processed.
    ///
    /// # Arguments
    /// * `backend`     — backend name, e.g. `"cv-ocr"`
    /// * `total_pages` — pages that will be processed (`1` for an image,
    ///   `0` when the engine processes the document as a whole)
    fn on_extraction_start(&self, backend: &str, total_pages: usize) {
        let _ = (backend, total_pages);
    }

    /// Called before a page is sent to the engine.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — pages in this run
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page has been processed.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, tables_found: usize) {
        let _ = (page_num, total_pages, tables_found);
    }

    /// Called once after the backend has returned its tables.
    fn on_extraction_complete(&self, tables_found: usize) {
        let _ = tables_found;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
