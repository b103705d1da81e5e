//! # table-extract
//!
//! Extract tables from PDF documents and page images into CSV.
//!
//! ## Backends
//!
//! Three interchangeable strategies sit behind one call:
//!
//! | Backend | Alias | How it works | Needs |
//! |---------|-------|--------------|-------|
//! | `document-pipeline` | `docling` | layout model + table-structure recognition | `docling` on `PATH` |
//! | `vision-model` | `ollama` | page image → local vision model → CSV reply | a running Ollama server |
//! | `cv-ocr` | `img2table` | ruled-line detection + OCR per cell | `tesseract` on `PATH` |
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / image
//!  │
//!  ├─ 1. Check    input exists, backend name resolves
//!  ├─ 2. Render   rasterise selected pages via pdfium (spawn_blocking)
//!  ├─ 3. Extract  docling JSON / model CSV reply / grid + tesseract words
//!  ├─ 4. Flatten  header rows first, then data rows; cells are strings
//!  └─ 5. Output   CSV (first table, or all separated by a blank line) or JSON
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use table_extract::{extract_tables, parse_page_spec, tables_to_csv, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let pages = parse_page_spec("1-3")?;
//!     let tables = extract_tables("report.pdf", "cv-ocr", pages.as_ref(), &config).await?;
//!     print!("{}", tables_to_csv(&tables, true)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `table-extract` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! table-extract = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backends;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pages;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod table;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backends::{Backend, BackendKind};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{PageSpecError, TableExtractError};
pub use extract::{extract_tables, extract_tables_sync};
pub use output::{tables_to_csv, tables_to_json, write_csv};
pub use pages::{parse_page_spec, PageSet};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback};
pub use table::{Frame, Row, Table};
