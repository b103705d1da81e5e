//! Error types for the table-extract library.
//!
//! Two error types cover two different stages:
//!
//! * [`TableExtractError`]: everything that can stop an extraction once it
//!   has been requested: missing input, unknown backend, an external engine
//!   that is not installed or not reachable, or a failure inside that engine.
//!   Every backend returns it from `extract`, and the CLI reports it once at
//!   the top level.
//!
//! * [`PageSpecError`]: a malformed `--pages` value. It is raised before any
//!   extraction starts and is returned as-is, never wrapped.

use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by an extraction.
#[derive(Debug, Error)]
pub enum TableExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// The backend name is not in the registry.
    #[error("Unknown backend '{name}'. Available: {available}")]
    UnknownBackend { name: String, available: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Dependency errors ─────────────────────────────────────────────────
    /// An external engine could not be spawned or loaded.
    #[error("{dependency} is not installed. {hint}")]
    DependencyMissing { dependency: String, hint: String },

    // ── Vision-model endpoint errors ──────────────────────────────────────
    /// Nothing is listening at the model-serving endpoint.
    #[error("Cannot connect to Ollama at {url}. Is Ollama running? Start it with: ollama serve")]
    ServiceUnreachable { url: String },

    /// The endpoint accepted the connection but did not answer in time.
    #[error("Ollama at {url} is not responding. Is Ollama running? Start it with: ollama serve")]
    ServiceNotResponding { url: String },

    /// Any other request failure (non-2xx status, request timeout, broken body).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The model endpoint answered with a body we cannot use.
    #[error("Unexpected response from model endpoint: {detail}")]
    UnexpectedResponse { detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not open the document.
    #[error("PDF '{}' could not be opened: {detail}", path.display())]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Decoding the input image or encoding a page image failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    // ── Engine errors ─────────────────────────────────────────────────────
    /// An external engine ran but exited unsuccessfully.
    #[error("{engine} failed ({status}): {stderr}")]
    EngineFailed {
        engine: String,
        status: String,
        stderr: String,
    },

    /// An external engine succeeded but its output could not be read.
    #[error("Could not read {engine} output: {detail}")]
    EngineOutput { engine: String, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Writing or reading CSV failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing to the output sink or a temp directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A malformed page specification such as `"1-x"` or `"5-2"`.
#[derive(Debug, Error)]
pub enum PageSpecError {
    /// A token is not a number.
    #[error("invalid page number '{token}'")]
    InvalidNumber {
        token: String,
        #[source]
        source: ParseIntError,
    },

    /// Pages are 1-indexed.
    #[error("page 0 is invalid (pages start at 1)")]
    ZeroPage,

    /// `start-end` with `end < start`.
    #[error("invalid page range '{start}-{end}': start must be <= end")]
    ReversedRange { start: usize, end: usize },
}
