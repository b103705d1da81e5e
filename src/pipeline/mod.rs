//! Building blocks shared by the extraction backends.
//!
//! Each submodule does one job and is tested on its own; the backends in
//! [`crate::backends`] wire them together.
//!
//! ## Data Flow
//!
//! ```text
//! vision-model:       input ──▶ source ──▶ encode ──▶ ollama ──▶ response
//!                                 (render)
//! cv-ocr:             input ──▶ source ──▶ grid ──▶ engine ──▶ ocr
//!                                 (render)            (tesseract)
//! document-pipeline:  engine (docling) ──▶ JSON document
//! ```
//!
//! 1. [`input`]: tell PDFs from images and decode images
//! 2. [`render`]: rasterise selected PDF pages; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`source`]: one stream of page images over either input kind, one
//!    page in memory at a time
//! 4. [`encode`]: PNG-encode and base64-wrap a page for the model request
//! 5. [`ollama`]: the HTTP client for the model-serving endpoint
//! 6. [`response`]: turn the model's CSV-ish reply into tables
//! 7. [`grid`]: find ruled tables and their cells in a page image
//! 8. [`engine`]: run external executables (docling, tesseract)
//! 9. [`ocr`]: read tesseract's word boxes and place them in cells

pub mod encode;
pub mod engine;
pub mod grid;
pub mod input;
pub mod ocr;
pub mod ollama;
pub mod render;
pub mod response;
pub mod source;
