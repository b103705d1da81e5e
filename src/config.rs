//! Configuration types for table extraction.
//!
//! Every backend reads its settings from one [`ExtractionConfig`], built via
//! [`ExtractionConfigBuilder`]. Backends take only what they need; the rest
//! is ignored, so a single config can be reused across backends.

use crate::error::TableExtractError;
use crate::progress::{ExtractionProgressCallback, NoopProgressCallback};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "gemma3";

/// Configuration for one extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use table_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("llava")
///     .ollama_url("http://gpu-box:11434")
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "llava");
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Vision model name sent to `/api/generate`. Default: `gemma3`.
    pub model: String,

    /// Base URL of the Ollama endpoint. Default: `http://localhost:11434`.
    pub ollama_url: String,

    /// Rasterisation resolution for PDF pages. Range: 72–600. Default: 300.
    ///
    /// Small table text needs the full 300; lower values are mostly useful
    /// for quick tests.
    pub dpi: u32,

    /// Timeout for the `/api/tags` reachability probe. Default: 5.
    pub probe_timeout_secs: u64,

    /// Timeout for each `/api/generate` call. Default: 120.
    pub request_timeout_secs: u64,

    /// `docling` executable. Default: `docling` (looked up on `PATH`).
    pub docling_bin: PathBuf,

    /// `tesseract` executable. Default: `tesseract`.
    pub tesseract_bin: PathBuf,

    /// Tesseract language code(s), e.g. `eng` or `deu+eng`. Default: `eng`.
    pub ocr_lang: String,

    /// Page-level progress notifications. Default: no-op.
    pub progress: Arc<dyn ExtractionProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            dpi: 300,
            probe_timeout_secs: 5,
            request_timeout_secs: 120,
            docling_bin: PathBuf::from("docling"),
            tesseract_bin: PathBuf::from("tesseract"),
            ocr_lang: "eng".to_string(),
            progress: Arc::new(NoopProgressCallback),
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("ollama_url", &self.ollama_url)
            .field("dpi", &self.dpi)
            .field("probe_timeout_secs", &self.probe_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("docling_bin", &self.docling_bin)
            .field("tesseract_bin", &self.tesseract_bin)
            .field("ocr_lang", &self.ocr_lang)
            .field("progress", &"<dyn ExtractionProgressCallback>")
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Trailing slashes are dropped so paths can be appended verbatim.
    pub fn ollama_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.config.ollama_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn probe_timeout_secs(mut self, secs: u64) -> Self {
        self.config.probe_timeout_secs = secs;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn docling_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.config.docling_bin = bin.into();
        self
    }

    pub fn tesseract_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.config.tesseract_bin = bin.into();
        self
    }

    pub fn ocr_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_lang = lang.into();
        self
    }

    pub fn progress(mut self, callback: Arc<dyn ExtractionProgressCallback>) -> Self {
        self.config.progress = callback;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, TableExtractError> {
        let c = &self.config;
        if !(72..=600).contains(&c.dpi) {
            return Err(TableExtractError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.model.trim().is_empty() {
            return Err(TableExtractError::InvalidConfig(
                "Model name must not be empty".into(),
            ));
        }
        if !(c.ollama_url.starts_with("http://") || c.ollama_url.starts_with("https://")) {
            return Err(TableExtractError::InvalidConfig(format!(
                "Ollama URL must start with http:// or https://, got '{}'",
                c.ollama_url
            )));
        }
        if c.probe_timeout_secs == 0 || c.request_timeout_secs == 0 {
            return Err(TableExtractError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.ocr_lang.trim().is_empty() {
            return Err(TableExtractError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ExtractionConfig::default();
        assert_eq!(c.model, "gemma3");
        assert_eq!(c.ollama_url, "http://localhost:11434");
        assert_eq!(c.dpi, 300);
        assert_eq!(c.probe_timeout_secs, 5);
        assert_eq!(c.request_timeout_secs, 120);
        assert_eq!(c.ocr_lang, "eng");
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let c = ExtractionConfig::builder()
            .ollama_url("http://127.0.0.1:9999/")
            .build()
            .unwrap();
        assert_eq!(c.ollama_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn build_rejects_bad_values() {
        for builder in [
            ExtractionConfig::builder().dpi(10),
            ExtractionConfig::builder().model("  "),
            ExtractionConfig::builder().ollama_url("localhost:11434"),
            ExtractionConfig::builder().probe_timeout_secs(0),
            ExtractionConfig::builder().ocr_lang(""),
        ] {
            assert!(matches!(
                builder.build(),
                Err(TableExtractError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn debug_hides_callback() {
        let s = format!("{:?}", ExtractionConfig::default());
        assert!(s.contains("<dyn ExtractionProgressCallback>"));
    }
}
