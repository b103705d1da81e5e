//! Extraction backends and their registry.
//!
//! | Kind | Alias | Engine |
//! |------|-------|--------|
//! | `document-pipeline` | `docling` | `docling` CLI, TableFormer fast mode |
//! | `vision-model` | `ollama` | vision-language model behind Ollama |
//! | `cv-ocr` | `img2table` | ruled-line detection + `tesseract` |
//!
//! The set is closed: [`BackendKind`] names a backend, [`Backend`] is a
//! configured instance of one. Adding a backend means one variant in each
//! plus a registry entry in [`BackendKind::ALL`].

pub mod cv_ocr;
pub mod document_pipeline;
pub mod vision_model;

use crate::config::ExtractionConfig;
use crate::error::TableExtractError;
use crate::pages::PageSet;
use crate::pipeline::engine::Engine;
use crate::table::Table;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

pub use cv_ocr::CvOcrBackend;
pub use document_pipeline::DocumentPipelineBackend;
pub use vision_model::VisionModelBackend;

/// Names of the available extraction strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BackendKind {
    CvOcr,
    DocumentPipeline,
    VisionModel,
}

impl BackendKind {
    /// Every backend, sorted by name.
    pub const ALL: [BackendKind; 3] = [
        BackendKind::CvOcr,
        BackendKind::DocumentPipeline,
        BackendKind::VisionModel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BackendKind::CvOcr => "cv-ocr",
            BackendKind::DocumentPipeline => "document-pipeline",
            BackendKind::VisionModel => "vision-model",
        }
    }

    /// Short name accepted wherever a backend name is.
    pub fn alias(self) -> &'static str {
        match self {
            BackendKind::CvOcr => "img2table",
            BackendKind::DocumentPipeline => "docling",
            BackendKind::VisionModel => "ollama",
        }
    }

    /// External executable this backend needs, if any.
    ///
    /// The vision model is reached over HTTP and is probed at extraction
    /// time instead.
    pub fn dependency(self) -> Option<&'static str> {
        match self {
            BackendKind::CvOcr => Some("tesseract"),
            BackendKind::DocumentPipeline => Some("docling"),
            BackendKind::VisionModel => None,
        }
    }

    pub fn install_hint(self) -> &'static str {
        match self {
            BackendKind::CvOcr => cv_ocr::INSTALL_HINT,
            BackendKind::DocumentPipeline => document_pipeline::INSTALL_HINT,
            BackendKind::VisionModel => "Install Ollama from https://ollama.com, then: ollama serve",
        }
    }

    /// Comma-separated list of valid names, for error messages.
    pub fn available() -> String {
        Self::ALL
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether the backend's external engine can be run.
    ///
    /// Runs `<engine> --version` with the binary configured in `config`.
    pub async fn is_available(self, config: &ExtractionConfig) -> bool {
        let bin = match self {
            BackendKind::CvOcr => &config.tesseract_bin,
            BackendKind::DocumentPipeline => &config.docling_bin,
            BackendKind::VisionModel => return true,
        };
        let engine = Engine {
            name: self.dependency().unwrap_or(self.name()),
            bin,
            install_hint: self.install_hint(),
        };
        engine.probe().await
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = TableExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(wanted) || k.alias().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TableExtractError::UnknownBackend {
                name: s.to_string(),
                available: Self::available(),
            })
    }
}

/// A configured backend.
#[derive(Clone)]
pub enum Backend {
    DocumentPipeline(DocumentPipelineBackend),
    VisionModel(VisionModelBackend),
    CvOcr(CvOcrBackend),
}

impl Backend {
    pub fn from_config(
        kind: BackendKind,
        config: &ExtractionConfig,
    ) -> Result<Self, TableExtractError> {
        Ok(match kind {
            BackendKind::DocumentPipeline => {
                Backend::DocumentPipeline(DocumentPipelineBackend::new(config))
            }
            BackendKind::VisionModel => Backend::VisionModel(VisionModelBackend::new(config)?),
            BackendKind::CvOcr => Backend::CvOcr(CvOcrBackend::new(config)),
        })
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::DocumentPipeline(_) => BackendKind::DocumentPipeline,
            Backend::VisionModel(_) => BackendKind::VisionModel,
            Backend::CvOcr(_) => BackendKind::CvOcr,
        }
    }

    /// Extract every table from `path`, restricted to `pages` (0-indexed)
    /// when given. Pages past the end of the document are skipped.
    pub async fn extract(
        &self,
        path: &Path,
        pages: Option<&PageSet>,
    ) -> Result<Vec<Table>, TableExtractError> {
        info!("Extracting with {} from {}", self.kind(), path.display());
        match self {
            Backend::DocumentPipeline(b) => b.extract(path, pages).await,
            Backend::VisionModel(b) => b.extract(path, pages).await,
            Backend::CvOcr(b) => b.extract(path, pages).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_aliases_resolve() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.name().parse::<BackendKind>().unwrap(), kind);
            assert_eq!(kind.alias().parse::<BackendKind>().unwrap(), kind);
        }
        assert_eq!(
            " Docling ".parse::<BackendKind>().unwrap(),
            BackendKind::DocumentPipeline
        );
    }

    #[test]
    fn unknown_name_lists_every_backend() {
        let err = "magic".parse::<BackendKind>().unwrap_err();
        match err {
            TableExtractError::UnknownBackend { name, available } => {
                assert_eq!(name, "magic");
                assert_eq!(available, "cv-ocr, document-pipeline, vision-model");
            }
            other => panic!("expected UnknownBackend, got {other:?}"),
        }
    }

    #[test]
    fn registry_is_sorted_by_name() {
        let names: Vec<&str> = BackendKind::ALL.iter().map(|k| k.name()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn only_http_backend_has_no_dependency() {
        assert_eq!(BackendKind::VisionModel.dependency(), None);
        assert_eq!(BackendKind::CvOcr.dependency(), Some("tesseract"));
        assert!(BackendKind::DocumentPipeline.install_hint().contains("pip install docling"));
    }

    #[tokio::test]
    async fn availability_follows_the_configured_binary() {
        let config = ExtractionConfig::builder()
            .docling_bin("/definitely/not/here/docling")
            .tesseract_bin("/definitely/not/here/tesseract")
            .build()
            .unwrap();
        assert!(!BackendKind::DocumentPipeline.is_available(&config).await);
        assert!(!BackendKind::CvOcr.is_available(&config).await);
        assert!(BackendKind::VisionModel.is_available(&config).await);
    }

    #[test]
    fn from_config_builds_every_kind() {
        let config = ExtractionConfig::default();
        for kind in BackendKind::ALL {
            assert_eq!(Backend::from_config(kind, &config).unwrap().kind(), kind);
        }
    }
}
