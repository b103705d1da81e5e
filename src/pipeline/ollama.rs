//! Ollama HTTP client: reachability probe and single-image generation.
//!
//! Only two endpoints are used:
//!
//! | Call | Endpoint | Timeout |
//! |------|----------|---------|
//! | [`OllamaClient::check_reachable`] | `GET /api/tags` | probe timeout (5 s) |
//! | [`OllamaClient::generate`] | `POST /api/generate` | request timeout (120 s) |
//!
//! There is no retry. A local model that fails once on a page will fail
//! again; the error goes straight back to the caller.

use crate::error::TableExtractError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Request body for `/api/generate`.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub images: Vec<String>,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Client for one Ollama endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    probe_timeout: Duration,
    request_timeout: Duration,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        probe_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, TableExtractError> {
        let base_url: String = base_url.into();
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            probe_timeout,
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/tags`, distinguishing "nothing listening" from "no answer".
    pub async fn check_reachable(&self) -> Result<(), TableExtractError> {
        let url = format!("{}/api/tags", self.base_url);
        debug!("Probing {}", url);

        let response = self
            .http
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    TableExtractError::ServiceUnreachable {
                        url: self.base_url.clone(),
                    }
                } else if e.is_timeout() {
                    TableExtractError::ServiceNotResponding {
                        url: self.base_url.clone(),
                    }
                } else {
                    TableExtractError::Http(e)
                }
            })?;

        response.error_for_status()?;
        Ok(())
    }

    /// `POST /api/generate` with one base64 PNG; returns the `response` text.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        image_b64: String,
    ) -> Result<String, TableExtractError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model,
            prompt,
            images: vec![image_b64],
            stream: false,
        };

        let start = Instant::now();
        let response = self
            .http
            .post(&url)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        let parsed: GenerateResponse =
            serde_json::from_slice(&bytes).map_err(|e| TableExtractError::UnexpectedResponse {
                detail: format!("body is not JSON: {e}"),
            })?;

        let text = parsed
            .response
            .ok_or_else(|| TableExtractError::UnexpectedResponse {
                detail: "missing 'response' field".to_string(),
            })?;

        debug!(
            "Model {} answered {} chars in {:?}",
            model,
            text.len(),
            start.elapsed()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let body = GenerateRequest {
            model: "gemma3",
            prompt: "p",
            images: vec!["AAAA".into()],
            stream: false,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "model": "gemma3",
                "prompt": "p",
                "images": ["AAAA"],
                "stream": false
            })
        );
    }

    #[test]
    fn base_url_is_normalised() {
        let c = OllamaClient::new(
            "http://localhost:11434///",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(c.base_url(), "http://localhost:11434");
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let c = OllamaClient::new(
            format!("http://127.0.0.1:{port}"),
            Duration::from_secs(2),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = c.check_reachable().await.unwrap_err();
        assert!(
            matches!(err, TableExtractError::ServiceUnreachable { .. }),
            "got: {err:?}"
        );
    }
}
