/// Scoring client — the single point of entry for all calls to the external
/// resume scoring service.
///
/// ARCHITECTURAL RULE: No other module may talk to the scoring service directly.
/// Everything else depends on the `ScoringService` trait so it can be exercised
/// against in-memory doubles.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::analysis::MatchRecord;
use crate::models::criteria::AnalyzeForm;
use crate::models::resume::Resume;

const RESUMES_PATH: &str = "/resumes/";
const ANALYZE_ALL_PATH: &str = "/analyze-all/";
const UPLOAD_RESUME_PATH: &str = "/upload-resume/";

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Scoring service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The operations the matcher needs from the scoring service.
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// `GET /resumes/`
    async fn list_resumes(&self) -> Result<Vec<Resume>, ScoringError>;

    /// `POST /analyze-all/`: one round trip covering every stored resume.
    async fn analyze_all(&self, form: &AnalyzeForm) -> Result<Vec<MatchRecord>, ScoringError>;

    /// `POST /upload-resume/`
    async fn upload_resume(&self, file_name: &str, contents: Vec<u8>)
        -> Result<Resume, ScoringError>;
}

/// FastAPI-style error body: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    detail: serde_json::Value,
}

/// HTTP implementation of `ScoringService`.
#[derive(Clone)]
pub struct ScoringClient {
    client: Client,
    base_url: String,
}

impl ScoringClient {
    pub fn new(base_url: String, request_timeout: Duration) -> Result<Self, ScoringError> {
        Ok(Self {
            client: Client::builder().timeout(request_timeout).build()?,
            base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Rejects non-success responses and decodes the body as `T`.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ScoringError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ServiceErrorBody>(&body)
                .map(|e| match e.detail {
                    serde_json::Value::String(detail) => detail,
                    other => other.to_string(),
                })
                .unwrap_or(body);
            warn!("Scoring service returned {}: {}", status, message);
            return Err(ScoringError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Scoring service returned {} ({} bytes)", status, body.len());
        serde_json::from_str(&body).map_err(ScoringError::Parse)
    }
}

#[async_trait]
impl ScoringService for ScoringClient {
    async fn list_resumes(&self) -> Result<Vec<Resume>, ScoringError> {
        let response = self.client.get(self.url(RESUMES_PATH)).send().await?;
        Self::decode(response).await
    }

    async fn analyze_all(&self, form: &AnalyzeForm) -> Result<Vec<MatchRecord>, ScoringError> {
        let body = form
            .fields()
            .into_iter()
            .fold(multipart::Form::new(), |body, (name, value)| {
                body.text(name, value.to_string())
            });

        let response = self
            .client
            .post(self.url(ANALYZE_ALL_PATH))
            .multipart(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn upload_resume(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<Resume, ScoringError> {
        let part = multipart::Part::bytes(contents).file_name(file_name.to_string());
        let body = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url(UPLOAD_RESUME_PATH))
            .multipart(body)
            .send()
            .await?;
        Self::decode(response).await
    }
}
