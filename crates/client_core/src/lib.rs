use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{
    domain::{AnalysisRequest, UploadCandidate},
    error::detail_message,
    report::AnalysisReport,
};
use tracing::warn;
use url::Url;

pub mod error;
pub mod export;
pub mod progress;
pub mod session;

pub use error::{ErrorKind, SessionError};
pub use export::{ExportedReport, REPORT_FILENAME};
pub use progress::{ProgressReporter, ProgressSchedule, ProgressStage, ProgressUpdate};
pub use session::{AnalysisSession, SessionOptions, SessionSnapshot, SessionState};

use error::GENERIC_FAILURE_MESSAGE;

pub const DEFAULT_ANALYZER_URL: &str =
    "https://ipo-analyser-server.vercel.app/api/v1/ipo/analyze";
/// Multipart field the analyzer reads the document from.
pub const UPLOAD_FIELD_NAME: &str = "rhp";
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[async_trait]
pub trait AnalyzerBackend: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisReport, SessionError>;
}

pub struct MissingAnalyzerBackend;

#[async_trait]
impl AnalyzerBackend for MissingAnalyzerBackend {
    async fn analyze(&self, _request: AnalysisRequest) -> Result<AnalysisReport, SessionError> {
        Err(SessionError::remote("analyzer endpoint is not configured", None))
    }
}

/// Talks to the remote analyzer over HTTP.
pub struct HttpAnalyzer {
    http: Client,
    endpoint: Url,
}

impl HttpAnalyzer {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_timeout(endpoint, None)
    }

    /// `timeout` bounds the whole request. `None` waits for as long as the
    /// analyzer takes.
    pub fn with_timeout(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("invalid analyzer url '{endpoint}'"))?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl AnalyzerBackend for HttpAnalyzer {
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisReport, SessionError> {
        let candidate = request.into_candidate();
        let filename = candidate.name().to_string();
        let mime_type = candidate.mime_type().to_string();
        let part = Part::bytes(candidate.into_contents())
            .file_name(filename)
            .mime_str(&mime_type)
            .map_err(SessionError::transport)?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                warn!(endpoint = %self.endpoint, error = %err, "analyzer unreachable");
                SessionError::transport(err)
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(SessionError::transport)?;
        if !status.is_success() {
            let message =
                detail_message(&body).unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
            return Err(SessionError::remote(message, Some(status.as_u16())));
        }

        Ok(AnalysisReport::from_json_slice(&body)?)
    }
}

/// Reads a document from disk, guessing its media type from the extension.
pub async fn candidate_from_path(path: &Path) -> Result<UploadCandidate> {
    let contents = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MIME_TYPE);
    Ok(UploadCandidate::new(name, mime_type, contents))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
