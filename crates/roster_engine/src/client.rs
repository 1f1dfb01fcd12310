use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use roster_logging::{preview, roster_info, roster_warn};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::feed::{run_feed, FeedSink};
use crate::{FailureKind, FeedSummary, ImportError};

const IMPORT_PATH: &str = "admin/teams/import";

/// Who we talk to. Passed explicitly to every request; nothing is read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub base_url: String,
    pub auth_token: Option<String>,
}

impl AdminSession {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, ImportError> {
        let mut base = Url::parse(&self.base_url)
            .map_err(|err| ImportError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path)
            .map_err(|err| ImportError::new(FailureKind::InvalidUrl, err.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub session: AdminSession,
    pub connect_timeout: Duration,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            session: AdminSession::new("http://127.0.0.1:8008"),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Serialize)]
struct ImportRequest<'a> {
    import_type: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    detail: Option<String>,
}

#[async_trait::async_trait]
pub trait Importer: Send + Sync {
    /// Starts a batch import and feeds its progress stream into `sink`.
    async fn import_batch(
        &self,
        content: &str,
        sink: &dyn FeedSink,
        cancel: &CancellationToken,
    ) -> Result<FeedSummary, ImportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestImporter {
    settings: ImportSettings,
}

impl ReqwestImporter {
    pub fn new(settings: ImportSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, ImportError> {
        // No overall timeout: a batch can stream for as long as the server keeps working.
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .build()
            .map_err(|err| ImportError::new(FailureKind::Network, err.to_string()))
    }
}

#[async_trait::async_trait]
impl Importer for ReqwestImporter {
    async fn import_batch(
        &self,
        content: &str,
        sink: &dyn FeedSink,
        cancel: &CancellationToken,
    ) -> Result<FeedSummary, ImportError> {
        let session = &self.settings.session;
        let url = session.endpoint(IMPORT_PATH)?;
        let body = serde_json::to_vec(&ImportRequest {
            import_type: "batch",
            content,
        })
        .map_err(|err| ImportError::new(FailureKind::Request, err.to_string()))?;
        let client = self.build_client()?;

        let mut request = client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/x-ndjson")
            .body(body);
        if let Some(token) = session.auth_token.as_deref() {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        roster_info!("Starting batch import at {} ({} bytes)", url, content.len());
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Ok(FeedSummary { cancelled: true, ..FeedSummary::default() });
            }
            response = request.send() => response.map_err(map_reqwest_error)?,
        };

        let status = response.status();
        if !status.is_success() {
            let message = read_error_message(response).await.unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            roster_warn!("Batch import rejected with {}: {}", status, message);
            return Err(ImportError::new(
                FailureKind::HttpStatus(status.as_u16()),
                message,
            ));
        }

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(map_reqwest_error));
        run_feed(chunks, sink, cancel).await
    }
}

/// Pulls `error` or `detail` out of a JSON error body.
async fn read_error_message(response: reqwest::Response) -> Option<String> {
    let bytes = response.bytes().await.ok()?;
    match serde_json::from_slice::<ErrorBody>(&bytes) {
        Ok(body) => body.error.or(body.detail),
        Err(_) => {
            let text = String::from_utf8_lossy(&bytes);
            let text = text.trim();
            (!text.is_empty()).then(|| preview(text, 200).to_string())
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ImportError {
    if err.is_timeout() {
        return ImportError::new(FailureKind::Timeout, err.to_string());
    }
    ImportError::new(FailureKind::Network, err.to_string())
}
