//! HTTP side-channel that ships a subject's documents to the analysis backend.

use std::time::Duration;

use esg_session::{SessionId, SubjectDocument, UploadCoordinator, UploadOutcome};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::upload_retry::{error_body_excerpt, UploadRetryPolicy, RETRY_ATTEMPT_HEADER};
use crate::SessionEvent;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
/// Body of a successful upload response.
pub struct UploadReceipt {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to create upload client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("upload requires at least one document")]
    NoDocuments,
    #[error("upload request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("upload endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode upload response: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadClientConfig {
    pub upload_url: String,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

#[derive(Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    upload_url: String,
    retry: UploadRetryPolicy,
}

impl UploadClient {
    pub fn new(config: &UploadClientConfig) -> Result<Self, UploadError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("esg-insight-upload"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .map_err(UploadError::Client)?;

        Ok(Self {
            http,
            upload_url: config.upload_url.trim().to_string(),
            retry: UploadRetryPolicy::new(config.retry_max_attempts, config.retry_base_delay_ms),
        })
    }

    /// Posts `company_name` plus one `files` part per document. Rate limits,
    /// server errors, connect failures and timeouts are retried with backoff.
    pub async fn upload(
        &self,
        company_name: &str,
        documents: &[SubjectDocument],
    ) -> Result<UploadReceipt, UploadError> {
        if documents.is_empty() {
            return Err(UploadError::NoDocuments);
        }

        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = self
                .http
                .post(&self.upload_url)
                .header(RETRY_ATTEMPT_HEADER, attempt.saturating_sub(1).to_string())
                .multipart(build_upload_form(company_name, documents))
                .send()
                .await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<UploadReceipt>()
                            .await
                            .map_err(UploadError::Decode);
                    }

                    let delay = self
                        .retry
                        .after_status(attempt, status.as_u16(), response.headers());
                    let body = response.text().await.unwrap_or_default();
                    if let Some(delay) = delay {
                        debug!(attempt, status = status.as_u16(), "retrying document upload");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Err(UploadError::Status {
                        status: status.as_u16(),
                        body: error_body_excerpt(&body),
                    });
                }
                Err(error) => {
                    if let Some(delay) = self.retry.after_transport_error(attempt, &error) {
                        debug!(attempt, %error, "retrying document upload");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(UploadError::Transport(error));
                }
            }
        }
    }
}

fn build_upload_form(company_name: &str, documents: &[SubjectDocument]) -> Form {
    documents.iter().fold(
        Form::new().text("company_name", company_name.to_string()),
        |form, document| {
            form.part(
                "files",
                Part::bytes(document.bytes.clone()).file_name(document.file_name.clone()),
            )
        },
    )
}

/// Runs each upload on the current tokio runtime and reports the outcome back
/// to the session loop.
pub struct HttpUploadCoordinator {
    client: UploadClient,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl HttpUploadCoordinator {
    pub fn new(client: UploadClient, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { client, events }
    }
}

impl UploadCoordinator for HttpUploadCoordinator {
    fn dispatch(&mut self, session_id: SessionId, subject: &str, documents: Vec<SubjectDocument>) {
        let events = self.events.clone();
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(error) => {
                let _ = events.send(SessionEvent::UploadFinished {
                    session_id,
                    outcome: UploadOutcome::Rejected {
                        reason: error.to_string(),
                    },
                });
                return;
            }
        };

        let client = self.client.clone();
        let subject = subject.to_string();
        runtime.spawn(async move {
            let outcome = match client.upload(&subject, &documents).await {
                Ok(receipt) => UploadOutcome::Accepted {
                    files: receipt.files,
                },
                Err(error) => UploadOutcome::Rejected {
                    reason: error.to_string(),
                },
            };
            let _ = events.send(SessionEvent::UploadFinished {
                session_id,
                outcome,
            });
        });
    }
}
