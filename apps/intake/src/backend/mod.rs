//! HTTP collaborators: the REST backend that owns locations, candidates and
//! timesheet data. Every call to that backend goes through [`HttpBackend`].

use std::time::Duration;

use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::candidate::ErrorBody;

pub mod candidate;
pub mod location;
pub mod module;
pub mod timesheet;

pub use candidate::{CandidateStore, CandidateSubmission, HttpCandidateStore, StagedImage};
pub use location::{HttpLocationResolver, LocationResolver};
pub use module::{HttpModuleDirectory, ModuleDirectory};
pub use timesheet::{HttpTimesheetSource, TimesheetSource};

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl BackendError {
    /// The message the backend itself attached to the failure, if any.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            BackendError::Api { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Shared reqwest client bound to the backend base URL.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GETs `path` and decodes the JSON body.
    /// Retries on 429 and 5xx with exponential backoff; lookups are safe to repeat.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let url = self.url(path);
        let mut last_error: Option<BackendError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // 250ms, 500ms
                let delay = Duration::from_millis(250 * (1 << (attempt - 1)));
                warn!(
                    "GET {} attempt {} failed, retrying after {}ms...",
                    url,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.get(&url).query(query).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(BackendError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("GET {} returned {}: {}", url, status, body);
                last_error = Some(BackendError::Api {
                    status: status.as_u16(),
                    message: error_message(&body),
                });
                continue;
            }

            let value = decode(response).await?;
            debug!("GET {} succeeded", url);
            return Ok(value);
        }

        Err(last_error.unwrap_or(BackendError::Api {
            status: 503,
            message: format!("gave up after {MAX_RETRIES} attempts"),
        }))
    }

    /// Sends `body` as JSON with `method` and decodes the reply. Writes are
    /// not retried.
    pub async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let response = self
            .client
            .request(method.clone(), &url)
            .json(body)
            .send()
            .await?;
        let value = decode(response).await?;
        debug!("{} {} succeeded", method, url);
        Ok(value)
    }
}

/// Decodes a response body, turning non-2xx statuses into [`BackendError::Api`].
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(BackendError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    // Some endpoints answer an empty body where they mean "nothing".
    let body = if body.trim().is_empty() { "null" } else { body.as_str() };
    serde_json::from_str(body).map_err(BackendError::Parse)
}

/// Pulls `message` out of a JSON error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
