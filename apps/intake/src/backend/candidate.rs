use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{info, warn};

use super::{decode, BackendError, HttpBackend};
use crate::models::candidate::{CandidateRecord, StoreResponse};

/// Candidate persistence, keyed by organization id.
///
/// `create_or_update` is idempotent per organization: submitting twice for
/// the same organization updates the one record instead of adding another.
/// Any 2xx counts as stored; the record is `None` when the backend neither
/// echoed it nor returns it on a re-read.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn get_by_organization(
        &self,
        org_id: i64,
    ) -> Result<Option<CandidateRecord>, BackendError>;

    async fn create_or_update(
        &self,
        submission: CandidateSubmission,
    ) -> Result<Option<CandidateRecord>, BackendError>;
}

/// An uploaded image held for submission.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl StagedImage {
    /// `data:` URL rendering of the file for immediate previewing.
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            STANDARD.encode(&self.bytes)
        )
    }
}

/// Everything sent in one `candidate/store` multipart request.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSubmission {
    pub org_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub country: Option<i64>,
    pub state: Option<i64>,
    pub city: Option<i64>,
    pub pincode: String,
    /// Previously stored image reference, sent when no new file is staged.
    pub image_ref: Option<String>,
    pub image: Option<StagedImage>,
}

impl CandidateSubmission {
    /// Text fields in the order the backend form expects them.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let id = |v: Option<i64>| v.map(|v| v.to_string()).unwrap_or_default();
        let mut fields = vec![
            ("org_id", self.org_id.to_string()),
            ("name", self.name.clone()),
            ("email", self.email.clone()),
            ("phone", self.phone.clone()),
            ("address", self.address.clone()),
            ("country", id(self.country)),
            ("state", id(self.state)),
            ("city", id(self.city)),
            ("pincode", self.pincode.clone()),
        ];
        if self.image.is_none() {
            fields.push(("img", self.image_ref.clone().unwrap_or_default()));
        }
        fields
    }

    fn into_form(self) -> Result<Form, BackendError> {
        let mut form = Form::new();
        for (name, value) in self.text_fields() {
            form = form.text(name, value);
        }
        if let Some(image) = self.image {
            let part = Part::bytes(image.bytes.to_vec())
                .file_name(image.file_name)
                .mime_str(&image.content_type)?;
            form = form.part("img", part);
        }
        Ok(form)
    }
}

pub struct HttpCandidateStore {
    backend: HttpBackend,
}

impl HttpCandidateStore {
    pub fn new(backend: HttpBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl CandidateStore for HttpCandidateStore {
    async fn get_by_organization(
        &self,
        org_id: i64,
    ) -> Result<Option<CandidateRecord>, BackendError> {
        let value: Value = self
            .backend
            .get_json(&format!("candidate/byOrg/{org_id}"), &[])
            .await?;

        // The backend answers `null`, `{}` or `[]` when the organization has no candidate.
        match value {
            Value::Null => Ok(None),
            Value::Object(ref map) if map.is_empty() => Ok(None),
            Value::Array(ref items) if items.is_empty() => Ok(None),
            other => Ok(Some(serde_json::from_value(other)?)),
        }
    }

    async fn create_or_update(
        &self,
        submission: CandidateSubmission,
    ) -> Result<Option<CandidateRecord>, BackendError> {
        let org_id = submission.org_id;
        let form = submission.into_form()?;

        let response = self
            .backend
            .client()
            .post(self.backend.url("candidate/store"))
            .multipart(form)
            .send()
            .await?;

        let body = StoreResponse::from_body(decode(response).await?);
        info!(
            "Candidate stored for org {}: {}",
            org_id,
            body.message.as_deref().unwrap_or("ok")
        );

        if body.candidate.is_some() {
            return Ok(body.candidate);
        }
        match self.get_by_organization(org_id).await {
            Ok(record) => Ok(record),
            Err(e) => {
                warn!("Stored candidate for org {org_id} could not be re-read: {e}");
                Ok(None)
            }
        }
    }
}
