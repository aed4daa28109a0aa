use serde::{Deserialize, Serialize};

use super::{de_id, de_opt_id, de_text};

/// A candidate as stored by the backend, one per organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub org_id: Option<i64>,
    #[serde(default, deserialize_with = "de_text")]
    pub name: String,
    #[serde(default, deserialize_with = "de_text")]
    pub email: String,
    #[serde(default, deserialize_with = "de_text")]
    pub phone: String,
    #[serde(default, deserialize_with = "de_text")]
    pub address: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub country: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub state: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub city: Option<i64>,
    #[serde(default, deserialize_with = "de_text")]
    pub pincode: String,
    #[serde(default)]
    pub img_url: Option<String>,
}

/// Body of a successful `candidate/store` call.
#[derive(Debug, Default, Deserialize)]
pub struct StoreResponse {
    #[serde(default)]
    pub candidate: Option<CandidateRecord>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StoreResponse {
    /// Reads whatever a 2xx reply carried; bodies of another shape are empty.
    pub fn from_body(body: serde_json::Value) -> Self {
        serde_json::from_value(body).unwrap_or_default()
    }
}

/// Body the backend sends alongside a failed call.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
