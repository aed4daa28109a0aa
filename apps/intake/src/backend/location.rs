use async_trait::async_trait;

use super::{BackendError, HttpBackend};
use crate::models::location::LocationOption;

/// Resolves the country → state → city hierarchy.
/// Any list may legitimately come back empty.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn countries(&self) -> Result<Vec<LocationOption>, BackendError>;
    async fn states_of(&self, country_id: i64) -> Result<Vec<LocationOption>, BackendError>;
    async fn cities_of(&self, state_id: i64) -> Result<Vec<LocationOption>, BackendError>;
}

pub struct HttpLocationResolver {
    backend: HttpBackend,
}

impl HttpLocationResolver {
    pub fn new(backend: HttpBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl LocationResolver for HttpLocationResolver {
    async fn countries(&self) -> Result<Vec<LocationOption>, BackendError> {
        let list: Option<Vec<LocationOption>> =
            self.backend.get_json("location/countries", &[]).await?;
        Ok(list.unwrap_or_default())
    }

    async fn states_of(&self, country_id: i64) -> Result<Vec<LocationOption>, BackendError> {
        let list: Option<Vec<LocationOption>> = self
            .backend
            .get_json("location/states", &[("country_id", country_id.to_string())])
            .await?;
        Ok(list.unwrap_or_default())
    }

    async fn cities_of(&self, state_id: i64) -> Result<Vec<LocationOption>, BackendError> {
        let list: Option<Vec<LocationOption>> = self
            .backend
            .get_json("location/cities", &[("state_id", state_id.to_string())])
            .await?;
        Ok(list.unwrap_or_default())
    }
}
