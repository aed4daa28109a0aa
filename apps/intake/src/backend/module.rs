use async_trait::async_trait;

use super::{BackendError, HttpBackend};
use crate::models::module::OrgModule;

/// Lists the feature modules enabled for an organization.
#[async_trait]
pub trait ModuleDirectory: Send + Sync {
    async fn modules(&self, org_id: i64) -> Result<Vec<OrgModule>, BackendError>;
}

pub struct HttpModuleDirectory {
    backend: HttpBackend,
}

impl HttpModuleDirectory {
    pub fn new(backend: HttpBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ModuleDirectory for HttpModuleDirectory {
    async fn modules(&self, org_id: i64) -> Result<Vec<OrgModule>, BackendError> {
        let list: Option<Vec<OrgModule>> = self
            .backend
            .get_json("module", &[("org_id", org_id.to_string())])
            .await?;
        Ok(list.unwrap_or_default())
    }
}
