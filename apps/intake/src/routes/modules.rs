use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::module::{default_section, OrgModule};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ModuleListResponse {
    pub org_id: i64,
    pub modules: Vec<OrgModule>,
    /// Section to open first; `null` when the organization has no modules.
    pub active: Option<String>,
}

/// GET /api/v1/orgs/:org_id/modules
pub async fn handle_list_modules(
    State(state): State<AppState>,
    Path(org_id): Path<i64>,
) -> Result<Json<ModuleListResponse>, AppError> {
    let modules = state.modules.modules(org_id).await?;
    Ok(Json(ModuleListResponse {
        org_id,
        active: default_section(&modules),
        modules,
    }))
}
