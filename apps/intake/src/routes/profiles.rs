use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::{info, warn};

use crate::drafts::{DraftStore, ProfileDraftStore};
use crate::errors::AppError;
use crate::models::auth::{AuthSession, AUTH_KEY, CALENDAR_ID_KEY};
use crate::state::AppState;

fn profile_store(state: &AppState, profile: &str) -> Result<ProfileDraftStore, AppError> {
    ProfileDraftStore::new(state.drafts.clone(), profile)
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// PUT /api/v1/profiles/:profile/auth
/// Records the organization a profile is logged in as; wizards mounted
/// without an explicit org id pick it up. The login is also opened in the
/// organization's calendar log, whose id is kept for logout.
pub async fn handle_put_auth(
    State(state): State<AppState>,
    Path(profile): Path<String>,
    Json(auth): Json<AuthSession>,
) -> Result<StatusCode, AppError> {
    let store = profile_store(&state, &profile)?;
    let value = serde_json::to_value(&auth).map_err(anyhow::Error::from)?;
    store.set(AUTH_KEY, &value).await?;
    info!("Profile {} logged in as org {}", profile, auth.id);

    match state.timesheet.log_login(auth.id).await {
        Ok(Some(calendar_id)) => store.set(CALENDAR_ID_KEY, &json!(calendar_id)).await?,
        // Never keep an id from an earlier login.
        Ok(None) => {
            warn!("Calendar log for org {} returned no id", auth.id);
            store.remove(CALENDAR_ID_KEY).await?;
        }
        Err(e) => {
            warn!("Failed to open calendar log for org {}: {e}", auth.id);
            store.remove(CALENDAR_ID_KEY).await?;
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/profiles/:profile/auth
/// Closes the open calendar log entry, if any, then forgets the session.
pub async fn handle_logout(
    State(state): State<AppState>,
    Path(profile): Path<String>,
) -> Result<StatusCode, AppError> {
    let store = profile_store(&state, &profile)?;

    let calendar_id = store
        .get(CALENDAR_ID_KEY)
        .await?
        .and_then(|v| v.as_i64().or_else(|| v.as_str()?.trim().parse().ok()));
    if let Some(calendar_id) = calendar_id {
        if let Err(e) = state.timesheet.log_logout(calendar_id).await {
            warn!("Failed to close calendar log {calendar_id}: {e}");
        }
    }

    store.remove(AUTH_KEY).await?;
    store.remove(CALENDAR_ID_KEY).await?;
    info!("Profile {} logged out", profile);
    Ok(StatusCode::NO_CONTENT)
}
