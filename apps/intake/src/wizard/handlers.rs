use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::StagedImage;
use crate::drafts::{DraftStore, ProfileDraftStore};
use crate::errors::AppError;
use crate::models::candidate::CandidateRecord;
use crate::state::AppState;
use crate::wizard::forms::{AddressPatch, BasicInfoPatch};
use crate::wizard::{Step, WizardDeps, WizardSession, WizardView};

#[derive(Deserialize)]
pub struct MountRequest {
    pub profile_id: String,
    #[serde(default)]
    pub org_id: Option<i64>,
}

#[derive(Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub wizard: WizardView,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    /// `null` when the backend acknowledged the save without the record.
    pub candidate: Option<CandidateRecord>,
    #[serde(flatten)]
    pub session: SessionView,
}

#[derive(Deserialize)]
pub struct CountrySelection {
    pub country_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct StateSelection {
    pub state_id: Option<i64>,
}

async fn find_session(state: &AppState, id: Uuid) -> Result<WizardSession, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Wizard session {id} not found")))
}

async fn view_of(session: &WizardSession) -> SessionView {
    SessionView {
        session_id: session.id(),
        wizard: session.lock().await.view(),
    }
}

/// POST /api/v1/wizard/sessions
pub async fn handle_mount(
    State(state): State<AppState>,
    Json(req): Json<MountRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let drafts: Arc<dyn DraftStore> = Arc::new(
        ProfileDraftStore::new(state.drafts.clone(), &req.profile_id)
            .map_err(|e| AppError::BadRequest(e.to_string()))?,
    );
    let deps = WizardDeps {
        locations: state.locations.clone(),
        candidates: state.candidates.clone(),
        drafts,
    };

    let session = WizardSession::mount(deps, req.org_id).await;
    tracing::info!(
        "Mounted wizard session {} for profile {}",
        session.id(),
        req.profile_id
    );
    state.sessions.insert(session.clone()).await;
    Ok((StatusCode::CREATED, Json(view_of(&session).await)))
}

/// GET /api/v1/wizard/sessions/:id
pub async fn handle_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    Ok(Json(view_of(&session).await))
}

/// DELETE /api/v1/wizard/sessions/:id
pub async fn handle_close(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .remove(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Wizard session {id} not found")))?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/wizard/sessions/:id/basic
pub async fn handle_edit_basic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<BasicInfoPatch>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    session.lock().await.edit_basic(patch).await;
    Ok(Json(view_of(&session).await))
}

/// PATCH /api/v1/wizard/sessions/:id/address
pub async fn handle_edit_address(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<AddressPatch>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    session.lock().await.edit_address(patch).await;
    Ok(Json(view_of(&session).await))
}

/// POST /api/v1/wizard/sessions/:id/country
pub async fn handle_select_country(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CountrySelection>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    let request = session.lock().await.select_country(req.country_id).await;
    session.dispatch(request);
    Ok(Json(view_of(&session).await))
}

/// POST /api/v1/wizard/sessions/:id/state
pub async fn handle_select_state(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StateSelection>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    let request = session.lock().await.select_state(req.state_id).await;
    session.dispatch(request);
    Ok(Json(view_of(&session).await))
}

/// POST /api/v1/wizard/sessions/:id/next
pub async fn handle_next(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    session.lock().await.next().await?;
    Ok(Json(view_of(&session).await))
}

/// POST /api/v1/wizard/sessions/:id/back
pub async fn handle_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    session.lock().await.back().await;
    Ok(Json(view_of(&session).await))
}

/// POST /api/v1/wizard/sessions/:id/step/:n
pub async fn handle_set_step(
    State(state): State<AppState>,
    Path((id, n)): Path<(Uuid, u8)>,
) -> Result<Json<SessionView>, AppError> {
    let step = Step::from_number(n)
        .ok_or_else(|| AppError::BadRequest(format!("Step must be 1, 2 or 3 (got {n})")))?;
    let session = find_session(&state, id).await?;
    session.lock().await.set_step(step).await;
    Ok(Json(view_of(&session).await))
}

/// `image/<subtype>` with a plain token subtype, so it is safe inside a `data:` URL.
fn is_image_type(content_type: &str) -> bool {
    content_type
        .strip_prefix("image/")
        .is_some_and(|subtype| {
            !subtype.is_empty()
                && subtype
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
        })
}

/// POST /api/v1/wizard/sessions/:id/image (multipart, file field `img`)
pub async fn handle_stage_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;

    let mut staged = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some("img") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes: Bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed upload: {e}")))?;
        staged = Some(StagedImage {
            file_name,
            content_type,
            bytes,
        });
        break;
    }

    let image = staged.ok_or_else(|| AppError::BadRequest("Missing file field 'img'".into()))?;
    if !is_image_type(&image.content_type) {
        return Err(AppError::BadRequest(format!(
            "Uploaded file must be an image (got '{}')",
            image.content_type
        )));
    }
    if image.bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    session.lock().await.stage_image(image).await;
    Ok(Json(view_of(&session).await))
}

/// POST /api/v1/wizard/sessions/:id/submit
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmitResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let candidate = session.lock().await.submit().await?;
    Ok(Json(SubmitResponse {
        candidate,
        session: view_of(&session).await,
    }))
}
