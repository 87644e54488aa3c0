use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{BulletinReadReceipt, TeamBulletin};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Viewer};
use crate::services::{BulletinView, NewBulletin};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PinUpdate {
    pub pinned: bool,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

/// GET /api/teams/:id/bulletins
pub async fn bulletins_get(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Vec<BulletinView>> {
    if !state.teams().can_view(team_id, viewer.id(), &viewer.roles).await? {
        return Err(ApiError::forbidden("You are not a member of this team"));
    }
    Ok(ApiResponse::success(state.bulletins().list(team_id, viewer.id()).await?))
}

/// POST /api/teams/:id/bulletins - team owners and managers only
pub async fn bulletins_post(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(team_id): Path<Uuid>,
    Json(body): Json<NewBulletin>,
) -> ApiResult<TeamBulletin> {
    if !state.teams().can_moderate(team_id, viewer.id(), &viewer.roles).await? {
        return Err(ApiError::forbidden("Only team owners and managers can post bulletins"));
    }
    let bulletin = state.bulletins().post(team_id, viewer.id(), &body).await?;
    Ok(ApiResponse::created(bulletin))
}

async fn load_moderated(state: &AppState, viewer: &Viewer, bulletin_id: Uuid) -> Result<TeamBulletin, ApiError> {
    let bulletin = state
        .bulletins()
        .bulletin(bulletin_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Bulletin not found"))?;

    if !state.teams().can_moderate(bulletin.team_id, viewer.id(), &viewer.roles).await? {
        return Err(ApiError::forbidden("Only team owners and managers can edit bulletins"));
    }
    Ok(bulletin)
}

/// PATCH /api/bulletins/:id - pin or unpin
pub async fn bulletin_patch(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(bulletin_id): Path<Uuid>,
    Json(body): Json<PinUpdate>,
) -> ApiResult<TeamBulletin> {
    load_moderated(&state, &viewer, bulletin_id).await?;
    Ok(ApiResponse::success(
        state.bulletins().set_pinned(bulletin_id, body.pinned).await?,
    ))
}

/// DELETE /api/bulletins/:id
pub async fn bulletin_delete(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(bulletin_id): Path<Uuid>,
) -> ApiResult<()> {
    let bulletin = load_moderated(&state, &viewer, bulletin_id).await?;
    state.bulletins().delete(&bulletin).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/bulletins/:id/read - idempotent
pub async fn bulletin_read_post(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(bulletin_id): Path<Uuid>,
) -> ApiResult<BulletinReadReceipt> {
    let bulletins = state.bulletins();
    let bulletin = bulletins
        .bulletin(bulletin_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Bulletin not found"))?;

    if !state.teams().can_view(bulletin.team_id, viewer.id(), &viewer.roles).await? {
        return Err(ApiError::forbidden("You are not a member of this team"));
    }
    Ok(ApiResponse::success(bulletins.mark_read(bulletin_id, viewer.id()).await?))
}

/// GET /api/bulletins/unread-count
pub async fn unread_count_get(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<UnreadCount> {
    let unread = state.bulletins().unread_count(viewer.id()).await?;
    Ok(ApiResponse::success(UnreadCount { unread }))
}
