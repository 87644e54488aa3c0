use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::Profile;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Viewer};
use crate::realtime::{ChangeEvent, Table};
use crate::state::AppState;
use crate::team::{manager_candidates, manages, reassign_manager};
use crate::types::ChangeAction;

#[derive(Debug, Deserialize)]
pub struct ManagerAssignment {
    pub manager_id: Option<Uuid>,
}

/// The viewer may edit `user_id`'s reporting line when they are an admin or
/// sit above the user.
async fn ensure_can_edit(state: &AppState, viewer: &Viewer, user_id: Uuid) -> Result<(), ApiError> {
    if viewer.is_admin() {
        return Ok(());
    }
    if viewer.id() != user_id && manages(state.directory.as_ref(), viewer.id(), &viewer.roles, user_id).await? {
        return Ok(());
    }
    tracing::warn!(viewer_id = %viewer.id(), user_id = %user_id, "Reporting-line edit refused");
    Err(ApiError::forbidden("You cannot change this user's manager"))
}

/// GET /api/profiles/:id/manager-candidates
///
/// Everyone except the user and the user's own reports.
pub async fn manager_candidates_get(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Vec<Profile>> {
    ensure_can_edit(&state, &viewer, user_id).await?;

    let all = state.directory.profiles().await?;
    let user = all
        .iter()
        .find(|p| p.id == user_id)
        .ok_or_else(|| ApiError::not_found(format!("Profile {} not found", user_id)))?;

    let candidates = manager_candidates(user, &all).into_iter().cloned().collect();
    Ok(ApiResponse::success(candidates))
}

/// PUT /api/profiles/:id/manager
pub async fn manager_put(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(user_id): Path<Uuid>,
    Json(assignment): Json<ManagerAssignment>,
) -> ApiResult<Profile> {
    ensure_can_edit(&state, &viewer, user_id).await?;

    let profile = reassign_manager(state.directory.as_ref(), user_id, assignment.manager_id).await?;
    state
        .feed
        .publish(ChangeEvent::new(Table::Profiles, ChangeAction::Update, profile.id).for_user(profile.id));

    Ok(ApiResponse::success(profile))
}
