use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::database::models::{Profile, ProfileUpdate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Viewer};
use crate::realtime::{ChangeEvent, Table};
use crate::roles::{highest_role, Role};
use crate::state::AppState;
use crate::types::ChangeAction;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub profile: Profile,
    pub roles: Vec<&'static str>,
    pub highest_role: Option<Role>,
    pub is_admin: bool,
    pub has_manager_role: bool,
}

/// GET /api/me - the signed-in user's profile and role summary
pub async fn me_get(Extension(viewer): Extension<Viewer>) -> ApiResult<MeResponse> {
    Ok(ApiResponse::success(MeResponse {
        roles: viewer.roles.names(),
        highest_role: highest_role(&viewer.roles),
        is_admin: viewer.is_admin(),
        has_manager_role: viewer.roles.has_manager_role(),
        profile: viewer.profile,
    }))
}

/// PATCH /api/me - update name and language
pub async fn me_patch(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Profile> {
    if let Some(name) = &update.full_name {
        if name.trim().is_empty() {
            return Err(ApiError::validation_error("full_name must not be blank", None));
        }
    }

    let profile = state.directory.update_profile(viewer.id(), &update).await?;
    state
        .feed
        .publish(ChangeEvent::new(Table::Profiles, ChangeAction::Update, profile.id).for_user(profile.id));

    Ok(ApiResponse::success(profile))
}
