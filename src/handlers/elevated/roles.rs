use axum::{
    extract::{Path, State},
    Extension,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Viewer};
use crate::realtime::{ChangeEvent, Table};
use crate::roles::{highest_role, Role, RoleSet};
use crate::state::AppState;
use crate::types::ChangeAction;

#[derive(Debug, Serialize)]
pub struct UserRoles {
    pub user_id: Uuid,
    pub roles: RoleSet,
    pub highest_role: Option<Role>,
    pub changed: bool,
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.parse::<Role>().map_err(|e| ApiError::bad_request(e.to_string()))
}

async fn ensure_profile(state: &AppState, user_id: Uuid) -> Result<(), ApiError> {
    match state.directory.profile(user_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found(format!("Profile {} not found", user_id))),
    }
}

async fn current_roles(state: &AppState, user_id: Uuid, changed: bool) -> Result<UserRoles, ApiError> {
    let roles: RoleSet = state.directory.roles_for(user_id).await?.into_iter().collect();
    Ok(UserRoles {
        user_id,
        highest_role: highest_role(&roles),
        roles,
        changed,
    })
}

/// GET /api/admin/users/:id/roles - read straight from the store
pub async fn roles_get(State(state): State<AppState>, Path(user_id): Path<Uuid>) -> ApiResult<UserRoles> {
    ensure_profile(&state, user_id).await?;
    Ok(ApiResponse::success(current_roles(&state, user_id, false).await?))
}

/// PUT /api/admin/users/:id/roles/:role
pub async fn role_put(
    State(state): State<AppState>,
    Extension(admin): Extension<Viewer>,
    Path((user_id, role)): Path<(Uuid, String)>,
) -> ApiResult<UserRoles> {
    let role = parse_role(&role)?;
    ensure_profile(&state, user_id).await?;

    let changed = state.directory.grant_role(user_id, role).await?;
    state.role_cache.invalidate(user_id).await;

    if changed {
        info!(admin_id = %admin.id(), user_id = %user_id, role = %role, "Role granted");
        state.feed.publish(
            ChangeEvent::new(Table::UserRoles, ChangeAction::Insert, format!("{}:{}", user_id, role)).for_user(user_id),
        );
    }

    Ok(ApiResponse::success(current_roles(&state, user_id, changed).await?))
}

/// DELETE /api/admin/users/:id/roles/:role
///
/// Admins cannot drop their own system_admin role.
pub async fn role_delete(
    State(state): State<AppState>,
    Extension(admin): Extension<Viewer>,
    Path((user_id, role)): Path<(Uuid, String)>,
) -> ApiResult<UserRoles> {
    let role = parse_role(&role)?;
    if user_id == admin.id() && role == Role::SystemAdmin {
        return Err(ApiError::conflict("You cannot revoke your own system_admin role"));
    }
    ensure_profile(&state, user_id).await?;

    let changed = state.directory.revoke_role(user_id, role).await?;
    state.role_cache.invalidate(user_id).await;

    if changed {
        info!(admin_id = %admin.id(), user_id = %user_id, role = %role, "Role revoked");
        state.feed.publish(
            ChangeEvent::new(Table::UserRoles, ChangeAction::Delete, format!("{}:{}", user_id, role)).for_user(user_id),
        );
    }

    Ok(ApiResponse::success(current_roles(&state, user_id, changed).await?))
}
