use axum::{extract::State, Json};
use serde::Serialize;

use super::{FunctionCaller, FunctionError};
use crate::roles::{check_required_role, Role};
use crate::state::AppState;

/// Roles allowed to delete accounts.
pub const DELETE_ALLOW_LIST: &[Role] = &[Role::SystemAdmin];

#[derive(Debug, Serialize)]
pub struct DeletePermission {
    pub allowed: bool,
    pub roles: Vec<&'static str>,
}

/// POST /functions/v1/verify-delete-permission - 200 either way
pub async fn verify_delete_permission(
    State(state): State<AppState>,
    caller: FunctionCaller,
) -> Result<Json<DeletePermission>, FunctionError> {
    let roles = state
        .role_cache
        .roles_for(caller.profile.id, state.directory.as_ref())
        .await?;

    Ok(Json(DeletePermission {
        allowed: check_required_role(&roles, Some(DELETE_ALLOW_LIST)),
        roles: roles.names(),
    }))
}
