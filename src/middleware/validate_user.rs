use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::auth::AuthUser;
use crate::access::AccessSubject;
use crate::database::models::Profile;
use crate::error::ApiError;
use crate::roles::{check_system_admin_role, RoleSet};
use crate::state::AppState;

/// The signed-in user's profile and cached roles.
#[derive(Clone, Debug)]
pub struct Viewer {
    pub profile: Profile,
    pub roles: RoleSet,
}

impl Viewer {
    pub fn id(&self) -> Uuid {
        self.profile.id
    }

    pub fn is_admin(&self) -> bool {
        check_system_admin_role(&self.roles)
    }

    pub fn access_subject(&self) -> AccessSubject {
        AccessSubject {
            roles: self.roles.clone(),
            subscription_status: self.profile.subscription_status.clone(),
        }
    }
}

/// Resolve a user id to a [`Viewer`]. A token for a deleted profile is
/// treated as unauthenticated.
pub async fn load_viewer(state: &AppState, user_id: Uuid) -> Result<Viewer, ApiError> {
    let profile = state.directory.profile(user_id).await?.ok_or_else(|| {
        tracing::warn!(user_id = %user_id, "Token refers to a missing profile");
        ApiError::unauthorized("Profile not found")
    })?;

    let roles = state.role_cache.roles_for(user_id, state.directory.as_ref()).await?;

    Ok(Viewer { profile, roles })
}

/// Middleware that loads the profile and roles for the JWT subject
pub async fn validate_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let viewer = load_viewer(&state, auth_user.user_id).await?;

    tracing::debug!(user_id = %viewer.id(), roles = ?viewer.roles.names(), "User validated");

    request.extensions_mut().insert(viewer);

    Ok(next.run(request).await)
}
