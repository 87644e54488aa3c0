use axum::{extract::Request, middleware::Next, response::Response};

use super::validate_user::Viewer;
use crate::access::DEFAULT_FALLBACK;
use crate::error::ApiError;
use crate::roles::{check_required_role, Role};

pub const ADMIN_ROLES: &[Role] = &[Role::SystemAdmin];

pub const MANAGER_ROLES: &[Role] = &[Role::ManagerPro, Role::ManagerProGold, Role::ManagerProPlatinum];

/// Reject viewers holding none of `required` with 403 and a fallback route.
/// Must run after `validate_user_middleware`.
pub async fn require_roles(required: &'static [Role], request: Request, next: Next) -> Result<Response, ApiError> {
    let viewer = request
        .extensions()
        .get::<Viewer>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !check_required_role(&viewer.roles, Some(required)) {
        tracing::warn!(
            user_id = %viewer.id(),
            path = %request.uri().path(),
            "Access denied: missing required role"
        );
        return Err(ApiError::access_denied(
            "You do not have permission to access this resource",
            DEFAULT_FALLBACK,
        ));
    }

    Ok(next.run(request).await)
}
