use axum::{
    extract::{Query, State},
    http::HeaderMap,
};
use serde::Deserialize;

use crate::access::RouteDecision;
use crate::auth::validate_jwt;
use crate::error::ApiError;
use crate::middleware::{bearer_token, load_viewer, ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub path: String,
}

/// GET /routes/resolve?path= - evaluate the client route gates
///
/// The bearer token is optional; without one (or with an invalid one) the
/// viewer is treated as signed out.
pub async fn resolve_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ResolveQuery>,
) -> ApiResult<RouteDecision> {
    if query.path.trim().is_empty() {
        return Err(ApiError::bad_request("path is required"));
    }

    let subject = match bearer_token(&headers) {
        Ok(token) => match validate_jwt(token, &state.config.security.jwt_secret) {
            Ok(claims) => match load_viewer(&state, claims.sub).await {
                Ok(viewer) => Some(viewer.access_subject()),
                Err(ApiError::Unauthorized(_)) => None,
                Err(e) => return Err(e),
            },
            Err(_) => None,
        },
        Err(_) => None,
    };

    Ok(ApiResponse::success(state.routes.resolve(&query.path, subject.as_ref())))
}
