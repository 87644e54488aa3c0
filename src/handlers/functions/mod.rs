// handlers/functions/mod.rs - Serverless-style billing and permission functions
//
// Route Prefix: /functions/v1/:name (POST, OPTIONS preflight)
// The caller's bearer token identifies the user. Errors are always
// `{"error": "<message>"}` with a non-2xx status.
pub mod create_portal_session;
pub mod delete_stripe_customer;
pub mod verify_delete_permission;
pub mod verify_session;

pub use create_portal_session::create_portal_session;
pub use delete_stripe_customer::delete_stripe_customer;
pub use verify_delete_permission::verify_delete_permission;
pub use verify_session::verify_session;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::auth::{validate_jwt, Claims};
use crate::database::models::Profile;
use crate::database::DatabaseError;
use crate::middleware::bearer_token;
use crate::services::BillingError;
use crate::state::AppState;

pub const CORS_ALLOW_HEADERS: [&str; 4] = ["authorization", "x-client-info", "apikey", "content-type"];

/// Preflight policy shared by every function.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(CORS_ALLOW_HEADERS.map(HeaderName::from_static))
}

#[derive(Debug)]
pub struct FunctionError {
    pub status: StatusCode,
    pub message: String,
}

impl FunctionError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }
}

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<BillingError> for FunctionError {
    fn from(err: BillingError) -> Self {
        tracing::error!("Billing function failed: {}", err);
        let status = match err {
            BillingError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl From<DatabaseError> for FunctionError {
    fn from(err: DatabaseError) -> Self {
        tracing::error!("Function store error: {}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Database error occurred")
    }
}

/// The user behind the bearer token, with their profile row.
#[derive(Debug, Clone)]
pub struct FunctionCaller {
    pub claims: Claims,
    pub profile: Profile,
}

#[async_trait]
impl FromRequestParts<AppState> for FunctionCaller {
    type Rejection = FunctionError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).map_err(FunctionError::unauthorized)?;
        let claims = validate_jwt(token, &state.config.security.jwt_secret)
            .map_err(|e| FunctionError::unauthorized(e.to_string()))?;

        let profile = state
            .directory
            .profile(claims.sub)
            .await?
            .ok_or_else(|| FunctionError::unauthorized("Profile not found"))?;

        Ok(Self { claims, profile })
    }
}
