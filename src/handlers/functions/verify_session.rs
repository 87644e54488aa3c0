use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use super::{FunctionCaller, FunctionError};

#[derive(Debug, Serialize)]
pub struct SessionCheck {
    pub valid: bool,
    pub profile_id: Uuid,
}

/// POST /functions/v1/verify-session
///
/// The extractor already rejects bad tokens and missing profiles with 401.
pub async fn verify_session(caller: FunctionCaller) -> Result<Json<SessionCheck>, FunctionError> {
    Ok(Json(SessionCheck {
        valid: true,
        profile_id: caller.profile.id,
    }))
}
