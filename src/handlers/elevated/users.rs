use axum::extract::State;

use crate::database::models::Profile;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/admin/users - every profile
pub async fn users_get(State(state): State<AppState>) -> ApiResult<Vec<Profile>> {
    Ok(ApiResponse::success(state.directory.profiles().await?))
}
