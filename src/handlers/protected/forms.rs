use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::forms::{FormLayout, LayoutTarget};
use crate::middleware::{ApiResponse, ApiResult, Viewer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub target: LayoutTarget,
    pub from: usize,
    pub to: usize,
}

fn check_form_key(form_key: &str) -> Result<(), ApiError> {
    let valid = !form_key.is_empty()
        && form_key.len() <= 64
        && form_key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!("Invalid form key '{}'", form_key)))
    }
}

/// GET /api/forms/:form_key/layout
pub async fn layout_get(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(form_key): Path<String>,
) -> ApiResult<FormLayout> {
    check_form_key(&form_key)?;
    Ok(ApiResponse::success(state.form_layouts().load(viewer.id(), &form_key).await?))
}

/// PUT /api/forms/:form_key/layout - replace; positions follow array order
pub async fn layout_put(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(form_key): Path<String>,
    Json(layout): Json<FormLayout>,
) -> ApiResult<FormLayout> {
    check_form_key(&form_key)?;
    Ok(ApiResponse::success(
        state.form_layouts().replace(viewer.id(), &form_key, &layout).await?,
    ))
}

/// POST /api/forms/:form_key/layout/move - one drag-and-drop step
pub async fn layout_move_post(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(form_key): Path<String>,
    Json(body): Json<MoveRequest>,
) -> ApiResult<FormLayout> {
    check_form_key(&form_key)?;
    let layout = state
        .form_layouts()
        .move_item(viewer.id(), &form_key, body.target, body.from, body.to)
        .await?;
    Ok(ApiResponse::success(layout))
}
