use axum::{
    extract::{Path, Query, State},
    Extension,
};
use uuid::Uuid;

use crate::database::models::Profile;
use crate::error::ApiError;
use crate::metrics::MetricSummary;
use crate::middleware::{ApiResponse, ApiResult, Viewer};
use crate::state::AppState;
use crate::team::{fetch_manager_team_members, fetch_nested_team_members, manages};
use crate::types::DateRange;

async fn ensure_scope(state: &AppState, viewer: &Viewer, manager_id: Uuid) -> Result<(), ApiError> {
    if manages(state.directory.as_ref(), viewer.id(), &viewer.roles, manager_id).await? {
        Ok(())
    } else {
        tracing::warn!(viewer_id = %viewer.id(), manager_id = %manager_id, "Team view refused");
        Err(ApiError::forbidden("You cannot view this manager's team"))
    }
}

/// GET /api/managers/:id/team - direct reports
pub async fn team_get(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(manager_id): Path<Uuid>,
) -> ApiResult<Vec<Profile>> {
    ensure_scope(&state, &viewer, manager_id).await?;
    Ok(ApiResponse::success(
        fetch_manager_team_members(state.directory.as_ref(), manager_id).await,
    ))
}

/// GET /api/managers/:id/team/nested - reports of sub-managers
pub async fn nested_team_get(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(manager_id): Path<Uuid>,
) -> ApiResult<Vec<Profile>> {
    ensure_scope(&state, &viewer, manager_id).await?;
    Ok(ApiResponse::success(
        fetch_nested_team_members(state.directory.as_ref(), manager_id).await,
    ))
}

/// GET /api/managers/:id/metrics?from=&to= - totals for the manager and
/// everyone in their two-level team
pub async fn team_metrics_get(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(manager_id): Path<Uuid>,
    Query(range): Query<DateRange>,
) -> ApiResult<MetricSummary> {
    if !range.is_valid() {
        return Err(ApiError::bad_request("from must not be after to"));
    }
    ensure_scope(&state, &viewer, manager_id).await?;

    let directory = state.directory.as_ref();
    let mut ids = vec![manager_id];
    ids.extend(fetch_manager_team_members(directory, manager_id).await.iter().map(|p| p.id));
    ids.extend(fetch_nested_team_members(directory, manager_id).await.iter().map(|p| p.id));
    ids.sort();
    ids.dedup();

    let snapshots = state.metrics().range(&ids, range).await?;
    Ok(ApiResponse::success(MetricSummary::build(
        range.from,
        range.to,
        ids.len(),
        &snapshots,
    )))
}
