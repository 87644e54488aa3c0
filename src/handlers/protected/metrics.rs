use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;

use crate::database::models::DailyMetric;
use crate::error::ApiError;
use crate::metrics::{DailyMetricInput, MetricSummary};
use crate::middleware::{ApiResponse, ApiResult, Viewer};
use crate::state::AppState;
use crate::types::DateRange;

fn check_range(range: &DateRange) -> Result<(), ApiError> {
    if range.is_valid() {
        Ok(())
    } else {
        Err(ApiError::bad_request("from must not be after to"))
    }
}

/// PUT /api/metrics - upsert the viewer's counters for one day
pub async fn metrics_put(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(input): Json<DailyMetricInput>,
) -> ApiResult<DailyMetric> {
    Ok(ApiResponse::success(state.metrics().upsert(viewer.id(), &input).await?))
}

/// GET /api/metrics?from=&to=
pub async fn metrics_get(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Query(range): Query<DateRange>,
) -> ApiResult<Vec<DailyMetric>> {
    check_range(&range)?;
    Ok(ApiResponse::success(state.metrics().range(&[viewer.id()], range).await?))
}

/// GET /api/metrics/summary?from=&to=
pub async fn metrics_summary_get(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Query(range): Query<DateRange>,
) -> ApiResult<MetricSummary> {
    check_range(&range)?;
    let snapshots = state.metrics().range(&[viewer.id()], range).await?;
    Ok(ApiResponse::success(MetricSummary::build(range.from, range.to, 1, &snapshots)))
}

/// DELETE /api/metrics/:date
pub async fn metrics_delete(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(metric_date): Path<NaiveDate>,
) -> ApiResult<()> {
    if !state.metrics().delete_day(viewer.id(), metric_date).await? {
        return Err(ApiError::not_found(format!("No metrics recorded for {}", metric_date)));
    }
    Ok(ApiResponse::no_content())
}
