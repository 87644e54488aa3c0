use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::database::models::LeadExpense;
use crate::error::ApiError;
use crate::metrics::LeadCostSummary;
use crate::middleware::{ApiResponse, ApiResult, Viewer};
use crate::services::NewExpense;
use crate::state::AppState;
use crate::types::DateRange;

/// POST /api/expenses
pub async fn expenses_post(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(body): Json<NewExpense>,
) -> ApiResult<LeadExpense> {
    Ok(ApiResponse::created(state.expenses().record(viewer.id(), &body).await?))
}

/// GET /api/expenses?from=&to=
pub async fn expenses_get(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Query(range): Query<DateRange>,
) -> ApiResult<Vec<LeadExpense>> {
    if !range.is_valid() {
        return Err(ApiError::bad_request("from must not be after to"));
    }
    Ok(ApiResponse::success(state.expenses().list(viewer.id(), range).await?))
}

/// GET /api/expenses/summary?from=&to=
pub async fn expenses_summary_get(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Query(range): Query<DateRange>,
) -> ApiResult<LeadCostSummary> {
    if !range.is_valid() {
        return Err(ApiError::bad_request("from must not be after to"));
    }
    let expenses = state.expenses().list(viewer.id(), range).await?;
    Ok(ApiResponse::success(LeadCostSummary::from_expenses(&expenses)))
}

/// DELETE /api/expenses/:id
pub async fn expense_delete(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(expense_id): Path<Uuid>,
) -> ApiResult<()> {
    if !state.expenses().delete(viewer.id(), expense_id).await? {
        return Err(ApiError::not_found("Expense not found"));
    }
    Ok(ApiResponse::no_content())
}
