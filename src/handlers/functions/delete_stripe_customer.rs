use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{FunctionCaller, FunctionError};
use crate::database::DatabaseError;
use crate::roles::check_system_admin_role;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DeleteCustomerRequest {
    pub subscription_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteCustomerResponse {
    pub success: bool,
    pub status: String,
}

/// POST /functions/v1/delete-stripe-customer
///
/// Cancels the subscription. Only the profile holding that subscription, or
/// a system admin, may do so.
pub async fn delete_stripe_customer(
    State(state): State<AppState>,
    caller: FunctionCaller,
    body: Result<Json<DeleteCustomerRequest>, JsonRejection>,
) -> Result<Json<DeleteCustomerResponse>, FunctionError> {
    let Json(request) = body.map_err(|e| FunctionError::bad_request(e.body_text()))?;
    let subscription_id = request
        .subscription_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| FunctionError::bad_request("Subscription ID is required"))?;

    let owns_subscription = caller.profile.stripe_subscription_id.as_deref() == Some(subscription_id.as_str());
    if !owns_subscription {
        let roles = state
            .role_cache
            .roles_for(caller.profile.id, state.directory.as_ref())
            .await?;
        if !check_system_admin_role(&roles) {
            warn!(user_id = %caller.profile.id, "Refused to cancel a subscription the caller does not own");
            return Err(FunctionError::forbidden("Not permitted to cancel this subscription"));
        }
    }

    let canceled = state.billing.cancel_subscription(&subscription_id).await?;

    // Already canceled upstream; a failed local write is only logged.
    if let Err(e) = record_status(&state, &subscription_id, &canceled.status).await {
        error!(
            subscription_id = %subscription_id,
            status = %canceled.status,
            "Subscription canceled but stored status not updated: {}",
            e
        );
    }

    info!(user_id = %caller.profile.id, subscription_id = %subscription_id, "Subscription canceled");
    Ok(Json(DeleteCustomerResponse {
        success: true,
        status: canceled.status,
    }))
}

async fn record_status(state: &AppState, subscription_id: &str, status: &str) -> Result<(), DatabaseError> {
    if let Some(owner) = state.directory.profile_by_subscription(subscription_id).await? {
        state.directory.set_subscription_status(owner.id, Some(status)).await?;
    }
    Ok(())
}
