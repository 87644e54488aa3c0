use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{FunctionCaller, FunctionError};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PortalSessionRequest {
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PortalSessionResponse {
    pub url: String,
}

/// POST /functions/v1/create-portal-session
pub async fn create_portal_session(
    State(state): State<AppState>,
    caller: FunctionCaller,
    body: Option<Json<PortalSessionRequest>>,
) -> Result<Json<PortalSessionResponse>, FunctionError> {
    let customer_id = caller
        .profile
        .stripe_customer_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| FunctionError::bad_request("No Stripe customer found for this user"))?;

    let request = body.map(|Json(b)| b).unwrap_or_default();
    let return_url = request
        .return_url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| state.config.billing.portal_return_url.clone());

    let session = state.billing.create_portal_session(customer_id, &return_url).await?;

    info!(user_id = %caller.profile.id, "Portal session issued");
    Ok(Json(PortalSessionResponse { url: session.url }))
}
