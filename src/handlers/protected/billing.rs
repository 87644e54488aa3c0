use axum::{extract::State, Extension};
use serde::Serialize;

use crate::middleware::{ApiResponse, ApiResult, Viewer};
use crate::roles::{can_upgrade_to, highest_role, Role};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Plan {
    pub role: Role,
    pub price_id: Option<String>,
    pub can_upgrade: bool,
}

#[derive(Debug, Serialize)]
pub struct Plans {
    pub publishable_key: String,
    pub current: Option<Role>,
    pub subscription_status: Option<String>,
    pub plans: Vec<Plan>,
}

/// GET /api/billing/plans - paid tiers with price ids and upgrade eligibility
pub async fn plans_get(State(state): State<AppState>, Extension(viewer): Extension<Viewer>) -> ApiResult<Plans> {
    let prices = &state.config.billing.prices;

    let plans = Role::ALL
        .into_iter()
        .filter(Role::is_paid_tier)
        .map(|role| Plan {
            role,
            price_id: prices.price_for(role).map(str::to_string),
            can_upgrade: can_upgrade_to(&viewer.roles, role),
        })
        .collect();

    Ok(ApiResponse::success(Plans {
        publishable_key: state.config.billing.stripe_publishable_key.clone(),
        current: highest_role(&viewer.roles),
        subscription_status: viewer.profile.subscription_status.clone(),
        plans,
    }))
}
