use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state, Next},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{elevated, functions, protected, public};
use crate::middleware::{jwt_auth_middleware, require_roles, validate_user_middleware, ADMIN_ROLES, MANAGER_ROLES};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.api.max_request_size_bytes);

    // Layers run outside-in: jwt → validate user → (role gate) → handler
    let api = Router::new()
        .merge(protected_routes())
        .merge(manager_routes())
        .merge(admin_routes())
        .route_layer(from_fn_with_state(state.clone(), validate_user_middleware))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
        .layer(api_cors(&state.config.security.cors_origins));

    let request_logging = state.config.api.enable_request_logging;

    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/routes/resolve", get(public::resolve_route))
        // Serverless-style functions
        .nest("/functions/v1", function_routes())
        // Protected API
        .merge(api)
        // Global middleware
        .layer(body_limit);

    let router = if request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn function_routes() -> Router<AppState> {
    Router::new()
        .route("/create-portal-session", post(functions::create_portal_session))
        .route("/delete-stripe-customer", post(functions::delete_stripe_customer))
        .route("/verify-delete-permission", post(functions::verify_delete_permission))
        .route("/verify-session", post(functions::verify_session))
        .layer(functions::cors_layer())
}

fn protected_routes() -> Router<AppState> {
    use protected::{billing, bulletins, expenses, forms, me, metrics, profiles, realtime, teams};

    Router::new()
        // Account
        .route("/api/me", get(me::me_get).patch(me::me_patch))
        .route("/api/billing/plans", get(billing::plans_get))
        // Reporting lines
        .route(
            "/api/profiles/:id/manager-candidates",
            get(profiles::manager_candidates_get),
        )
        .route("/api/profiles/:id/manager", put(profiles::manager_put))
        // Teams
        .route("/api/teams", get(teams::teams_get).post(teams::teams_post))
        .route("/api/teams/:id", axum::routing::delete(teams::team_delete))
        .route("/api/teams/:id/members", get(teams::members_get))
        .route(
            "/api/teams/:id/members/:user_id",
            put(teams::member_put).delete(teams::member_delete),
        )
        // Bulletins
        .route(
            "/api/teams/:id/bulletins",
            get(bulletins::bulletins_get).post(bulletins::bulletins_post),
        )
        .route("/api/bulletins/unread-count", get(bulletins::unread_count_get))
        .route(
            "/api/bulletins/:id",
            axum::routing::patch(bulletins::bulletin_patch).delete(bulletins::bulletin_delete),
        )
        .route("/api/bulletins/:id/read", post(bulletins::bulletin_read_post))
        // Metrics and lead spend
        .route("/api/metrics", get(metrics::metrics_get).put(metrics::metrics_put))
        .route("/api/metrics/summary", get(metrics::metrics_summary_get))
        .route("/api/metrics/:date", axum::routing::delete(metrics::metrics_delete))
        .route("/api/expenses", get(expenses::expenses_get).post(expenses::expenses_post))
        .route("/api/expenses/summary", get(expenses::expenses_summary_get))
        .route("/api/expenses/:id", axum::routing::delete(expenses::expense_delete))
        // Form layouts
        .route(
            "/api/forms/:form_key/layout",
            get(forms::layout_get).put(forms::layout_put),
        )
        .route("/api/forms/:form_key/layout/move", post(forms::layout_move_post))
        // Change feed
        .route("/api/realtime", get(realtime::realtime_get))
}

fn manager_routes() -> Router<AppState> {
    use protected::managers;

    Router::new()
        .route("/api/managers/:id/team", get(managers::team_get))
        .route("/api/managers/:id/team/nested", get(managers::nested_team_get))
        .route("/api/managers/:id/metrics", get(managers::team_metrics_get))
        .route_layer(from_fn(|req: Request, next: Next| require_roles(MANAGER_ROLES, req, next)))
}

fn admin_routes() -> Router<AppState> {
    use elevated::{roles, users};

    Router::new()
        .route("/api/admin/users", get(users::users_get))
        .route("/api/admin/users/:id/roles", get(roles::roles_get))
        .route(
            "/api/admin/users/:id/roles/:role",
            put(roles::role_put).delete(roles::role_delete),
        )
        .route_layer(from_fn(|req: Request, next: Next| require_roles(ADMIN_ROLES, req, next)))
}

/// `*` or an empty list allows any origin.
fn api_cors(origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE];
    let base = CorsLayer::new().allow_methods(methods).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    base.allow_origin(AllowOrigin::list(allowed))
}
