//! Route definitions for the Meal Program Cost Engine

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - cost extraction and composition
        .nest("/production-batches", batch_routes(state))
        .nest("/distributions", distribution_routes(state))
        // Protected routes - budget tracking and plan reports
        .nest("/plans", plan_routes(state))
        .nest("/budget", budget_routes(state))
        // Protected routes - reconciliation
        .nest("/reconciliation", reconciliation_routes(state))
}

fn batch_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/:batch_id/procurement-cost", get(handlers::get_procurement_cost))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn distribution_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/:event_id/costs", post(handlers::compose_distribution_costs))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn plan_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/:plan_id/budget", get(handlers::get_plan_budget))
        .route("/:plan_id/budget/track", post(handlers::track_plan_budget))
        .route("/:plan_id/variance", get(handlers::get_plan_variance))
        .route("/:plan_id/efficiency", get(handlers::get_plan_efficiency))
        .route("/:plan_id/pipeline", post(handlers::run_plan_pipeline))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn budget_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/monthly", get(handlers::get_monthly_budget))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn reconciliation_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_reconciliation_report))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}
