//! Meal Program Cost Engine - backend library
//!
//! Multi-stage cost reconciliation and budget tracking for a school meal
//! assistance program: procurement, production and distribution costs are
//! composed into a cost per meal, tracked against plan budgets and reconciled
//! against current supplier and catalog data.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use services::BudgetLocks;
use store::CostStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CostStore>,
    pub config: Arc<Config>,
    pub budget_locks: BudgetLocks,
}

impl AppState {
    pub fn new(store: Arc<dyn CostStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
            budget_locks: BudgetLocks::default(),
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Meal Program Cost Engine API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
