//! Cost extraction and composition handlers

use axum::{
    extract::{Path, State},
    Json,
};
use shared::costing::ProcurementCost;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::{check_permission, CurrentUser, COSTING_WRITE, REPORTS_READ};
use crate::services::cost_flow::{CostFlowResult, CostFlowService};
use crate::services::ProcurementCostService;
use crate::AppState;

/// Ingredient and logistics cost of a production batch
pub async fn get_procurement_cost(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<ProcurementCost>> {
    check_permission(&user, REPORTS_READ)?;

    let service = ProcurementCostService::new(state.store.clone());
    let cost = service.extract(user.tenant_id, batch_id).await?;
    Ok(Json(cost))
}

/// Recompute and persist the cost chain of a distribution event
pub async fn compose_distribution_costs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<Uuid>,
) -> AppResult<Json<CostFlowResult>> {
    check_permission(&user, COSTING_WRITE)?;

    let service = CostFlowService::new(state.store.clone());
    let result = service.compose(user.tenant_id, event_id).await?;
    Ok(Json(result))
}
