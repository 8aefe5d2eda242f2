//! Budget, variance, efficiency and pipeline handlers

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared::efficiency::EfficiencyMetrics;
use shared::variance::VarianceReport;
use shared::{BudgetPeriod, BudgetTrackingAggregate};
use uuid::Uuid;
use validator::Validate;

use super::ExportFormat;
use crate::error::AppResult;
use crate::middleware::auth::{
    check_permission, CurrentUser, BUDGET_WRITE, COSTING_WRITE, REPORTS_READ,
};
use crate::services::budget::BudgetTracking;
use crate::services::export::to_csv;
use crate::services::pipeline::PlanCostReport;
use crate::services::{BudgetService, CostPipeline, EfficiencyService, VarianceService};
use crate::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct BudgetQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MonthlyBudgetQuery {
    #[validate(range(min = 1, max = 12))]
    pub month: u32,
    #[validate(range(min = 2000, max = 2100))]
    pub year: i32,
}

fn budget_service(state: &AppState) -> BudgetService {
    BudgetService::new(state.store.clone(), state.budget_locks.clone())
}

/// Recompute a plan's spend and refresh its monthly aggregate
pub async fn track_plan_budget(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(plan_id): Path<Uuid>,
) -> AppResult<Json<BudgetTracking>> {
    check_permission(&user, BUDGET_WRITE)?;

    let tracking = budget_service(&state).track(user.tenant_id, plan_id).await?;
    Ok(Json(tracking))
}

/// Current budget position of a plan (read only)
pub async fn get_plan_budget(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(plan_id): Path<Uuid>,
    Query(query): Query<BudgetQuery>,
) -> AppResult<Response> {
    check_permission(&user, REPORTS_READ)?;

    let status = budget_service(&state).summarize(user.tenant_id, plan_id).await?;

    match query.format {
        ExportFormat::Csv => {
            let csv = to_csv(&status.categories)?;
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv"),
                    (header::CONTENT_DISPOSITION, "attachment; filename=\"plan_budget.csv\""),
                ],
                csv,
            )
                .into_response())
        }
        ExportFormat::Json => Ok(Json(status).into_response()),
    }
}

pub async fn get_plan_variance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(plan_id): Path<Uuid>,
) -> AppResult<Json<VarianceReport>> {
    check_permission(&user, REPORTS_READ)?;

    let service = VarianceService::new(
        state.store.clone(),
        state.config.costing.significant_variance_percent,
    );
    let report = service.analyze_plan(user.tenant_id, plan_id).await?;
    Ok(Json(report))
}

pub async fn get_plan_efficiency(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(plan_id): Path<Uuid>,
) -> AppResult<Json<EfficiencyMetrics>> {
    check_permission(&user, REPORTS_READ)?;

    let service = EfficiencyService::new(state.store.clone(), state.config.costing.on_time_threshold());
    let metrics = service.compute(user.tenant_id, plan_id).await?;
    Ok(Json(metrics))
}

/// Run composition, tracking, variance and efficiency for a whole plan
pub async fn run_plan_pipeline(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(plan_id): Path<Uuid>,
) -> AppResult<Json<PlanCostReport>> {
    check_permission(&user, COSTING_WRITE)?;
    check_permission(&user, BUDGET_WRITE)?;

    let pipeline = CostPipeline::new(
        state.store.clone(),
        state.budget_locks.clone(),
        &state.config.costing,
    );
    let report = pipeline.run_for_plan(user.tenant_id, plan_id).await?;
    Ok(Json(report))
}

/// Persisted monthly budget aggregate
pub async fn get_monthly_budget(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<MonthlyBudgetQuery>,
) -> AppResult<Json<BudgetTrackingAggregate>> {
    check_permission(&user, REPORTS_READ)?;
    query.validate()?;

    let aggregate = budget_service(&state)
        .monthly(user.tenant_id, BudgetPeriod::new(query.month, query.year))
        .await?;
    Ok(Json(aggregate))
}
