//! Plan-wide cost pipeline
//!
//! Runs the stages in a fixed order: cost flow for every linked distribution,
//! then budget tracking, variance and efficiency. Each stage only consumes
//! what the previous one produced or persisted. Every record the stages read
//! is validated before the first write.

use std::sync::Arc;

use serde::Serialize;
use shared::efficiency::EfficiencyMetrics;
use shared::validate_batch_costs;
use shared::variance::VarianceReport;
use uuid::Uuid;

use crate::config::CostingConfig;
use crate::error::{AppError, AppResult};
use crate::store::CostStore;

use super::budget::{load_valid_plan, BudgetLocks, BudgetService, BudgetTracking};
use super::cost_flow::{CostFlowResult, CostFlowService};
use super::efficiency::EfficiencyService;
use super::variance::VarianceService;

#[derive(Debug, Clone, Serialize)]
pub struct PlanCostReport {
    pub plan_id: Uuid,
    pub cost_flows: Vec<CostFlowResult>,
    /// Distribution events left out because no production batch is linked
    pub unlinked_distributions: Vec<Uuid>,
    pub budget: BudgetTracking,
    pub variance: VarianceReport,
    pub efficiency: EfficiencyMetrics,
}

#[derive(Clone)]
pub struct CostPipeline {
    store: Arc<dyn CostStore>,
    cost_flow: CostFlowService,
    budget: BudgetService,
    variance: VarianceService,
    efficiency: EfficiencyService,
}

impl CostPipeline {
    pub fn new(store: Arc<dyn CostStore>, locks: BudgetLocks, costing: &CostingConfig) -> Self {
        Self {
            cost_flow: CostFlowService::new(Arc::clone(&store)),
            budget: BudgetService::new(Arc::clone(&store), locks),
            variance: VarianceService::new(Arc::clone(&store), costing.significant_variance_percent),
            efficiency: EfficiencyService::new(Arc::clone(&store), costing.on_time_threshold()),
            store,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn run_for_plan(&self, tenant_id: Uuid, plan_id: Uuid) -> AppResult<PlanCostReport> {
        let detail = load_valid_plan(self.store.as_ref(), tenant_id, plan_id).await?;

        let mut linked = Vec::new();
        let mut unlinked_distributions = Vec::new();
        for event in &detail.distributions {
            match event.production_batch_id {
                Some(batch_id) => linked.push((event.id, batch_id)),
                None => {
                    tracing::debug!("Skipping distribution {} without a batch", event.distribution_code);
                    unlinked_distributions.push(event.id);
                }
            }
        }

        // batches of the plan were validated with it; others are read here
        for &(_, batch_id) in &linked {
            if detail.batches.iter().any(|b| b.id == batch_id) {
                continue;
            }
            let batch = self
                .store
                .get_production_batch(tenant_id, batch_id)
                .await?
                .ok_or_else(|| AppError::not_found("Production batch", batch_id))?;
            validate_batch_costs(&batch.batch).map_err(|msg| {
                AppError::InvalidState(format!("Production batch {}: {}", batch_id, msg))
            })?;
        }

        let mut cost_flows = Vec::with_capacity(linked.len());
        for &(event_id, _) in &linked {
            cost_flows.push(self.cost_flow.compose(tenant_id, event_id).await?);
        }

        let budget = self.budget.track(tenant_id, plan_id).await?;
        let variance = self.variance.report(&detail.plan.allocation, &budget.status)?;
        let efficiency = self.efficiency.compute(tenant_id, plan_id).await?;

        tracing::info!(
            "Pipeline finished for plan {}: {} distributions composed, utilization {}%",
            detail.plan.plan_name,
            cost_flows.len(),
            budget.status.utilization_rate.round_dp(2)
        );

        Ok(PlanCostReport {
            plan_id,
            cost_flows,
            unlinked_distributions,
            budget,
            variance,
            efficiency,
        })
    }
}
