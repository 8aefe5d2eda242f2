//! Cost flow composition across procurement, production and distribution

use std::sync::Arc;

use serde::Serialize;
use shared::costing::{extract_procurement_cost, CostFlow, DistributionCost, ProductionCost};
use shared::{validate_batch_costs, validate_distribution};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{CostStore, DistributionCostUpdate, ProductionCostUpdate};

/// Composed costs of one distribution event
#[derive(Debug, Clone, Serialize)]
pub struct CostFlowResult {
    pub distribution_event_id: Uuid,
    pub production_batch_id: Uuid,
    #[serde(flatten)]
    pub flow: CostFlow,
}

/// The only writer of distribution and batch cost totals
#[derive(Clone)]
pub struct CostFlowService {
    store: Arc<dyn CostStore>,
}

impl CostFlowService {
    pub fn new(store: Arc<dyn CostStore>) -> Self {
        Self { store }
    }

    /// Recompute the cost chain of a distribution event and overwrite the
    /// persisted totals. Every read happens before the first write.
    #[tracing::instrument(skip(self))]
    pub async fn compose(&self, tenant_id: Uuid, event_id: Uuid) -> AppResult<CostFlowResult> {
        let event = self
            .store
            .get_distribution_event(tenant_id, event_id)
            .await?
            .ok_or_else(|| AppError::not_found("Distribution event", event_id))?;

        let batch_id = event.production_batch_id.ok_or_else(|| {
            AppError::InvalidState(format!(
                "Distribution event {} is not linked to a production batch",
                event.distribution_code
            ))
        })?;

        validate_distribution(&event).map_err(|msg| {
            AppError::InvalidState(format!("Distribution event {}: {}", event.distribution_code, msg))
        })?;

        let detail = self
            .store
            .get_production_batch(tenant_id, batch_id)
            .await?
            .ok_or_else(|| AppError::not_found("Production batch", batch_id))?;

        validate_batch_costs(&detail.batch)
            .map_err(|msg| AppError::InvalidState(format!("Production batch {}: {}", batch_id, msg)))?;

        let procurement = extract_procurement_cost(&detail.batch, &detail.plan_orders)?;
        let production = ProductionCost::aggregate(procurement.ingredient_cost, &detail.batch)?;
        let distribution = DistributionCost::aggregate(&event)?;
        let flow = CostFlow::compose(procurement, production, distribution, event.meals_delivered())?;

        tracing::debug!(
            "Event {}: procurement {}, production {}, distribution {}",
            event.distribution_code,
            flow.total_procurement_cost,
            flow.total_production_cost,
            flow.total_distribution_cost
        );

        self.store
            .update_production_costs(
                tenant_id,
                batch_id,
                ProductionCostUpdate {
                    ingredient_cost: flow.production.ingredient_cost,
                    total_cost: flow.total_production_cost,
                },
            )
            .await?;

        let computed = flow.computed_costs();
        self.store
            .update_distribution_costs(
                tenant_id,
                event_id,
                DistributionCostUpdate {
                    procurement_cost: computed.procurement_cost,
                    production_cost: computed.production_cost,
                    distribution_cost: computed.distribution_cost,
                    total_cost: computed.total_cost,
                    cost_per_meal: computed.cost_per_meal,
                },
            )
            .await?;

        tracing::info!(
            "Composed costs for event {}: total {} over {} meals, {} per meal",
            event.distribution_code,
            flow.total_cost,
            flow.meals_delivered,
            flow.cost_per_meal
        );

        Ok(CostFlowResult {
            distribution_event_id: event_id,
            production_batch_id: batch_id,
            flow,
        })
    }
}
