//! Procurement cost extraction for a production batch

use std::sync::Arc;

use shared::costing::{extract_procurement_cost, ProcurementCost};
use shared::validate_batch_costs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::CostStore;

/// Reads a batch and the orders under its plan, then prices its ingredients
#[derive(Clone)]
pub struct ProcurementCostService {
    store: Arc<dyn CostStore>,
}

impl ProcurementCostService {
    pub fn new(store: Arc<dyn CostStore>) -> Self {
        Self { store }
    }

    /// Ingredient and logistics cost attributable to a batch
    #[tracing::instrument(skip(self))]
    pub async fn extract(&self, tenant_id: Uuid, batch_id: Uuid) -> AppResult<ProcurementCost> {
        let detail = self
            .store
            .get_production_batch(tenant_id, batch_id)
            .await?
            .ok_or_else(|| AppError::not_found("Production batch", batch_id))?;

        validate_batch_costs(&detail.batch)
            .map_err(|msg| AppError::InvalidState(format!("Production batch {}: {}", batch_id, msg)))?;

        let cost = extract_procurement_cost(&detail.batch, &detail.plan_orders)?;

        tracing::debug!(
            "Batch {} ingredients {} ({} snapshot-priced, {} fallback-priced), logistics over {} orders",
            detail.batch.batch_number,
            cost.ingredient_cost,
            cost.snapshot_priced_records,
            cost.fallback_priced_records,
            cost.order_count
        );

        Ok(cost)
    }
}
