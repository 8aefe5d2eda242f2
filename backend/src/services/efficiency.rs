//! Distribution efficiency reporting

use std::sync::Arc;

use chrono::Duration;
use shared::efficiency::{compute_metrics, EfficiencyMetrics};
use uuid::Uuid;

use crate::error::AppResult;
use crate::store::CostStore;

use super::budget::load_valid_plan;

#[derive(Clone)]
pub struct EfficiencyService {
    store: Arc<dyn CostStore>,
    on_time_threshold: Duration,
}

impl EfficiencyService {
    pub fn new(store: Arc<dyn CostStore>, on_time_threshold: Duration) -> Self {
        Self {
            store,
            on_time_threshold,
        }
    }

    /// Timeliness and cost metrics over every distribution of a plan
    #[tracing::instrument(skip(self))]
    pub async fn compute(&self, tenant_id: Uuid, plan_id: Uuid) -> AppResult<EfficiencyMetrics> {
        let detail = load_valid_plan(self.store.as_ref(), tenant_id, plan_id).await?;

        let metrics = compute_metrics(plan_id, &detail.distributions, self.on_time_threshold)?;

        tracing::debug!(
            "Plan {}: {}/{} distributions on time",
            plan_id,
            metrics.on_time_count,
            metrics.total_distributions
        );

        Ok(metrics)
    }
}
