//! Planned vs. actual category variance

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::budget::BudgetStatus;
use shared::variance::{analyze, VarianceReport};
use shared::CategoryAmounts;
use uuid::Uuid;

use crate::error::AppResult;
use crate::store::CostStore;

use super::budget::load_valid_plan;

#[derive(Clone)]
pub struct VarianceService {
    store: Arc<dyn CostStore>,
    threshold_percent: Decimal,
}

impl VarianceService {
    pub fn new(store: Arc<dyn CostStore>, threshold_percent: Decimal) -> Self {
        Self {
            store,
            threshold_percent,
        }
    }

    /// Read the plan and compare its allocation with current spend
    #[tracing::instrument(skip(self))]
    pub async fn analyze_plan(&self, tenant_id: Uuid, plan_id: Uuid) -> AppResult<VarianceReport> {
        let detail = load_valid_plan(self.store.as_ref(), tenant_id, plan_id).await?;

        let status = shared::budget::summarize_plan(&detail)?;
        self.report(&detail.plan.allocation, &status)
    }

    /// Variance of an already computed budget status
    pub fn report(&self, allocation: &CategoryAmounts, status: &BudgetStatus) -> AppResult<VarianceReport> {
        let report = analyze(allocation, status, self.threshold_percent)?;

        if !report.significant_categories.is_empty() {
            tracing::warn!(
                "Plan {} has {} significant category variances",
                report.plan_id,
                report.significant_categories.len()
            );
        }

        Ok(report)
    }
}
