//! Persistence contracts consumed by the cost engine
//!
//! Every call carries the tenant id. A row belonging to another tenant is
//! reported exactly like a missing row (`None`), never returned.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    BudgetPeriod, BudgetTrackingAggregate, CategoryAmounts, DateRange, DistributionEvent,
    OrderWithCurrent, PlanBudgetRollup, ProcurementOrder, ProcurementPlanDetail, ProductionBatch,
};
use uuid::Uuid;

use crate::error::AppResult;

pub use memory::InMemoryCostStore;
pub use postgres::PgCostStore;

/// A batch plus every order under the batch's plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionBatchDetail {
    pub batch: ProductionBatch,
    pub plan_orders: Vec<ProcurementOrder>,
}

/// Filters for listing procurement orders; date bounds are inclusive
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub supplier_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
}

impl OrderFilter {
    pub fn in_range(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date,
            end_date,
            ..Self::default()
        }
    }

    /// The closed range, when both ends are given
    pub fn date_range(&self) -> Option<DateRange> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)),
            _ => None,
        }
    }

    pub fn matches(&self, order: &ProcurementOrder) -> bool {
        self.start_date.map_or(true, |d| order.order_date >= d)
            && self.end_date.map_or(true, |d| order.order_date <= d)
            && self.supplier_id.map_or(true, |s| s == order.supplier_id)
            && self.plan_id.map_or(true, |p| Some(p) == order.plan_id)
    }
}

/// Totals written onto a distribution event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DistributionCostUpdate {
    pub procurement_cost: Decimal,
    pub production_cost: Decimal,
    pub distribution_cost: Decimal,
    pub total_cost: Decimal,
    pub cost_per_meal: Decimal,
}

/// Totals written onto a production batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductionCostUpdate {
    pub ingredient_cost: Decimal,
    pub total_cost: Decimal,
}

/// Budget figures written onto a procurement plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanBudgetUpdate {
    pub used_budget: Decimal,
    pub remaining_budget: Decimal,
    pub category_spent: CategoryAmounts,
}

/// Monthly aggregate figures to upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyAggregateUpdate {
    pub allocated: Decimal,
    pub spent: Decimal,
    pub category_spent: CategoryAmounts,
    pub utilization_rate: Decimal,
    pub plan_count: i32,
}

/// Read and write contracts of the persistence collaborator
#[async_trait]
pub trait CostStore: Send + Sync {
    /// Cheap connectivity probe
    async fn ping(&self) -> AppResult<()>;

    // ===== Reads =====

    async fn get_production_batch(
        &self,
        tenant_id: Uuid,
        batch_id: Uuid,
    ) -> AppResult<Option<ProductionBatchDetail>>;

    async fn get_distribution_event(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
    ) -> AppResult<Option<DistributionEvent>>;

    async fn get_procurement_plan(
        &self,
        tenant_id: Uuid,
        plan_id: Uuid,
    ) -> AppResult<Option<ProcurementPlanDetail>>;

    /// Orders with the current supplier and item projections they reference
    async fn list_procurement_orders(
        &self,
        tenant_id: Uuid,
        filter: &OrderFilter,
    ) -> AppResult<Vec<OrderWithCurrent>>;

    /// Persisted budget figures of every plan in a month
    async fn list_plan_budgets(
        &self,
        tenant_id: Uuid,
        period: BudgetPeriod,
    ) -> AppResult<Vec<PlanBudgetRollup>>;

    async fn get_monthly_aggregate(
        &self,
        tenant_id: Uuid,
        period: BudgetPeriod,
    ) -> AppResult<Option<BudgetTrackingAggregate>>;

    // ===== Writes (overwrite, never increment) =====

    async fn update_distribution_costs(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
        update: DistributionCostUpdate,
    ) -> AppResult<()>;

    async fn update_production_costs(
        &self,
        tenant_id: Uuid,
        batch_id: Uuid,
        update: ProductionCostUpdate,
    ) -> AppResult<()>;

    async fn update_procurement_plan_budget(
        &self,
        tenant_id: Uuid,
        plan_id: Uuid,
        update: PlanBudgetUpdate,
    ) -> AppResult<()>;

    /// Create the (tenant, month, year) row if absent, update it otherwise
    async fn upsert_monthly_budget_aggregate(
        &self,
        tenant_id: Uuid,
        period: BudgetPeriod,
        update: MonthlyAggregateUpdate,
    ) -> AppResult<BudgetTrackingAggregate>;
}
