//! In-memory cost store
//!
//! Implements the same contracts as the Postgres store over plain maps. Used
//! by the integration tests and for running the engine without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    BudgetPeriod, BudgetTrackingAggregate, ComputedCosts, CurrentItemView, CurrentSupplierView,
    DistributionEvent, OrderWithCurrent, PlanBudgetRollup, ProcurementOrder, ProcurementPlan,
    ProcurementPlanDetail, ProductionBatch,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CostStore, DistributionCostUpdate, MonthlyAggregateUpdate, OrderFilter, PlanBudgetUpdate,
    ProductionBatchDetail, ProductionCostUpdate,
};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct MemoryState {
    plans: HashMap<Uuid, ProcurementPlan>,
    orders: HashMap<Uuid, ProcurementOrder>,
    batches: HashMap<Uuid, ProductionBatch>,
    events: HashMap<Uuid, DistributionEvent>,
    suppliers: HashMap<Uuid, (Uuid, CurrentSupplierView)>,
    items: HashMap<Uuid, (Uuid, CurrentItemView)>,
    aggregates: HashMap<(Uuid, BudgetPeriod), BudgetTrackingAggregate>,
    writes: usize,
    read_failure: Option<String>,
}

impl MemoryState {
    fn check_read(&self) -> AppResult<()> {
        match &self.read_failure {
            Some(msg) => Err(AppError::Internal(msg.clone())),
            None => Ok(()),
        }
    }

    fn plan_orders(&self, tenant_id: Uuid, plan_id: Option<Uuid>) -> Vec<ProcurementOrder> {
        let Some(plan_id) = plan_id else {
            return Vec::new();
        };
        let mut orders: Vec<ProcurementOrder> = self
            .orders
            .values()
            .filter(|o| o.tenant_id == tenant_id && o.plan_id == Some(plan_id))
            .cloned()
            .collect();
        orders.sort_by_key(|o| (o.order_date, o.id));
        orders
    }
}

/// Map-backed [`CostStore`]
#[derive(Default)]
pub struct InMemoryCostStore {
    state: RwLock<MemoryState>,
}

impl InMemoryCostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_plan(&self, plan: ProcurementPlan) {
        self.state.write().await.plans.insert(plan.id, plan);
    }

    pub async fn insert_order(&self, order: ProcurementOrder) {
        self.state.write().await.orders.insert(order.id, order);
    }

    pub async fn insert_batch(&self, batch: ProductionBatch) {
        self.state.write().await.batches.insert(batch.id, batch);
    }

    pub async fn insert_event(&self, event: DistributionEvent) {
        self.state.write().await.events.insert(event.id, event);
    }

    /// Insert or replace the current master record of a supplier
    pub async fn put_supplier(&self, tenant_id: Uuid, supplier: CurrentSupplierView) {
        self.state
            .write()
            .await
            .suppliers
            .insert(supplier.supplier_id, (tenant_id, supplier));
    }

    /// Insert or replace the current catalog record of an item
    pub async fn put_item(&self, tenant_id: Uuid, item: CurrentItemView) {
        self.state
            .write()
            .await
            .items
            .insert(item.item_id, (tenant_id, item));
    }

    /// Make every subsequent read fail with the given message
    pub async fn fail_reads(&self, message: Option<&str>) {
        self.state.write().await.read_failure = message.map(str::to_string);
    }

    pub async fn event(&self, event_id: Uuid) -> Option<DistributionEvent> {
        self.state.read().await.events.get(&event_id).cloned()
    }

    pub async fn batch(&self, batch_id: Uuid) -> Option<ProductionBatch> {
        self.state.read().await.batches.get(&batch_id).cloned()
    }

    pub async fn plan(&self, plan_id: Uuid) -> Option<ProcurementPlan> {
        self.state.read().await.plans.get(&plan_id).cloned()
    }

    pub async fn aggregate_count(&self) -> usize {
        self.state.read().await.aggregates.len()
    }

    /// Number of successful write-contract calls
    pub async fn write_count(&self) -> usize {
        self.state.read().await.writes
    }
}

#[async_trait]
impl CostStore for InMemoryCostStore {
    async fn ping(&self) -> AppResult<()> {
        self.state.read().await.check_read()
    }

    async fn get_production_batch(
        &self,
        tenant_id: Uuid,
        batch_id: Uuid,
    ) -> AppResult<Option<ProductionBatchDetail>> {
        let state = self.state.read().await;
        state.check_read()?;
        Ok(state
            .batches
            .get(&batch_id)
            .filter(|b| b.tenant_id == tenant_id)
            .map(|batch| ProductionBatchDetail {
                plan_orders: state.plan_orders(tenant_id, batch.plan_id),
                batch: batch.clone(),
            }))
    }

    async fn get_distribution_event(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
    ) -> AppResult<Option<DistributionEvent>> {
        let state = self.state.read().await;
        state.check_read()?;
        Ok(state
            .events
            .get(&event_id)
            .filter(|e| e.tenant_id == tenant_id)
            .cloned())
    }

    async fn get_procurement_plan(
        &self,
        tenant_id: Uuid,
        plan_id: Uuid,
    ) -> AppResult<Option<ProcurementPlanDetail>> {
        let state = self.state.read().await;
        state.check_read()?;
        let Some(plan) = state.plans.get(&plan_id).filter(|p| p.tenant_id == tenant_id) else {
            return Ok(None);
        };

        let mut batches: Vec<ProductionBatch> = state
            .batches
            .values()
            .filter(|b| b.tenant_id == tenant_id && b.plan_id == Some(plan_id))
            .cloned()
            .collect();
        batches.sort_by_key(|b| (b.production_date, b.id));

        let mut distributions: Vec<DistributionEvent> = state
            .events
            .values()
            .filter(|e| e.tenant_id == tenant_id && e.plan_id == Some(plan_id))
            .cloned()
            .collect();
        distributions.sort_by_key(|e| (e.created_at, e.id));

        Ok(Some(ProcurementPlanDetail {
            plan: plan.clone(),
            orders: state.plan_orders(tenant_id, Some(plan_id)),
            batches,
            distributions,
        }))
    }

    async fn list_procurement_orders(
        &self,
        tenant_id: Uuid,
        filter: &OrderFilter,
    ) -> AppResult<Vec<OrderWithCurrent>> {
        let state = self.state.read().await;
        state.check_read()?;

        let mut orders: Vec<&ProcurementOrder> = state
            .orders
            .values()
            .filter(|o| o.tenant_id == tenant_id && filter.matches(o))
            .collect();
        orders.sort_by_key(|o| (o.order_date, o.id));

        Ok(orders
            .into_iter()
            .map(|order| {
                let current_supplier = state
                    .suppliers
                    .get(&order.supplier_id)
                    .filter(|(owner, _)| *owner == tenant_id)
                    .map(|(_, s)| s.clone());
                let current_items = order
                    .items
                    .iter()
                    .filter_map(|line| line.inventory_item_id)
                    .filter_map(|id| state.items.get(&id))
                    .filter(|(owner, _)| *owner == tenant_id)
                    .map(|(_, item)| item.clone())
                    .collect();
                OrderWithCurrent {
                    order: order.clone(),
                    current_supplier,
                    current_items,
                }
            })
            .collect())
    }

    async fn list_plan_budgets(
        &self,
        tenant_id: Uuid,
        period: BudgetPeriod,
    ) -> AppResult<Vec<PlanBudgetRollup>> {
        let state = self.state.read().await;
        state.check_read()?;
        let mut rollups: Vec<PlanBudgetRollup> = state
            .plans
            .values()
            .filter(|p| p.tenant_id == tenant_id && p.period == period)
            .map(|p| PlanBudgetRollup {
                plan_id: p.id,
                total_budget: p.total_budget,
                used_budget: p.used_budget.unwrap_or_default(),
                category_spent: p.category_spent.unwrap_or_default(),
            })
            .collect();
        rollups.sort_by_key(|r| r.plan_id);
        Ok(rollups)
    }

    async fn get_monthly_aggregate(
        &self,
        tenant_id: Uuid,
        period: BudgetPeriod,
    ) -> AppResult<Option<BudgetTrackingAggregate>> {
        let state = self.state.read().await;
        state.check_read()?;
        Ok(state.aggregates.get(&(tenant_id, period)).cloned())
    }

    async fn update_distribution_costs(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
        update: DistributionCostUpdate,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let event = state
            .events
            .get_mut(&event_id)
            .filter(|e| e.tenant_id == tenant_id)
            .ok_or_else(|| AppError::not_found("Distribution event", event_id))?;
        event.computed = Some(ComputedCosts {
            procurement_cost: update.procurement_cost,
            production_cost: update.production_cost,
            distribution_cost: update.distribution_cost,
            total_cost: update.total_cost,
            cost_per_meal: update.cost_per_meal,
        });
        state.writes += 1;
        Ok(())
    }

    async fn update_production_costs(
        &self,
        tenant_id: Uuid,
        batch_id: Uuid,
        update: ProductionCostUpdate,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let batch = state
            .batches
            .get_mut(&batch_id)
            .filter(|b| b.tenant_id == tenant_id)
            .ok_or_else(|| AppError::not_found("Production batch", batch_id))?;
        batch.ingredient_cost = Some(update.ingredient_cost);
        batch.total_cost = Some(update.total_cost);
        state.writes += 1;
        Ok(())
    }

    async fn update_procurement_plan_budget(
        &self,
        tenant_id: Uuid,
        plan_id: Uuid,
        update: PlanBudgetUpdate,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let plan = state
            .plans
            .get_mut(&plan_id)
            .filter(|p| p.tenant_id == tenant_id)
            .ok_or_else(|| AppError::not_found("Procurement plan", plan_id))?;
        plan.used_budget = Some(update.used_budget);
        plan.remaining_budget = Some(update.remaining_budget);
        plan.category_spent = Some(update.category_spent);
        state.writes += 1;
        Ok(())
    }

    async fn upsert_monthly_budget_aggregate(
        &self,
        tenant_id: Uuid,
        period: BudgetPeriod,
        update: MonthlyAggregateUpdate,
    ) -> AppResult<BudgetTrackingAggregate> {
        let mut state = self.state.write().await;
        let aggregate = state
            .aggregates
            .entry((tenant_id, period))
            .or_insert_with(|| BudgetTrackingAggregate {
                id: Uuid::new_v4(),
                tenant_id,
                period,
                allocated: Default::default(),
                spent: Default::default(),
                category_spent: Default::default(),
                utilization_rate: Default::default(),
                plan_count: 0,
                updated_at: Utc::now(),
            });
        aggregate.allocated = update.allocated;
        aggregate.spent = update.spent;
        aggregate.category_spent = update.category_spent;
        aggregate.utilization_rate = update.utilization_rate;
        aggregate.plan_count = update.plan_count;
        aggregate.updated_at = Utc::now();
        let result = aggregate.clone();
        state.writes += 1;
        Ok(result)
    }
}
