//! Budget tracking per procurement plan and monthly rollups

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use serde::Serialize;
use shared::budget::{rollup_month, summarize_plan, BudgetStatus};
use shared::{validate_plan_detail, BudgetPeriod, BudgetTrackingAggregate, ProcurementPlanDetail};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{CostStore, MonthlyAggregateUpdate, PlanBudgetUpdate};

/// Read a plan with its orders, batches and distributions and reject it when
/// any stored figure is invalid, before anything is derived from it
pub(crate) async fn load_valid_plan(
    store: &dyn CostStore,
    tenant_id: Uuid,
    plan_id: Uuid,
) -> AppResult<ProcurementPlanDetail> {
    let detail = store
        .get_procurement_plan(tenant_id, plan_id)
        .await?
        .ok_or_else(|| AppError::not_found("Procurement plan", plan_id))?;

    validate_plan_detail(&detail).map_err(|msg| {
        AppError::InvalidState(format!("Procurement plan {}: {}", detail.plan.plan_name, msg))
    })?;

    Ok(detail)
}

/// Async mutexes handed out per key. Entries nobody holds or waits on are
/// dropped on the next acquire, so the map stays as large as the set of keys
/// in use.
pub struct KeyedLocks<K> {
    inner: Arc<Mutex<HashMap<K, Arc<Mutex<()>>>>>,
}

impl<K> Clone for KeyedLocks<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K: Eq + Hash> KeyedLocks<K> {
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().await;
            // clones are only taken under this lock, so a count of one is final
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(key).or_default())
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

/// Serializes budget tracking per plan, and the monthly upsert per tenant month
#[derive(Clone, Default)]
pub struct BudgetLocks {
    plans: KeyedLocks<Uuid>,
    months: KeyedLocks<(Uuid, BudgetPeriod)>,
}

/// Outcome of tracking a plan
#[derive(Debug, Clone, Serialize)]
pub struct BudgetTracking {
    pub status: BudgetStatus,
    pub monthly: BudgetTrackingAggregate,
}

#[derive(Clone)]
pub struct BudgetService {
    store: Arc<dyn CostStore>,
    locks: BudgetLocks,
}

impl BudgetService {
    pub fn new(store: Arc<dyn CostStore>, locks: BudgetLocks) -> Self {
        Self { store, locks }
    }

    /// Budget position of a plan, without persisting anything
    #[tracing::instrument(skip(self))]
    pub async fn summarize(&self, tenant_id: Uuid, plan_id: Uuid) -> AppResult<BudgetStatus> {
        let detail = load_valid_plan(self.store.as_ref(), tenant_id, plan_id).await?;

        Ok(summarize_plan(&detail)?)
    }

    /// Recompute a plan's spend, write it onto the plan and refresh the
    /// monthly aggregate of the plan's period
    #[tracing::instrument(skip(self))]
    pub async fn track(&self, tenant_id: Uuid, plan_id: Uuid) -> AppResult<BudgetTracking> {
        let _plan_guard = self.locks.plans.acquire(plan_id).await;

        let status = self.summarize(tenant_id, plan_id).await?;

        self.store
            .update_procurement_plan_budget(
                tenant_id,
                plan_id,
                PlanBudgetUpdate {
                    used_budget: status.total_spent(),
                    remaining_budget: status.remaining_budget,
                    category_spent: status.spend.category_spent,
                },
            )
            .await?;

        if status.is_over_budget {
            tracing::warn!(
                "Plan {} is over budget by {} ({}% utilized)",
                plan_id,
                status.projected_overrun,
                status.utilization_rate.round_dp(2)
            );
        }

        let monthly = self.refresh_month(tenant_id, status.period).await?;

        tracing::info!(
            "Tracked plan {}: spent {} of {}, month {} now at {}",
            plan_id,
            status.total_spent(),
            status.allocated_budget,
            status.period,
            monthly.spent
        );

        Ok(BudgetTracking { status, monthly })
    }

    /// Roll up every plan of a month into its aggregate row
    async fn refresh_month(
        &self,
        tenant_id: Uuid,
        period: BudgetPeriod,
    ) -> AppResult<BudgetTrackingAggregate> {
        let _month_guard = self.locks.months.acquire((tenant_id, period)).await;

        let plans = self.store.list_plan_budgets(tenant_id, period).await?;
        let rollup = rollup_month(&plans)?;

        self.store
            .upsert_monthly_budget_aggregate(
                tenant_id,
                period,
                MonthlyAggregateUpdate {
                    allocated: rollup.allocated,
                    spent: rollup.spent,
                    category_spent: rollup.category_spent,
                    utilization_rate: rollup.utilization_rate,
                    plan_count: rollup.plan_count,
                },
            )
            .await
    }

    /// Persisted monthly aggregate of a tenant
    pub async fn monthly(
        &self,
        tenant_id: Uuid,
        period: BudgetPeriod,
    ) -> AppResult<BudgetTrackingAggregate> {
        self.store
            .get_monthly_aggregate(tenant_id, period)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Budget tracking for {}", period)))
    }
}
