//! Budget tracking for procurement plans
//!
//! Procurement line items are bucketed into the five categories. Production
//! overhead, distribution costs and procurement logistics form an operational
//! total that counts toward overall spend but toward no category.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::costing::DistributionCost;
use crate::error::CostResult;
use crate::models::{
    CategoryAmounts, CategoryBucket, PlanBudgetRollup, ProcurementOrder, ProcurementPlanDetail,
};
use crate::types::{checked_sum, percent_of, BudgetPeriod};

/// Where a plan's money went
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpendBreakdown {
    pub category_spent: CategoryAmounts,
    /// Line-item spend; always equals the sum of `category_spent`
    pub procurement_spend: Decimal,
    pub procurement_logistics: Decimal,
    pub production_overhead: Decimal,
    pub distribution_spend: Decimal,
    pub operational_spend: Decimal,
    pub total_spent: Decimal,
}

/// Allocated vs. spent for one category bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryBudgetLine {
    pub bucket: CategoryBucket,
    pub allocated: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub utilization_rate: Decimal,
}

/// Budget position of a plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BudgetStatus {
    pub plan_id: Uuid,
    pub period: BudgetPeriod,
    pub allocated_budget: Decimal,
    pub spend: SpendBreakdown,
    pub remaining_budget: Decimal,
    pub utilization_rate: Decimal,
    pub is_over_budget: bool,
    pub projected_overrun: Decimal,
    pub categories: Vec<CategoryBudgetLine>,
}

impl BudgetStatus {
    pub fn total_spent(&self) -> Decimal {
        self.spend.total_spent
    }
}

/// Allocation-vs-spend figures shared by plans and monthly rollups
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BudgetPosition {
    pub remaining: Decimal,
    pub utilization_rate: Decimal,
    pub is_over_budget: bool,
    pub projected_overrun: Decimal,
}

impl BudgetPosition {
    pub fn evaluate(allocated: Decimal, spent: Decimal) -> CostResult<Self> {
        let remaining = allocated - spent;
        Ok(Self {
            remaining,
            utilization_rate: percent_of("utilization rate", spent, allocated)?,
            is_over_budget: spent > allocated,
            projected_overrun: (spent - allocated).max(Decimal::ZERO),
        })
    }
}

/// Bucket line-item spend of the given orders, each order counted once
pub fn bucket_spend(orders: &[ProcurementOrder]) -> CostResult<CategoryAmounts> {
    let mut seen = HashSet::new();
    let mut amounts = CategoryAmounts::default();
    for order in orders.iter().filter(|o| seen.insert(o.id)) {
        for item in &order.items {
            amounts.add(item.snapshot.category.bucket(), item.spend()?)?;
        }
    }
    Ok(amounts)
}

/// Compute the full spend breakdown for a plan
pub fn spend_breakdown(detail: &ProcurementPlanDetail) -> CostResult<SpendBreakdown> {
    let category_spent = bucket_spend(&detail.orders)?;
    let procurement_spend = category_spent.total()?;

    let mut seen = HashSet::new();
    let logistics = detail
        .orders
        .iter()
        .filter(|o| seen.insert(o.id))
        .map(ProcurementOrder::logistics_cost)
        .collect::<CostResult<Vec<_>>>()?;
    let procurement_logistics = checked_sum("procurement logistics", logistics)?;

    let overheads = detail
        .batches
        .iter()
        .map(|b| b.overhead_cost())
        .collect::<CostResult<Vec<_>>>()?;
    let production_overhead = checked_sum("production overhead", overheads)?;

    let distributions = detail
        .distributions
        .iter()
        .map(|e| DistributionCost::aggregate(e).map(|c| c.total))
        .collect::<CostResult<Vec<_>>>()?;
    let distribution_spend = checked_sum("distribution spend", distributions)?;

    let operational_spend = checked_sum(
        "operational spend",
        [procurement_logistics, production_overhead, distribution_spend],
    )?;
    let total_spent = checked_sum("total spent", [procurement_spend, operational_spend])?;

    Ok(SpendBreakdown {
        category_spent,
        procurement_spend,
        procurement_logistics,
        production_overhead,
        distribution_spend,
        operational_spend,
        total_spent,
    })
}

/// Summarize a plan's budget position without side effects
pub fn summarize_plan(detail: &ProcurementPlanDetail) -> CostResult<BudgetStatus> {
    let plan = &detail.plan;
    let spend = spend_breakdown(detail)?;
    let position = BudgetPosition::evaluate(plan.total_budget, spend.total_spent)?;

    let categories = CategoryBucket::ALL
        .iter()
        .map(|&bucket| {
            let allocated = plan.allocation.get(bucket);
            let spent = spend.category_spent.get(bucket);
            Ok(CategoryBudgetLine {
                bucket,
                allocated,
                spent,
                remaining: allocated - spent,
                utilization_rate: percent_of(bucket.as_str(), spent, allocated)?,
            })
        })
        .collect::<CostResult<Vec<_>>>()?;

    Ok(BudgetStatus {
        plan_id: plan.id,
        period: plan.period,
        allocated_budget: plan.total_budget,
        remaining_budget: position.remaining,
        utilization_rate: position.utilization_rate,
        is_over_budget: position.is_over_budget,
        projected_overrun: position.projected_overrun,
        spend,
        categories,
    })
}

/// Monthly rollup across every plan of a tenant's month
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthlyRollup {
    pub allocated: Decimal,
    pub spent: Decimal,
    pub category_spent: CategoryAmounts,
    pub utilization_rate: Decimal,
    pub plan_count: i32,
}

pub fn rollup_month(plans: &[PlanBudgetRollup]) -> CostResult<MonthlyRollup> {
    let allocated = checked_sum("monthly allocation", plans.iter().map(|p| p.total_budget))?;
    let spent = checked_sum("monthly spend", plans.iter().map(|p| p.used_budget))?;
    let mut category_spent = CategoryAmounts::default();
    for plan in plans {
        category_spent.merge(&plan.category_spent)?;
    }

    Ok(MonthlyRollup {
        utilization_rate: percent_of("monthly utilization", spent, allocated)?,
        allocated,
        spent,
        category_spent,
        plan_count: i32::try_from(plans.len()).unwrap_or(i32::MAX),
    })
}
