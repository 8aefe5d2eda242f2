//! Procurement plan and budget rollup models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CategoryBucket, DistributionEvent, ProcurementOrder, ProductionBatch};
use crate::error::{CostError, CostResult};
use crate::types::{checked_sum, BudgetPeriod};

/// An amount per category bucket
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryAmounts {
    pub protein: Decimal,
    pub carbohydrate: Decimal,
    pub vegetable: Decimal,
    pub fruit: Decimal,
    pub other: Decimal,
}

impl CategoryAmounts {
    pub fn get(&self, bucket: CategoryBucket) -> Decimal {
        match bucket {
            CategoryBucket::Protein => self.protein,
            CategoryBucket::Carbohydrate => self.carbohydrate,
            CategoryBucket::Vegetable => self.vegetable,
            CategoryBucket::Fruit => self.fruit,
            CategoryBucket::Other => self.other,
        }
    }

    fn slot(&mut self, bucket: CategoryBucket) -> &mut Decimal {
        match bucket {
            CategoryBucket::Protein => &mut self.protein,
            CategoryBucket::Carbohydrate => &mut self.carbohydrate,
            CategoryBucket::Vegetable => &mut self.vegetable,
            CategoryBucket::Fruit => &mut self.fruit,
            CategoryBucket::Other => &mut self.other,
        }
    }

    pub fn add(&mut self, bucket: CategoryBucket, amount: Decimal) -> CostResult<()> {
        let slot = self.slot(bucket);
        *slot = slot
            .checked_add(amount)
            .ok_or_else(|| CostError::overflow(bucket.as_str()))?;
        Ok(())
    }

    /// Add every bucket of `other` into this one
    pub fn merge(&mut self, other: &CategoryAmounts) -> CostResult<()> {
        for bucket in CategoryBucket::ALL {
            self.add(bucket, other.get(bucket))?;
        }
        Ok(())
    }

    pub fn total(&self) -> CostResult<Decimal> {
        checked_sum("category total", CategoryBucket::ALL.map(|b| self.get(b)))
    }
}

/// A monthly procurement plan with its allocated budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcurementPlan {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub plan_name: String,
    pub period: BudgetPeriod,
    pub total_budget: Decimal,
    /// Planned sub-budgets per category
    pub allocation: CategoryAmounts,
    /// Last tracked spend; recomputed on every budget run
    pub used_budget: Option<Decimal>,
    pub remaining_budget: Option<Decimal>,
    pub category_spent: Option<CategoryAmounts>,
    pub created_at: DateTime<Utc>,
}

/// A plan together with everything it governs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcurementPlanDetail {
    pub plan: ProcurementPlan,
    pub orders: Vec<ProcurementOrder>,
    pub batches: Vec<ProductionBatch>,
    pub distributions: Vec<DistributionEvent>,
}

/// Persisted budget figures of one plan, as read for the monthly rollup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanBudgetRollup {
    pub plan_id: Uuid,
    pub total_budget: Decimal,
    pub used_budget: Decimal,
    pub category_spent: CategoryAmounts,
}

/// Monthly budget rollup for one tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetTrackingAggregate {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub period: BudgetPeriod,
    pub allocated: Decimal,
    pub spent: Decimal,
    pub category_spent: CategoryAmounts,
    pub utilization_rate: Decimal,
    pub plan_count: i32,
    pub updated_at: DateTime<Utc>,
}
