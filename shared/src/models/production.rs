//! Production batch models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CostError, CostResult};

/// A cooking/production run that consumes ingredients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionBatch {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub batch_number: String,
    pub production_date: NaiveDate,
    pub usage_records: Vec<UsageRecord>,
    pub labor_cost: Decimal,
    pub utility_cost: Decimal,
    pub other_costs: Decimal,
    /// Last computed ingredient cost, overwritten on every composition
    pub ingredient_cost: Option<Decimal>,
    /// Last computed production total, overwritten on every composition
    pub total_cost: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl ProductionBatch {
    /// Labor, utility and other costs recorded on the batch itself
    pub fn overhead_cost(&self) -> CostResult<Decimal> {
        crate::types::checked_sum(
            "batch overhead",
            [self.labor_cost, self.utility_cost, self.other_costs],
        )
    }
}

/// Reference from a usage record to the procurement line it was drawn from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItemPriceRef {
    pub line_item_id: Uuid,
    /// Snapshot price on that line item
    pub price_per_unit: Decimal,
}

/// Ingredient consumption within a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub inventory_item_id: Uuid,
    pub quantity_used: Decimal,
    /// Catalog unit cost at the time of use
    pub unit_cost: Decimal,
    pub source_line_item: Option<LineItemPriceRef>,
}

/// Where the unit price of a usage record comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CostSource {
    /// Snapshot price of the linked procurement line item
    LineItemSnapshot { line_item_id: Uuid, unit_price: Decimal },
    /// Catalog price, used when no procurement line is linked
    MasterFallback { unit_price: Decimal },
}

impl CostSource {
    pub fn unit_price(&self) -> Decimal {
        match self {
            CostSource::LineItemSnapshot { unit_price, .. } => *unit_price,
            CostSource::MasterFallback { unit_price } => *unit_price,
        }
    }

    pub fn is_snapshot(&self) -> bool {
        matches!(self, CostSource::LineItemSnapshot { .. })
    }
}

impl UsageRecord {
    /// The single price source for this record
    pub fn cost_source(&self) -> CostSource {
        match &self.source_line_item {
            Some(line) => CostSource::LineItemSnapshot {
                line_item_id: line.line_item_id,
                unit_price: line.price_per_unit,
            },
            None => CostSource::MasterFallback {
                unit_price: self.unit_cost,
            },
        }
    }

    pub fn total_cost(&self) -> CostResult<Decimal> {
        self.cost_source()
            .unit_price()
            .checked_mul(self.quantity_used)
            .ok_or_else(|| CostError::overflow("usage record cost"))
    }
}
