//! Stage cost aggregation: procurement -> production -> distribution
//!
//! Each stage total is exactly the sum of the components it declares. The
//! composed flow adds the three stage totals and divides by meals delivered.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CostResult;
use crate::models::{ComputedCosts, DistributionEvent, ProcurementOrder, ProductionBatch};
use crate::types::{checked_sum, safe_div};

/// Costs extracted for a batch from its usage records and the plan's orders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcurementCost {
    /// Sum of usage record costs for the batch
    pub ingredient_cost: Decimal,
    pub shipping_cost: Decimal,
    pub other_transport_cost: Decimal,
    pub order_count: usize,
    pub snapshot_priced_records: usize,
    pub fallback_priced_records: usize,
}

impl ProcurementCost {
    /// Procurement stage total: logistics charged on the orders
    pub fn stage_total(&self) -> CostResult<Decimal> {
        checked_sum(
            "procurement stage",
            [self.shipping_cost, self.other_transport_cost],
        )
    }
}

/// Extract ingredient and logistics cost for a batch.
///
/// Logistics are summed once per distinct order id, so an order listed twice
/// is never charged twice.
pub fn extract_procurement_cost(
    batch: &ProductionBatch,
    plan_orders: &[ProcurementOrder],
) -> CostResult<ProcurementCost> {
    let mut ingredient_costs = Vec::with_capacity(batch.usage_records.len());
    let mut snapshot_priced_records = 0;
    for record in &batch.usage_records {
        if record.cost_source().is_snapshot() {
            snapshot_priced_records += 1;
        }
        ingredient_costs.push(record.total_cost()?);
    }
    let ingredient_cost = checked_sum("ingredient cost", ingredient_costs)?;

    let mut seen = HashSet::new();
    let distinct: Vec<&ProcurementOrder> = plan_orders
        .iter()
        .filter(|order| seen.insert(order.id))
        .collect();

    let shipping_cost = checked_sum("shipping cost", distinct.iter().map(|o| o.shipping_cost))?;
    let other_transport_cost = checked_sum(
        "other transport cost",
        distinct.iter().map(|o| o.other_transport_cost),
    )?;

    Ok(ProcurementCost {
        ingredient_cost,
        shipping_cost,
        other_transport_cost,
        order_count: distinct.len(),
        snapshot_priced_records,
        fallback_priced_records: batch.usage_records.len() - snapshot_priced_records,
    })
}

/// Production stage breakdown
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductionCost {
    pub ingredient_cost: Decimal,
    pub labor_cost: Decimal,
    pub utility_cost: Decimal,
    pub other_costs: Decimal,
    pub total: Decimal,
}

impl ProductionCost {
    pub fn aggregate(ingredient_cost: Decimal, batch: &ProductionBatch) -> CostResult<Self> {
        let total = checked_sum(
            "production stage",
            [
                ingredient_cost,
                batch.labor_cost,
                batch.utility_cost,
                batch.other_costs,
            ],
        )?;
        Ok(Self {
            ingredient_cost,
            labor_cost: batch.labor_cost,
            utility_cost: batch.utility_cost,
            other_costs: batch.other_costs,
            total,
        })
    }
}

/// Distribution stage breakdown
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DistributionCost {
    pub transport_cost: Decimal,
    pub packaging_cost: Decimal,
    pub labor_cost: Decimal,
    pub other_costs: Decimal,
    pub total: Decimal,
}

impl DistributionCost {
    pub fn aggregate(event: &DistributionEvent) -> CostResult<Self> {
        let total = checked_sum(
            "distribution stage",
            [
                event.transport_cost,
                event.packaging_cost,
                event.labor_cost,
                event.other_costs,
            ],
        )?;
        Ok(Self {
            transport_cost: event.transport_cost,
            packaging_cost: event.packaging_cost,
            labor_cost: event.labor_cost,
            other_costs: event.other_costs,
            total,
        })
    }
}

/// End-to-end cost of the meals delivered by one distribution event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CostFlow {
    pub procurement: ProcurementCost,
    pub production: ProductionCost,
    pub distribution: DistributionCost,
    pub total_procurement_cost: Decimal,
    pub total_production_cost: Decimal,
    pub total_distribution_cost: Decimal,
    pub total_cost: Decimal,
    pub meals_delivered: i32,
    pub cost_per_meal: Decimal,
}

impl CostFlow {
    pub fn compose(
        procurement: ProcurementCost,
        production: ProductionCost,
        distribution: DistributionCost,
        meals_delivered: i32,
    ) -> CostResult<Self> {
        let total_procurement_cost = procurement.stage_total()?;
        let total_cost = checked_sum(
            "total cost",
            [total_procurement_cost, production.total, distribution.total],
        )?;
        let cost_per_meal = cost_per_meal(total_cost, meals_delivered)?;

        Ok(Self {
            total_procurement_cost,
            total_production_cost: production.total,
            total_distribution_cost: distribution.total,
            total_cost,
            meals_delivered,
            cost_per_meal,
            procurement,
            production,
            distribution,
        })
    }

    /// Figures written back onto the distribution event
    pub fn computed_costs(&self) -> ComputedCosts {
        ComputedCosts {
            procurement_cost: self.total_procurement_cost,
            production_cost: self.total_production_cost,
            distribution_cost: self.total_distribution_cost,
            total_cost: self.total_cost,
            cost_per_meal: self.cost_per_meal,
        }
    }
}

/// Total cost divided by meals; zero when no meals were delivered
pub fn cost_per_meal(total_cost: Decimal, meals_delivered: i32) -> CostResult<Decimal> {
    if meals_delivered <= 0 {
        return Ok(Decimal::ZERO);
    }
    safe_div("cost per meal", total_cost, Decimal::from(meals_delivered))
}
