//! Validation utilities for the Meal Program Cost Engine
//!
//! These guard the figures the engine reads before any cost is derived from
//! them. A record failing validation is reported, never silently clamped.

use rust_decimal::Decimal;

use crate::models::{
    CategoryAmounts, DistributionEvent, ProcurementLineItem, ProcurementOrder, ProcurementPlan,
    ProcurementPlanDetail, ProductionBatch,
};

// ============================================================================
// Cost Component Validations
// ============================================================================

/// Validate that a cost component is not negative
pub fn validate_cost_component(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Cost components cannot be negative");
    }
    Ok(())
}

/// Validate the cost fields recorded on a production batch
pub fn validate_batch_costs(batch: &ProductionBatch) -> Result<(), &'static str> {
    validate_cost_component(batch.labor_cost)?;
    validate_cost_component(batch.utility_cost)?;
    validate_cost_component(batch.other_costs)?;
    for record in &batch.usage_records {
        if record.quantity_used < Decimal::ZERO {
            return Err("Usage quantity cannot be negative");
        }
        validate_cost_component(record.unit_cost)?;
    }
    Ok(())
}

/// Validate the cost and recipient fields recorded on a distribution event
pub fn validate_distribution(event: &DistributionEvent) -> Result<(), &'static str> {
    validate_cost_component(event.transport_cost)?;
    validate_cost_component(event.packaging_cost)?;
    validate_cost_component(event.labor_cost)?;
    validate_cost_component(event.other_costs)?;
    validate_recipients(event.planned_recipients, event.actual_recipients)
}

/// Validate recipient counts (both must be non-negative when present)
pub fn validate_recipients(planned: i32, actual: Option<i32>) -> Result<(), &'static str> {
    if planned < 0 {
        return Err("Planned recipients cannot be negative");
    }
    if actual.is_some_and(|a| a < 0) {
        return Err("Actual recipients cannot be negative");
    }
    Ok(())
}

/// Validate a line item's snapshot price and quantities
pub fn validate_line_item(item: &ProcurementLineItem) -> Result<(), &'static str> {
    validate_cost_component(item.snapshot.price_per_unit)?;
    if item.ordered_quantity < Decimal::ZERO {
        return Err("Ordered quantity cannot be negative");
    }
    if item.received_quantity.is_some_and(|q| q < Decimal::ZERO) {
        return Err("Received quantity cannot be negative");
    }
    Ok(())
}

/// Validate an order's logistics costs and every line on it
pub fn validate_order(order: &ProcurementOrder) -> Result<(), &'static str> {
    validate_cost_component(order.shipping_cost)?;
    validate_cost_component(order.other_transport_cost)?;
    order.items.iter().try_for_each(validate_line_item)
}

// ============================================================================
// Budget Validations
// ============================================================================

/// Validate that category allocations do not exceed the plan total
pub fn validate_allocation(total_budget: Decimal, allocation: &CategoryAmounts) -> Result<(), &'static str> {
    if total_budget < Decimal::ZERO {
        return Err("Total budget cannot be negative");
    }
    let mut sum = Decimal::ZERO;
    for amount in [
        allocation.protein,
        allocation.carbohydrate,
        allocation.vegetable,
        allocation.fruit,
        allocation.other,
    ] {
        validate_cost_component(amount)?;
        sum = sum
            .checked_add(amount)
            .ok_or("Category allocations exceed representable range")?;
    }
    if sum > total_budget {
        return Err("Category allocations exceed the total budget");
    }
    Ok(())
}

pub fn validate_plan(plan: &ProcurementPlan) -> Result<(), &'static str> {
    if !(1..=12).contains(&plan.period.month) {
        return Err("Plan month must be between 1 and 12");
    }
    validate_allocation(plan.total_budget, &plan.allocation)
}

/// Validate every record a plan summary reads: the plan, its orders, batches
/// and distributions
pub fn validate_plan_detail(detail: &ProcurementPlanDetail) -> Result<(), &'static str> {
    validate_plan(&detail.plan)?;
    detail.orders.iter().try_for_each(validate_order)?;
    detail.batches.iter().try_for_each(validate_batch_costs)?;
    detail.distributions.iter().try_for_each(validate_distribution)
}
