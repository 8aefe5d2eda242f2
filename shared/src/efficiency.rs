//! Distribution efficiency metrics

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::costing::DistributionCost;
use crate::error::CostResult;
use crate::models::DistributionEvent;
use crate::types::{checked_sum, percent_of, safe_div};

/// Default on-time window between record creation and distribution
pub const DEFAULT_ON_TIME_THRESHOLD_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryTimeliness {
    OnTime,
    Late,
}

/// Classify a delivery. The reference point is the record's creation time;
/// a missing distribution date counts as late.
pub fn classify_delivery(
    created_at: DateTime<Utc>,
    distribution_date: Option<DateTime<Utc>>,
    threshold: Duration,
) -> DeliveryTimeliness {
    match distribution_date {
        Some(date) if date - created_at <= threshold => DeliveryTimeliness::OnTime,
        _ => DeliveryTimeliness::Late,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EfficiencyMetrics {
    pub plan_id: Uuid,
    pub total_distributions: usize,
    pub on_time_count: usize,
    pub late_count: usize,
    pub on_time_percentage: Decimal,
    pub total_distribution_cost: Decimal,
    pub average_cost_per_distribution: Decimal,
    pub total_meals_delivered: i64,
    pub average_meals_per_distribution: Decimal,
    /// Distribution cost spread over all meals delivered
    pub distribution_cost_per_meal: Decimal,
    /// Distributions carrying totals from a cost composition
    pub composed_distributions: usize,
    /// Distributions not composed yet; excluded from the overall figures
    pub uncomposed_distributions: usize,
    /// Procurement, production and distribution totals of composed events
    pub total_composed_cost: Decimal,
    /// Composed total cost over the meals of the composed events
    pub overall_cost_per_meal: Decimal,
}

pub fn compute_metrics(
    plan_id: Uuid,
    events: &[DistributionEvent],
    threshold: Duration,
) -> CostResult<EfficiencyMetrics> {
    let on_time_count = events
        .iter()
        .filter(|e| {
            classify_delivery(e.created_at, e.distribution_date, threshold)
                == DeliveryTimeliness::OnTime
        })
        .count();
    let total = events.len();

    let costs = events
        .iter()
        .map(|e| DistributionCost::aggregate(e).map(|c| c.total))
        .collect::<CostResult<Vec<_>>>()?;
    let total_distribution_cost = checked_sum("distribution cost", costs)?;
    let total_meals_delivered: i64 = events
        .iter()
        .map(|e| i64::from(e.meals_delivered().max(0)))
        .sum();

    let composed: Vec<_> = events
        .iter()
        .filter_map(|e| e.computed.map(|c| (c.total_cost, e.meals_delivered().max(0))))
        .collect();
    let composed_distributions = composed.len();
    let total_composed_cost = checked_sum("composed cost", composed.iter().map(|(cost, _)| *cost))?;
    let composed_meals: i64 = composed.iter().map(|(_, meals)| i64::from(*meals)).sum();

    let count = Decimal::from(total);
    let meals = Decimal::from(total_meals_delivered);

    Ok(EfficiencyMetrics {
        plan_id,
        total_distributions: total,
        on_time_count,
        late_count: total - on_time_count,
        on_time_percentage: percent_of("on-time rate", Decimal::from(on_time_count), count)?,
        average_cost_per_distribution: safe_div("average cost", total_distribution_cost, count)?,
        total_meals_delivered,
        average_meals_per_distribution: safe_div("average meals", meals, count)?,
        distribution_cost_per_meal: safe_div("cost per meal", total_distribution_cost, meals)?,
        total_distribution_cost,
        composed_distributions,
        uncomposed_distributions: total - composed_distributions,
        overall_cost_per_meal: safe_div(
            "overall cost per meal",
            total_composed_cost,
            Decimal::from(composed_meals),
        )?,
        total_composed_cost,
    })
}
