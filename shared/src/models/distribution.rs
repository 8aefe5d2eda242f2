//! Meal distribution models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A delivery of meals from a production batch to beneficiaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionEvent {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub production_batch_id: Option<Uuid>,
    pub distribution_code: String,
    pub distribution_date: Option<DateTime<Utc>>,
    pub transport_cost: Decimal,
    pub packaging_cost: Decimal,
    pub labor_cost: Decimal,
    pub other_costs: Decimal,
    pub planned_recipients: i32,
    pub actual_recipients: Option<i32>,
    /// Totals written by the last cost composition
    pub computed: Option<ComputedCosts>,
    pub created_at: DateTime<Utc>,
}

impl DistributionEvent {
    /// Actual recipients when recorded, otherwise the planned count
    pub fn meals_delivered(&self) -> i32 {
        self.actual_recipients.unwrap_or(self.planned_recipients)
    }
}

/// Cost figures persisted onto a distribution event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComputedCosts {
    pub procurement_cost: Decimal,
    pub production_cost: Decimal,
    pub distribution_cost: Decimal,
    pub total_cost: Decimal,
    pub cost_per_meal: Decimal,
}
