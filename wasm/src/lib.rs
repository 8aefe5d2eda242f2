//! WebAssembly module for the Meal Program Cost Engine
//!
//! Provides client-side previews for:
//! - Cost per meal and distribution costs
//! - Budget utilization and category variance
//! - Category bucketing of catalog codes
//! - Delivery timeliness and offline data validation

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

use shared::budget::BudgetPosition;
use shared::costing::{cost_per_meal, DistributionCost};
use shared::efficiency::{classify_delivery, DeliveryTimeliness};
use shared::variance::category_variance;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

fn to_f64(value: Decimal) -> f64 {
    value.to_string().parse().unwrap_or(0.0)
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Cost per delivered meal; zero meals yields 0
#[wasm_bindgen]
pub fn calculate_cost_per_meal(total_cost: f64, meals_delivered: i32) -> Result<f64, JsValue> {
    let per_meal = cost_per_meal(to_decimal(total_cost), meals_delivered).map_err(to_js_error)?;
    Ok(to_f64(per_meal))
}

/// Share of the allocated budget already spent, as a percentage
#[wasm_bindgen]
pub fn calculate_utilization_rate(allocated: f64, spent: f64) -> Result<f64, JsValue> {
    let position =
        BudgetPosition::evaluate(to_decimal(allocated), to_decimal(spent)).map_err(to_js_error)?;
    Ok(to_f64(position.utilization_rate))
}

/// Signed variance of actual against planned, as a percentage
#[wasm_bindgen]
pub fn calculate_variance_percentage(planned: f64, actual: f64) -> Result<f64, JsValue> {
    let variance = category_variance(
        CategoryBucket::Other,
        to_decimal(planned),
        to_decimal(actual),
        shared::variance::DEFAULT_SIGNIFICANT_VARIANCE_PERCENT,
    )
    .map_err(to_js_error)?;
    Ok(to_f64(variance.variance_percentage))
}

/// Budget bucket a catalog category code is charged against
#[wasm_bindgen]
pub fn category_bucket_for_code(code: &str) -> String {
    ItemCategory::from_code(code).bucket().as_str().to_string()
}

/// Whether a distribution happened within the on-time window.
/// Timestamps are RFC 3339; an empty distribution date counts as late.
#[wasm_bindgen]
pub fn is_delivery_on_time(
    created_at: &str,
    distribution_date: &str,
    threshold_hours: i64,
) -> Result<bool, JsValue> {
    let created: DateTime<Utc> = created_at
        .parse()
        .map_err(|e| JsValue::from_str(&format!("Invalid created_at: {}", e)))?;
    let distributed = match distribution_date.trim() {
        "" => None,
        raw => Some(
            raw.parse::<DateTime<Utc>>()
                .map_err(|e| JsValue::from_str(&format!("Invalid distribution_date: {}", e)))?,
        ),
    };

    let timeliness = classify_delivery(created, distributed, Duration::hours(threshold_hours));
    Ok(timeliness == DeliveryTimeliness::OnTime)
}

/// Preview the distribution cost of an event before it is saved
#[wasm_bindgen]
pub fn preview_distribution_cost(event_json: &str) -> Result<String, JsValue> {
    let event: DistributionEvent = serde_json::from_str(event_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid distribution JSON: {}", e)))?;
    validate_distribution(&event).map_err(JsValue::from_str)?;

    let cost = DistributionCost::aggregate(&event).map_err(to_js_error)?;
    serde_json::to_string(&cost).map_err(to_js_error)
}

/// Validate a production batch captured offline
#[wasm_bindgen]
pub fn validate_batch(batch_json: &str) -> Result<(), JsValue> {
    let batch: ProductionBatch = serde_json::from_str(batch_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid batch JSON: {}", e)))?;
    validate_batch_costs(&batch).map_err(JsValue::from_str)
}
