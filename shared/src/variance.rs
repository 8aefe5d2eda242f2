//! Planned vs. actual spend per category

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::budget::BudgetStatus;
use crate::error::CostResult;
use crate::models::{CategoryAmounts, CategoryBucket};
use crate::types::percent_of;

/// Default threshold above which a category variance is significant
pub const DEFAULT_SIGNIFICANT_VARIANCE_PERCENT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Direction of a category variance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceDirection {
    Over,
    Under,
    OnPlan,
}

/// Variance of one priced category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryVariance {
    pub bucket: CategoryBucket,
    pub planned: Decimal,
    pub actual: Decimal,
    pub variance: Decimal,
    pub variance_percentage: Decimal,
    pub direction: VarianceDirection,
    pub is_significant: bool,
}

/// Variance report for a plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VarianceReport {
    pub plan_id: Uuid,
    pub total_planned: Decimal,
    pub total_actual: Decimal,
    pub total_variance: Decimal,
    pub threshold_percent: Decimal,
    pub categories: Vec<CategoryVariance>,
    pub significant_categories: Vec<CategoryBucket>,
    pub insights: Vec<String>,
}

pub fn category_variance(
    bucket: CategoryBucket,
    planned: Decimal,
    actual: Decimal,
    threshold_percent: Decimal,
) -> CostResult<CategoryVariance> {
    let variance = actual - planned;
    let variance_percentage = percent_of(bucket.as_str(), variance, planned)?;
    let direction = match variance.cmp(&Decimal::ZERO) {
        std::cmp::Ordering::Greater => VarianceDirection::Over,
        std::cmp::Ordering::Less => VarianceDirection::Under,
        std::cmp::Ordering::Equal => VarianceDirection::OnPlan,
    };
    Ok(CategoryVariance {
        bucket,
        planned,
        actual,
        variance,
        variance_percentage,
        direction,
        is_significant: variance_percentage.abs() > threshold_percent,
    })
}

/// Compare the plan's allocation with the tracked spend.
///
/// Insight order is fixed: overrun, significant categories, savings.
pub fn analyze(
    allocation: &CategoryAmounts,
    status: &BudgetStatus,
    threshold_percent: Decimal,
) -> CostResult<VarianceReport> {
    let categories = CategoryBucket::PRICED
        .iter()
        .map(|&bucket| {
            category_variance(
                bucket,
                allocation.get(bucket),
                status.spend.category_spent.get(bucket),
                threshold_percent,
            )
        })
        .collect::<CostResult<Vec<_>>>()?;

    let significant_categories: Vec<CategoryBucket> = categories
        .iter()
        .filter(|c| c.is_significant)
        .map(|c| c.bucket)
        .collect();

    let total_planned = status.allocated_budget;
    let total_actual = status.total_spent();
    let total_variance = total_actual - total_planned;

    let mut insights = Vec::new();
    if status.is_over_budget {
        insights.push(format!(
            "Budget exceeded by {} ({}% over allocation)",
            format_amount(status.projected_overrun),
            percent_of("overrun", status.projected_overrun, total_planned)?.round_dp(1)
        ));
    }
    if !significant_categories.is_empty() {
        let listed = categories
            .iter()
            .filter(|c| c.is_significant)
            .map(|c| format!("{} ({}%)", c.bucket, signed(c.variance_percentage.round_dp(1))))
            .collect::<Vec<_>>()
            .join(", ");
        insights.push(format!("Significant variance in: {}", listed));
    }
    if total_actual < total_planned {
        insights.push(format!(
            "Spending is {} under plan",
            format_amount(total_planned - total_actual)
        ));
    }

    Ok(VarianceReport {
        plan_id: status.plan_id,
        total_planned,
        total_actual,
        total_variance,
        threshold_percent,
        categories,
        significant_categories,
        insights,
    })
}

fn signed(value: Decimal) -> String {
    if value.is_sign_positive() && !value.is_zero() {
        format!("+{}", value)
    } else {
        value.to_string()
    }
}

/// Two-decimal rendering used in insight strings
fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}
