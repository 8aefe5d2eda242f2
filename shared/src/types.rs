//! Common types used across the platform

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CostError, CostResult};

/// Default reporting currency (Indonesian Rupiah)
pub const DEFAULT_CURRENCY: &str = "IDR";

/// Date range for queries, inclusive on both ends
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Month/year key used for budget rollups
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BudgetPeriod {
    pub month: u32,
    pub year: i32,
}

impl BudgetPeriod {
    pub fn new(month: u32, year: i32) -> Self {
        Self { month, year }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }
}

impl std::fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Sum money amounts, failing instead of panicking on overflow
pub fn checked_sum<I>(what: &str, amounts: I) -> CostResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .ok_or_else(|| CostError::overflow(what))
}

/// `numerator / denominator`, or zero when the denominator is zero
pub fn safe_div(what: &str, numerator: Decimal, denominator: Decimal) -> CostResult<Decimal> {
    if denominator.is_zero() {
        return Ok(Decimal::ZERO);
    }
    numerator
        .checked_div(denominator)
        .ok_or_else(|| CostError::overflow(what))
}

/// `numerator / denominator * 100`, or zero when the denominator is zero
pub fn percent_of(what: &str, numerator: Decimal, denominator: Decimal) -> CostResult<Decimal> {
    safe_div(what, numerator, denominator)?
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| CostError::overflow(what))
}
