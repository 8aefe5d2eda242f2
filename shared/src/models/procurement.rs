//! Procurement order models
//!
//! Supplier and item details are frozen into snapshot values when an order is
//! written. The stable ids next to them point at the current master records.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ItemCategory;
use crate::error::{CostError, CostResult};
use crate::types::checked_sum;

/// Supplier details as they were when the order was placed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierSnapshot {
    pub name: String,
    pub contact: Option<String>,
}

/// Item details as they were when the order was placed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemSnapshot {
    pub name: String,
    pub category: ItemCategory,
    pub price_per_unit: Decimal,
    pub unit: String,
}

/// A purchase order placed against a supplier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcurementOrder {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub order_number: String,
    pub order_date: NaiveDate,
    pub supplier_id: Uuid,
    pub supplier: SupplierSnapshot,
    pub shipping_cost: Decimal,
    pub other_transport_cost: Decimal,
    pub items: Vec<ProcurementLineItem>,
    pub created_at: DateTime<Utc>,
}

impl ProcurementOrder {
    /// Shipping plus other transport charges for this order
    pub fn logistics_cost(&self) -> CostResult<Decimal> {
        self.shipping_cost
            .checked_add(self.other_transport_cost)
            .ok_or_else(|| CostError::overflow("order logistics cost"))
    }

    /// Sum of line-item spend on this order
    pub fn items_cost(&self) -> CostResult<Decimal> {
        let costs = self
            .items
            .iter()
            .map(ProcurementLineItem::spend)
            .collect::<CostResult<Vec<_>>>()?;
        checked_sum("order item cost", costs)
    }
}

/// A single item line on a procurement order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcurementLineItem {
    pub id: Uuid,
    pub order_id: Uuid,
    /// Stable catalog reference; absent for ad hoc purchases
    pub inventory_item_id: Option<Uuid>,
    pub snapshot: ItemSnapshot,
    pub ordered_quantity: Decimal,
    pub received_quantity: Option<Decimal>,
    pub is_accepted: bool,
}

impl ProcurementLineItem {
    /// Quantity that is billed: the received quantity once goods arrive
    pub fn billable_quantity(&self) -> Decimal {
        self.received_quantity.unwrap_or(self.ordered_quantity)
    }

    /// Spend for this line at the snapshot price. Rejected lines cost nothing.
    pub fn spend(&self) -> CostResult<Decimal> {
        if !self.is_accepted {
            return Ok(Decimal::ZERO);
        }
        self.snapshot
            .price_per_unit
            .checked_mul(self.billable_quantity())
            .ok_or_else(|| CostError::overflow("line item spend"))
    }
}
