//! Current master-data projections
//!
//! These are fetched fresh for every reconciliation run and compared against
//! the snapshots stored on procurement orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ItemCategory, ProcurementOrder};

/// Supplier record as it is today
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentSupplierView {
    pub supplier_id: Uuid,
    pub name: String,
    pub contact: Option<String>,
}

/// Inventory catalog item as it is today
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentItemView {
    pub item_id: Uuid,
    pub name: String,
    pub category: ItemCategory,
    pub cost_per_unit: Decimal,
}

/// An order paired with the current master records it references
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithCurrent {
    pub order: ProcurementOrder,
    /// Absent when the supplier record was deleted
    pub current_supplier: Option<CurrentSupplierView>,
    pub current_items: Vec<CurrentItemView>,
}

impl OrderWithCurrent {
    pub fn current_item(&self, item_id: Uuid) -> Option<&CurrentItemView> {
        self.current_items.iter().find(|item| item.item_id == item_id)
    }
}
