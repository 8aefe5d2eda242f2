//! Snapshot vs. current master-data reconciliation
//!
//! Drift is grouped by the stable supplier/item id. A supplier renamed twice
//! yields one group holding two rows, never two groups.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CostResult;
use crate::models::{CurrentItemView, CurrentSupplierView, OrderWithCurrent};
use crate::types::{percent_of, DateRange};

/// Where a historical difference was observed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderRef {
    pub order_id: Uuid,
    pub order_number: String,
    pub order_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameChange {
    pub order: OrderRef,
    pub snapshot_name: String,
    pub current_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactChange {
    pub order: OrderRef,
    pub snapshot_contact: Option<String>,
    pub current_contact: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceChange {
    pub order: OrderRef,
    pub line_item_id: Uuid,
    pub snapshot_price: Decimal,
    pub current_price: Decimal,
    pub difference: Decimal,
    pub difference_percentage: Decimal,
}

/// All drift observed for one supplier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierChangeGroup {
    pub supplier_id: Uuid,
    pub current_name: String,
    pub name_changes: Vec<NameChange>,
    pub contact_changes: Vec<ContactChange>,
}

/// All drift observed for one inventory item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemChangeGroup {
    pub item_id: Uuid,
    pub current_name: String,
    pub current_price: Decimal,
    pub name_changes: Vec<NameChange>,
    pub price_changes: Vec<PriceChange>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconciliationSummary {
    pub orders_examined: usize,
    pub line_items_examined: usize,
    pub supplier_name_changes: usize,
    pub supplier_contact_changes: usize,
    pub item_name_changes: usize,
    pub item_price_changes: usize,
    pub total_name_changes: usize,
    pub total_price_changes: usize,
    pub suppliers_with_drift: usize,
    pub items_with_drift: usize,
    /// Snapshots whose master record no longer exists
    pub missing_master_records: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub tenant_id: Uuid,
    pub date_range: Option<DateRange>,
    pub suppliers: Vec<SupplierChangeGroup>,
    pub items: Vec<ItemChangeGroup>,
    pub summary: ReconciliationSummary,
}

/// Flat export row, one per historical difference
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReconciliationRow {
    pub entity_type: &'static str,
    pub entity_id: Uuid,
    pub field: &'static str,
    pub order_number: String,
    pub order_date: NaiveDate,
    pub snapshot_value: String,
    pub current_value: String,
}

impl ReconciliationReport {
    pub fn has_drift(&self) -> bool {
        !self.suppliers.is_empty() || !self.items.is_empty()
    }

    /// Flatten the grouped report for CSV export
    pub fn rows(&self) -> Vec<ReconciliationRow> {
        let mut rows = Vec::new();
        for group in &self.suppliers {
            for change in &group.name_changes {
                rows.push(ReconciliationRow {
                    entity_type: "supplier",
                    entity_id: group.supplier_id,
                    field: "name",
                    order_number: change.order.order_number.clone(),
                    order_date: change.order.order_date,
                    snapshot_value: change.snapshot_name.clone(),
                    current_value: change.current_name.clone(),
                });
            }
            for change in &group.contact_changes {
                rows.push(ReconciliationRow {
                    entity_type: "supplier",
                    entity_id: group.supplier_id,
                    field: "contact",
                    order_number: change.order.order_number.clone(),
                    order_date: change.order.order_date,
                    snapshot_value: change.snapshot_contact.clone().unwrap_or_default(),
                    current_value: change.current_contact.clone().unwrap_or_default(),
                });
            }
        }
        for group in &self.items {
            for change in &group.name_changes {
                rows.push(ReconciliationRow {
                    entity_type: "item",
                    entity_id: group.item_id,
                    field: "name",
                    order_number: change.order.order_number.clone(),
                    order_date: change.order.order_date,
                    snapshot_value: change.snapshot_name.clone(),
                    current_value: change.current_name.clone(),
                });
            }
            for change in &group.price_changes {
                rows.push(ReconciliationRow {
                    entity_type: "item",
                    entity_id: group.item_id,
                    field: "price",
                    order_number: change.order.order_number.clone(),
                    order_date: change.order.order_date,
                    snapshot_value: change.snapshot_price.to_string(),
                    current_value: change.current_price.to_string(),
                });
            }
        }
        rows
    }
}

fn supplier_group<'a>(
    groups: &'a mut BTreeMap<Uuid, SupplierChangeGroup>,
    current: &CurrentSupplierView,
) -> &'a mut SupplierChangeGroup {
    groups
        .entry(current.supplier_id)
        .or_insert_with(|| SupplierChangeGroup {
            supplier_id: current.supplier_id,
            current_name: current.name.clone(),
            name_changes: Vec::new(),
            contact_changes: Vec::new(),
        })
}

fn item_group<'a>(
    groups: &'a mut BTreeMap<Uuid, ItemChangeGroup>,
    current: &CurrentItemView,
) -> &'a mut ItemChangeGroup {
    groups.entry(current.item_id).or_insert_with(|| ItemChangeGroup {
        item_id: current.item_id,
        current_name: current.name.clone(),
        current_price: current.cost_per_unit,
        name_changes: Vec::new(),
        price_changes: Vec::new(),
    })
}

/// Compare every order snapshot in range against current master data
pub fn reconcile(
    tenant_id: Uuid,
    date_range: Option<DateRange>,
    orders: &[OrderWithCurrent],
) -> CostResult<ReconciliationReport> {
    let mut in_range: Vec<&OrderWithCurrent> = orders
        .iter()
        .filter(|o| o.order.tenant_id == tenant_id)
        .filter(|o| date_range.map_or(true, |r| r.contains(o.order.order_date)))
        .collect();
    in_range.sort_by(|a, b| {
        (a.order.order_date, a.order.id).cmp(&(b.order.order_date, b.order.id))
    });

    let mut suppliers: BTreeMap<Uuid, SupplierChangeGroup> = BTreeMap::new();
    let mut items: BTreeMap<Uuid, ItemChangeGroup> = BTreeMap::new();
    let mut summary = ReconciliationSummary::default();

    for entry in in_range {
        let order = &entry.order;
        summary.orders_examined += 1;
        let order_ref = OrderRef {
            order_id: order.id,
            order_number: order.order_number.clone(),
            order_date: order.order_date,
        };

        match &entry.current_supplier {
            Some(current) => {
                if order.supplier.name != current.name {
                    supplier_group(&mut suppliers, current).name_changes.push(NameChange {
                        order: order_ref.clone(),
                        snapshot_name: order.supplier.name.clone(),
                        current_name: current.name.clone(),
                    });
                    summary.supplier_name_changes += 1;
                }
                if order.supplier.contact != current.contact {
                    supplier_group(&mut suppliers, current)
                        .contact_changes
                        .push(ContactChange {
                            order: order_ref.clone(),
                            snapshot_contact: order.supplier.contact.clone(),
                            current_contact: current.contact.clone(),
                        });
                    summary.supplier_contact_changes += 1;
                }
            }
            None => summary.missing_master_records += 1,
        }

        for line in &order.items {
            summary.line_items_examined += 1;
            let Some(item_id) = line.inventory_item_id else {
                continue;
            };
            let Some(current) = entry.current_item(item_id) else {
                summary.missing_master_records += 1;
                continue;
            };

            if line.snapshot.name != current.name {
                item_group(&mut items, current).name_changes.push(NameChange {
                    order: order_ref.clone(),
                    snapshot_name: line.snapshot.name.clone(),
                    current_name: current.name.clone(),
                });
                summary.item_name_changes += 1;
            }
            if line.snapshot.price_per_unit != current.cost_per_unit {
                let difference = current.cost_per_unit - line.snapshot.price_per_unit;
                item_group(&mut items, current).price_changes.push(PriceChange {
                    order: order_ref.clone(),
                    line_item_id: line.id,
                    snapshot_price: line.snapshot.price_per_unit,
                    current_price: current.cost_per_unit,
                    difference,
                    difference_percentage: percent_of(
                        "price drift",
                        difference,
                        line.snapshot.price_per_unit,
                    )?,
                });
                summary.item_price_changes += 1;
            }
        }
    }

    summary.total_name_changes = summary.supplier_name_changes + summary.item_name_changes;
    summary.total_price_changes = summary.item_price_changes;
    summary.suppliers_with_drift = suppliers.len();
    summary.items_with_drift = items.len();

    Ok(ReconciliationReport {
        tenant_id,
        date_range,
        suppliers: suppliers.into_values().collect(),
        items: items.into_values().collect(),
        summary,
    })
}
