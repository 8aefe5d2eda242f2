//! Fixtures shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use meal_program_backend::store::InMemoryCostStore;
use rust_decimal::Decimal;
use shared::{
    BudgetPeriod, CategoryAmounts, CurrentItemView, CurrentSupplierView, DistributionEvent,
    ItemCategory, ItemSnapshot, LineItemPriceRef, ProcurementLineItem, ProcurementOrder,
    ProcurementPlan, ProductionBatch, SupplierSnapshot, UsageRecord,
};
use uuid::Uuid;

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn march() -> BudgetPeriod {
    BudgetPeriod::new(3, 2025)
}

pub fn allocation(protein: &str, carbohydrate: &str, vegetable: &str, fruit: &str, other: &str) -> CategoryAmounts {
    CategoryAmounts {
        protein: dec(protein),
        carbohydrate: dec(carbohydrate),
        vegetable: dec(vegetable),
        fruit: dec(fruit),
        other: dec(other),
    }
}

pub fn plan(tenant_id: Uuid, total_budget: &str, allocation: CategoryAmounts) -> ProcurementPlan {
    ProcurementPlan {
        id: Uuid::new_v4(),
        tenant_id,
        plan_name: "Rencana Maret".to_string(),
        period: march(),
        total_budget: dec(total_budget),
        allocation,
        used_budget: None,
        remaining_budget: None,
        category_spent: None,
        created_at: at(2025, 2, 25, 8),
    }
}

pub fn line(item_id: Option<Uuid>, name: &str, category: &str, price: &str, quantity: &str) -> ProcurementLineItem {
    ProcurementLineItem {
        id: Uuid::new_v4(),
        order_id: Uuid::nil(),
        inventory_item_id: item_id,
        snapshot: ItemSnapshot {
            name: name.to_string(),
            category: ItemCategory::from_code(category),
            price_per_unit: dec(price),
            unit: "kg".to_string(),
        },
        ordered_quantity: dec(quantity),
        received_quantity: None,
        is_accepted: true,
    }
}

pub fn order(
    tenant_id: Uuid,
    plan_id: Option<Uuid>,
    supplier_id: Uuid,
    supplier_name: &str,
    order_date: NaiveDate,
    shipping: &str,
    transport: &str,
    lines: Vec<ProcurementLineItem>,
) -> ProcurementOrder {
    let id = Uuid::new_v4();
    ProcurementOrder {
        id,
        tenant_id,
        plan_id,
        order_number: format!("PO-{}", &id.simple().to_string()[..8]),
        order_date,
        supplier_id,
        supplier: SupplierSnapshot {
            name: supplier_name.to_string(),
            contact: Some("0812-1111-2222".to_string()),
        },
        shipping_cost: dec(shipping),
        other_transport_cost: dec(transport),
        items: lines
            .into_iter()
            .map(|mut l| {
                l.order_id = id;
                l
            })
            .collect(),
        created_at: at(2025, 3, 1, 7),
    }
}

pub fn usage(item_id: Uuid, quantity: &str, unit_cost: &str, linked: Option<&ProcurementLineItem>) -> UsageRecord {
    UsageRecord {
        id: Uuid::new_v4(),
        batch_id: Uuid::nil(),
        inventory_item_id: item_id,
        quantity_used: dec(quantity),
        unit_cost: dec(unit_cost),
        source_line_item: linked.map(|l| LineItemPriceRef {
            line_item_id: l.id,
            price_per_unit: l.snapshot.price_per_unit,
        }),
    }
}

pub fn batch(
    tenant_id: Uuid,
    plan_id: Option<Uuid>,
    usage_records: Vec<UsageRecord>,
    labor: &str,
    utility: &str,
    other: &str,
) -> ProductionBatch {
    let id = Uuid::new_v4();
    ProductionBatch {
        id,
        tenant_id,
        plan_id,
        batch_number: format!("PB-{}", &id.simple().to_string()[..8]),
        production_date: date(2025, 3, 3),
        usage_records: usage_records
            .into_iter()
            .map(|mut u| {
                u.batch_id = id;
                u
            })
            .collect(),
        labor_cost: dec(labor),
        utility_cost: dec(utility),
        other_costs: dec(other),
        ingredient_cost: None,
        total_cost: None,
        created_at: at(2025, 3, 3, 5),
    }
}

pub fn event(
    tenant_id: Uuid,
    plan_id: Option<Uuid>,
    batch_id: Option<Uuid>,
    transport: &str,
    packaging: &str,
    planned: i32,
    actual: Option<i32>,
) -> DistributionEvent {
    let created_at = at(2025, 3, 3, 6);
    DistributionEvent {
        id: Uuid::new_v4(),
        tenant_id,
        plan_id,
        production_batch_id: batch_id,
        distribution_code: "DIST-001".to_string(),
        distribution_date: Some(created_at + Duration::hours(4)),
        transport_cost: dec(transport),
        packaging_cost: dec(packaging),
        labor_cost: Decimal::ZERO,
        other_costs: Decimal::ZERO,
        planned_recipients: planned,
        actual_recipients: actual,
        computed: None,
        created_at,
    }
}

/// A plan with one order, one batch and one distribution, matching the
/// school kitchen example: 100 kg of chicken at 20,000 with 300,000 labor
/// and 100,000 utilities, delivered to 480 of 500 planned recipients.
pub struct KitchenFixture {
    pub store: Arc<InMemoryCostStore>,
    pub tenant_id: Uuid,
    pub plan: ProcurementPlan,
    pub order: ProcurementOrder,
    pub batch: ProductionBatch,
    pub event: DistributionEvent,
    pub supplier_id: Uuid,
    pub chicken_id: Uuid,
}

pub async fn kitchen(shipping: &str) -> KitchenFixture {
    let store = Arc::new(InMemoryCostStore::new());
    let tenant_id = Uuid::new_v4();
    let supplier_id = Uuid::new_v4();
    let chicken_id = Uuid::new_v4();

    let plan = plan(
        tenant_id,
        "10000000",
        allocation("4000000", "3000000", "1500000", "1000000", "500000"),
    );
    let chicken = line(Some(chicken_id), "Ayam Potong", "PROTEIN_HEWANI", "20000", "100");
    let order = order(
        tenant_id,
        Some(plan.id),
        supplier_id,
        "CV Sumber Pangan",
        date(2025, 3, 1),
        shipping,
        "0",
        vec![chicken],
    );
    let batch = batch(
        tenant_id,
        Some(plan.id),
        vec![usage(chicken_id, "100", "22000", Some(&order.items[0]))],
        "300000",
        "100000",
        "0",
    );
    let event = event(tenant_id, Some(plan.id), Some(batch.id), "150000", "50000", 500, Some(480));

    store.insert_plan(plan.clone()).await;
    store.insert_order(order.clone()).await;
    store.insert_batch(batch.clone()).await;
    store.insert_event(event.clone()).await;
    store
        .put_supplier(
            tenant_id,
            CurrentSupplierView {
                supplier_id,
                name: "CV Sumber Pangan".to_string(),
                contact: Some("0812-1111-2222".to_string()),
            },
        )
        .await;
    store
        .put_item(
            tenant_id,
            CurrentItemView {
                item_id: chicken_id,
                name: "Ayam Potong".to_string(),
                category: ItemCategory::Protein,
                cost_per_unit: dec("20000"),
            },
        )
        .await;

    KitchenFixture {
        store,
        tenant_id,
        plan,
        order,
        batch,
        event,
        supplier_id,
        chicken_id,
    }
}
