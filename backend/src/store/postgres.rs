//! PostgreSQL implementation of the cost store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{
    BudgetPeriod, BudgetTrackingAggregate, CategoryAmounts, ComputedCosts, CurrentItemView,
    CurrentSupplierView, DistributionEvent, ItemCategory, ItemSnapshot, LineItemPriceRef,
    OrderWithCurrent, PlanBudgetRollup, ProcurementLineItem, ProcurementOrder, ProcurementPlan,
    ProcurementPlanDetail, ProductionBatch, SupplierSnapshot, UsageRecord,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{
    CostStore, DistributionCostUpdate, MonthlyAggregateUpdate, OrderFilter, PlanBudgetUpdate,
    ProductionBatchDetail, ProductionCostUpdate,
};
use crate::error::{AppError, AppResult};

const ORDER_COLUMNS: &str = "id, tenant_id, plan_id, order_number, order_date, supplier_id, \
     supplier_name_snapshot, supplier_contact_snapshot, shipping_cost, other_transport_cost, created_at";

const BATCH_COLUMNS: &str = "id, tenant_id, plan_id, batch_number, production_date, labor_cost, \
     utility_cost, other_costs, ingredient_cost, total_cost, created_at";

const EVENT_COLUMNS: &str = "id, tenant_id, plan_id, production_batch_id, distribution_code, \
     distribution_date, transport_cost, packaging_cost, labor_cost, other_costs, planned_recipients, \
     actual_recipients, procurement_cost, production_cost, distribution_cost, total_cost, \
     cost_per_meal, created_at";

const AGGREGATE_COLUMNS: &str = "id, tenant_id, month, year, allocated, spent, protein_spent, \
     carbohydrate_spent, vegetable_spent, fruit_spent, other_spent, utilization_rate, plan_count, updated_at";

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    tenant_id: Uuid,
    plan_id: Option<Uuid>,
    order_number: String,
    order_date: NaiveDate,
    supplier_id: Uuid,
    supplier_name_snapshot: String,
    supplier_contact_snapshot: Option<String>,
    shipping_cost: Decimal,
    other_transport_cost: Decimal,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct LineItemRow {
    id: Uuid,
    order_id: Uuid,
    inventory_item_id: Option<Uuid>,
    item_name_snapshot: String,
    category_snapshot: String,
    price_per_unit: Decimal,
    unit: String,
    ordered_quantity: Decimal,
    received_quantity: Option<Decimal>,
    is_accepted: bool,
}

impl From<LineItemRow> for ProcurementLineItem {
    fn from(row: LineItemRow) -> Self {
        ProcurementLineItem {
            id: row.id,
            order_id: row.order_id,
            inventory_item_id: row.inventory_item_id,
            snapshot: ItemSnapshot {
                name: row.item_name_snapshot,
                category: ItemCategory::from_code(&row.category_snapshot),
                price_per_unit: row.price_per_unit,
                unit: row.unit,
            },
            ordered_quantity: row.ordered_quantity,
            received_quantity: row.received_quantity,
            is_accepted: row.is_accepted,
        }
    }
}

#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    tenant_id: Uuid,
    plan_id: Option<Uuid>,
    batch_number: String,
    production_date: NaiveDate,
    labor_cost: Decimal,
    utility_cost: Decimal,
    other_costs: Decimal,
    ingredient_cost: Option<Decimal>,
    total_cost: Option<Decimal>,
    created_at: DateTime<Utc>,
}

/// Usage record joined with the snapshot price of its linked line item
#[derive(Debug, FromRow)]
struct UsageRow {
    id: Uuid,
    batch_id: Uuid,
    inventory_item_id: Uuid,
    quantity_used: Decimal,
    unit_cost: Decimal,
    procurement_item_id: Option<Uuid>,
    line_price: Option<Decimal>,
}

impl From<UsageRow> for UsageRecord {
    fn from(row: UsageRow) -> Self {
        let source_line_item = match (row.procurement_item_id, row.line_price) {
            (Some(line_item_id), Some(price_per_unit)) => Some(LineItemPriceRef {
                line_item_id,
                price_per_unit,
            }),
            _ => None,
        };
        UsageRecord {
            id: row.id,
            batch_id: row.batch_id,
            inventory_item_id: row.inventory_item_id,
            quantity_used: row.quantity_used,
            unit_cost: row.unit_cost,
            source_line_item,
        }
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    tenant_id: Uuid,
    plan_id: Option<Uuid>,
    production_batch_id: Option<Uuid>,
    distribution_code: String,
    distribution_date: Option<DateTime<Utc>>,
    transport_cost: Decimal,
    packaging_cost: Decimal,
    labor_cost: Decimal,
    other_costs: Decimal,
    planned_recipients: i32,
    actual_recipients: Option<i32>,
    procurement_cost: Option<Decimal>,
    production_cost: Option<Decimal>,
    distribution_cost: Option<Decimal>,
    total_cost: Option<Decimal>,
    cost_per_meal: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for DistributionEvent {
    fn from(row: EventRow) -> Self {
        let computed = match (
            row.procurement_cost,
            row.production_cost,
            row.distribution_cost,
            row.total_cost,
            row.cost_per_meal,
        ) {
            (Some(procurement_cost), Some(production_cost), Some(distribution_cost), Some(total_cost), Some(cost_per_meal)) => {
                Some(ComputedCosts {
                    procurement_cost,
                    production_cost,
                    distribution_cost,
                    total_cost,
                    cost_per_meal,
                })
            }
            _ => None,
        };
        DistributionEvent {
            id: row.id,
            tenant_id: row.tenant_id,
            plan_id: row.plan_id,
            production_batch_id: row.production_batch_id,
            distribution_code: row.distribution_code,
            distribution_date: row.distribution_date,
            transport_cost: row.transport_cost,
            packaging_cost: row.packaging_cost,
            labor_cost: row.labor_cost,
            other_costs: row.other_costs,
            planned_recipients: row.planned_recipients,
            actual_recipients: row.actual_recipients,
            computed,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PlanRow {
    id: Uuid,
    tenant_id: Uuid,
    plan_name: String,
    month: i32,
    year: i32,
    total_budget: Decimal,
    protein_budget: Decimal,
    carbohydrate_budget: Decimal,
    vegetable_budget: Decimal,
    fruit_budget: Decimal,
    other_budget: Decimal,
    used_budget: Option<Decimal>,
    remaining_budget: Option<Decimal>,
    protein_spent: Option<Decimal>,
    carbohydrate_spent: Option<Decimal>,
    vegetable_spent: Option<Decimal>,
    fruit_spent: Option<Decimal>,
    other_spent: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl PlanRow {
    fn category_spent(&self) -> Option<CategoryAmounts> {
        self.used_budget?;
        Some(CategoryAmounts {
            protein: self.protein_spent.unwrap_or_default(),
            carbohydrate: self.carbohydrate_spent.unwrap_or_default(),
            vegetable: self.vegetable_spent.unwrap_or_default(),
            fruit: self.fruit_spent.unwrap_or_default(),
            other: self.other_spent.unwrap_or_default(),
        })
    }
}

impl From<PlanRow> for ProcurementPlan {
    fn from(row: PlanRow) -> Self {
        let category_spent = row.category_spent();
        ProcurementPlan {
            id: row.id,
            tenant_id: row.tenant_id,
            plan_name: row.plan_name,
            period: BudgetPeriod::new(row.month as u32, row.year),
            total_budget: row.total_budget,
            allocation: CategoryAmounts {
                protein: row.protein_budget,
                carbohydrate: row.carbohydrate_budget,
                vegetable: row.vegetable_budget,
                fruit: row.fruit_budget,
                other: row.other_budget,
            },
            used_budget: row.used_budget,
            remaining_budget: row.remaining_budget,
            category_spent,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct AggregateRow {
    id: Uuid,
    tenant_id: Uuid,
    month: i32,
    year: i32,
    allocated: Decimal,
    spent: Decimal,
    protein_spent: Decimal,
    carbohydrate_spent: Decimal,
    vegetable_spent: Decimal,
    fruit_spent: Decimal,
    other_spent: Decimal,
    utilization_rate: Decimal,
    plan_count: i32,
    updated_at: DateTime<Utc>,
}

impl From<AggregateRow> for BudgetTrackingAggregate {
    fn from(row: AggregateRow) -> Self {
        BudgetTrackingAggregate {
            id: row.id,
            tenant_id: row.tenant_id,
            period: BudgetPeriod::new(row.month as u32, row.year),
            allocated: row.allocated,
            spent: row.spent,
            category_spent: CategoryAmounts {
                protein: row.protein_spent,
                carbohydrate: row.carbohydrate_spent,
                vegetable: row.vegetable_spent,
                fruit: row.fruit_spent,
                other: row.other_spent,
            },
            utilization_rate: row.utilization_rate,
            plan_count: row.plan_count,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SupplierRow {
    id: Uuid,
    name: String,
    contact: Option<String>,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    name: String,
    category: String,
    cost_per_unit: Decimal,
}

/// Cost store over the shared Postgres pool
#[derive(Clone)]
pub struct PgCostStore {
    db: PgPool,
}

impl PgCostStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Attach line items to order rows, preserving row order
    async fn hydrate_orders(&self, rows: Vec<OrderRow>) -> AppResult<Vec<ProcurementOrder>> {
        let order_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let line_rows = sqlx::query_as::<_, LineItemRow>(
            r#"
            SELECT id, order_id, inventory_item_id, item_name_snapshot, category_snapshot,
                   price_per_unit, unit, ordered_quantity, received_quantity, is_accepted
            FROM procurement_order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, id
            "#,
        )
        .bind(&order_ids)
        .fetch_all(&self.db)
        .await?;

        let mut lines: HashMap<Uuid, Vec<ProcurementLineItem>> = HashMap::new();
        for row in line_rows {
            lines.entry(row.order_id).or_default().push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| ProcurementOrder {
                items: lines.remove(&row.id).unwrap_or_default(),
                id: row.id,
                tenant_id: row.tenant_id,
                plan_id: row.plan_id,
                order_number: row.order_number,
                order_date: row.order_date,
                supplier_id: row.supplier_id,
                supplier: SupplierSnapshot {
                    name: row.supplier_name_snapshot,
                    contact: row.supplier_contact_snapshot,
                },
                shipping_cost: row.shipping_cost,
                other_transport_cost: row.other_transport_cost,
                created_at: row.created_at,
            })
            .collect())
    }

    /// Attach usage records to batch rows, preserving row order
    async fn hydrate_batches(&self, rows: Vec<BatchRow>) -> AppResult<Vec<ProductionBatch>> {
        let batch_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let usage_rows = sqlx::query_as::<_, UsageRow>(
            r#"
            SELECT u.id, u.batch_id, u.inventory_item_id, u.quantity_used, u.unit_cost,
                   u.procurement_item_id, poi.price_per_unit AS line_price
            FROM usage_records u
            LEFT JOIN procurement_order_items poi ON poi.id = u.procurement_item_id
            WHERE u.batch_id = ANY($1)
            ORDER BY u.batch_id, u.created_at, u.id
            "#,
        )
        .bind(&batch_ids)
        .fetch_all(&self.db)
        .await?;

        let mut usage: HashMap<Uuid, Vec<UsageRecord>> = HashMap::new();
        for row in usage_rows {
            usage.entry(row.batch_id).or_default().push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| ProductionBatch {
                usage_records: usage.remove(&row.id).unwrap_or_default(),
                id: row.id,
                tenant_id: row.tenant_id,
                plan_id: row.plan_id,
                batch_number: row.batch_number,
                production_date: row.production_date,
                labor_cost: row.labor_cost,
                utility_cost: row.utility_cost,
                other_costs: row.other_costs,
                ingredient_cost: row.ingredient_cost,
                total_cost: row.total_cost,
                created_at: row.created_at,
            })
            .collect())
    }

    async fn plan_orders(&self, tenant_id: Uuid, plan_id: Uuid) -> AppResult<Vec<ProcurementOrder>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM procurement_orders \
             WHERE tenant_id = $1 AND plan_id = $2 ORDER BY order_date, id"
        ))
        .bind(tenant_id)
        .bind(plan_id)
        .fetch_all(&self.db)
        .await?;
        self.hydrate_orders(rows).await
    }
}

#[async_trait]
impl CostStore for PgCostStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn get_production_batch(
        &self,
        tenant_id: Uuid,
        batch_id: Uuid,
    ) -> AppResult<Option<ProductionBatchDetail>> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {BATCH_COLUMNS} FROM production_batches WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(batch_id)
        .bind(tenant_id)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let plan_id = row.plan_id;
        let Some(batch) = self.hydrate_batches(vec![row]).await?.pop() else {
            return Ok(None);
        };
        let plan_orders = match plan_id {
            Some(plan_id) => self.plan_orders(tenant_id, plan_id).await?,
            None => Vec::new(),
        };

        Ok(Some(ProductionBatchDetail { batch, plan_orders }))
    }

    async fn get_distribution_event(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
    ) -> AppResult<Option<DistributionEvent>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM distribution_events WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(event_id)
        .bind(tenant_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_procurement_plan(
        &self,
        tenant_id: Uuid,
        plan_id: Uuid,
    ) -> AppResult<Option<ProcurementPlanDetail>> {
        let plan = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, tenant_id, plan_name, month, year, total_budget,
                   protein_budget, carbohydrate_budget, vegetable_budget, fruit_budget, other_budget,
                   used_budget, remaining_budget,
                   protein_spent, carbohydrate_spent, vegetable_spent, fruit_spent, other_spent,
                   created_at
            FROM procurement_plans
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(plan_id)
        .bind(tenant_id)
        .fetch_optional(&self.db)
        .await?;

        let Some(plan) = plan else {
            return Ok(None);
        };

        let orders = self.plan_orders(tenant_id, plan_id).await?;

        let batch_rows = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {BATCH_COLUMNS} FROM production_batches \
             WHERE tenant_id = $1 AND plan_id = $2 ORDER BY production_date, id"
        ))
        .bind(tenant_id)
        .bind(plan_id)
        .fetch_all(&self.db)
        .await?;
        let batches = self.hydrate_batches(batch_rows).await?;

        let distributions = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM distribution_events \
             WHERE tenant_id = $1 AND plan_id = $2 ORDER BY created_at, id"
        ))
        .bind(tenant_id)
        .bind(plan_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

        Ok(Some(ProcurementPlanDetail {
            plan: plan.into(),
            orders,
            batches,
            distributions,
        }))
    }

    async fn list_procurement_orders(
        &self,
        tenant_id: Uuid,
        filter: &OrderFilter,
    ) -> AppResult<Vec<OrderWithCurrent>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM procurement_orders \
             WHERE tenant_id = $1 \
               AND ($2::date IS NULL OR order_date >= $2) \
               AND ($3::date IS NULL OR order_date <= $3) \
               AND ($4::uuid IS NULL OR supplier_id = $4) \
               AND ($5::uuid IS NULL OR plan_id = $5) \
             ORDER BY order_date, id"
        ))
        .bind(tenant_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.supplier_id)
        .bind(filter.plan_id)
        .fetch_all(&self.db)
        .await?;

        let orders = self.hydrate_orders(rows).await?;

        let supplier_ids: Vec<Uuid> = orders.iter().map(|o| o.supplier_id).collect();
        let item_ids: Vec<Uuid> = orders
            .iter()
            .flat_map(|o| o.items.iter().filter_map(|l| l.inventory_item_id))
            .collect();

        let suppliers: HashMap<Uuid, CurrentSupplierView> = sqlx::query_as::<_, SupplierRow>(
            "SELECT id, name, contact FROM suppliers WHERE tenant_id = $1 AND id = ANY($2)",
        )
        .bind(tenant_id)
        .bind(&supplier_ids)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|s| {
            (
                s.id,
                CurrentSupplierView {
                    supplier_id: s.id,
                    name: s.name,
                    contact: s.contact,
                },
            )
        })
        .collect();

        let items: HashMap<Uuid, CurrentItemView> = sqlx::query_as::<_, ItemRow>(
            "SELECT id, name, category, cost_per_unit FROM inventory_items \
             WHERE tenant_id = $1 AND id = ANY($2)",
        )
        .bind(tenant_id)
        .bind(&item_ids)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|i| {
            (
                i.id,
                CurrentItemView {
                    item_id: i.id,
                    name: i.name,
                    category: ItemCategory::from_code(&i.category),
                    cost_per_unit: i.cost_per_unit,
                },
            )
        })
        .collect();

        Ok(orders
            .into_iter()
            .map(|order| {
                let current_supplier = suppliers.get(&order.supplier_id).cloned();
                let current_items = order
                    .items
                    .iter()
                    .filter_map(|l| l.inventory_item_id)
                    .filter_map(|id| items.get(&id).cloned())
                    .collect();
                OrderWithCurrent {
                    order,
                    current_supplier,
                    current_items,
                }
            })
            .collect())
    }

    async fn list_plan_budgets(
        &self,
        tenant_id: Uuid,
        period: BudgetPeriod,
    ) -> AppResult<Vec<PlanBudgetRollup>> {
        let plans = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, tenant_id, plan_name, month, year, total_budget,
                   protein_budget, carbohydrate_budget, vegetable_budget, fruit_budget, other_budget,
                   used_budget, remaining_budget,
                   protein_spent, carbohydrate_spent, vegetable_spent, fruit_spent, other_spent,
                   created_at
            FROM procurement_plans
            WHERE tenant_id = $1 AND month = $2 AND year = $3
            ORDER BY id
            "#,
        )
        .bind(tenant_id)
        .bind(period.month as i32)
        .bind(period.year)
        .fetch_all(&self.db)
        .await?;

        Ok(plans
            .into_iter()
            .map(|p| PlanBudgetRollup {
                plan_id: p.id,
                total_budget: p.total_budget,
                used_budget: p.used_budget.unwrap_or_default(),
                category_spent: p.category_spent().unwrap_or_default(),
            })
            .collect())
    }

    async fn get_monthly_aggregate(
        &self,
        tenant_id: Uuid,
        period: BudgetPeriod,
    ) -> AppResult<Option<BudgetTrackingAggregate>> {
        let row = sqlx::query_as::<_, AggregateRow>(&format!(
            "SELECT {AGGREGATE_COLUMNS} FROM budget_tracking \
             WHERE tenant_id = $1 AND month = $2 AND year = $3"
        ))
        .bind(tenant_id)
        .bind(period.month as i32)
        .bind(period.year)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn update_distribution_costs(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
        update: DistributionCostUpdate,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE distribution_events
            SET procurement_cost = $3, production_cost = $4, distribution_cost = $5,
                total_cost = $6, cost_per_meal = $7, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(event_id)
        .bind(tenant_id)
        .bind(update.procurement_cost)
        .bind(update.production_cost)
        .bind(update.distribution_cost)
        .bind(update.total_cost)
        .bind(update.cost_per_meal)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Distribution event", event_id));
        }
        Ok(())
    }

    async fn update_production_costs(
        &self,
        tenant_id: Uuid,
        batch_id: Uuid,
        update: ProductionCostUpdate,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE production_batches
            SET ingredient_cost = $3, total_cost = $4, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(batch_id)
        .bind(tenant_id)
        .bind(update.ingredient_cost)
        .bind(update.total_cost)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Production batch", batch_id));
        }
        Ok(())
    }

    async fn update_procurement_plan_budget(
        &self,
        tenant_id: Uuid,
        plan_id: Uuid,
        update: PlanBudgetUpdate,
    ) -> AppResult<()> {
        let spent = update.category_spent;
        let result = sqlx::query(
            r#"
            UPDATE procurement_plans
            SET used_budget = $3, remaining_budget = $4,
                protein_spent = $5, carbohydrate_spent = $6, vegetable_spent = $7,
                fruit_spent = $8, other_spent = $9, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(plan_id)
        .bind(tenant_id)
        .bind(update.used_budget)
        .bind(update.remaining_budget)
        .bind(spent.protein)
        .bind(spent.carbohydrate)
        .bind(spent.vegetable)
        .bind(spent.fruit)
        .bind(spent.other)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Procurement plan", plan_id));
        }
        Ok(())
    }

    async fn upsert_monthly_budget_aggregate(
        &self,
        tenant_id: Uuid,
        period: BudgetPeriod,
        update: MonthlyAggregateUpdate,
    ) -> AppResult<BudgetTrackingAggregate> {
        let spent = update.category_spent;
        let row = sqlx::query_as::<_, AggregateRow>(&format!(
            r#"
            INSERT INTO budget_tracking (
                tenant_id, month, year, allocated, spent,
                protein_spent, carbohydrate_spent, vegetable_spent, fruit_spent, other_spent,
                utilization_rate, plan_count
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (tenant_id, month, year) DO UPDATE SET
                allocated = EXCLUDED.allocated,
                spent = EXCLUDED.spent,
                protein_spent = EXCLUDED.protein_spent,
                carbohydrate_spent = EXCLUDED.carbohydrate_spent,
                vegetable_spent = EXCLUDED.vegetable_spent,
                fruit_spent = EXCLUDED.fruit_spent,
                other_spent = EXCLUDED.other_spent,
                utilization_rate = EXCLUDED.utilization_rate,
                plan_count = EXCLUDED.plan_count,
                updated_at = NOW()
            RETURNING {AGGREGATE_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(period.month as i32)
        .bind(period.year)
        .bind(update.allocated)
        .bind(update.spent)
        .bind(spent.protein)
        .bind(spent.carbohydrate)
        .bind(spent.vegetable)
        .bind(spent.fruit)
        .bind(spent.other)
        .bind(update.utilization_rate)
        .bind(update.plan_count)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }
}
