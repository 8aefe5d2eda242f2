//! Budget tracking and variance tests
//!
//! Tests for plan budget status, category bucketing, the monthly aggregate
//! and planned vs. actual variance.

mod common;

use std::sync::Arc;

use common::*;
use meal_program_backend::error::AppError;
use meal_program_backend::services::{BudgetLocks, BudgetService, VarianceService};
use meal_program_backend::store::{CostStore, InMemoryCostStore};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::budget::bucket_spend;
use shared::variance::DEFAULT_SIGNIFICANT_VARIANCE_PERCENT;
use shared::{CategoryBucket, ProcurementPlan};
use uuid::Uuid;

/// A plan with 7,000,000 of purchases against a 10,000,000 budget
async fn purchasing_plan(store: &InMemoryCostStore, tenant_id: Uuid) -> ProcurementPlan {
    let plan = plan(
        tenant_id,
        "10000000",
        allocation("2000000", "2500000", "1000000", "500000", "4000000"),
    );
    let purchases = order(
        tenant_id,
        Some(plan.id),
        Uuid::new_v4(),
        "UD Tani Makmur",
        date(2025, 3, 4),
        "0",
        "0",
        vec![
            line(Some(Uuid::new_v4()), "Daging Sapi", "PROTEIN", "20000", "150"),
            line(Some(Uuid::new_v4()), "Beras", "KARBOHIDRAT", "10000", "250"),
            line(Some(Uuid::new_v4()), "Bayam", "SAYURAN", "5000", "200"),
            line(Some(Uuid::new_v4()), "Pisang", "BUAH", "5000", "100"),
        ],
    );
    store.insert_plan(plan.clone()).await;
    store.insert_order(purchases).await;
    plan
}

fn budget_service(store: &Arc<InMemoryCostStore>) -> BudgetService {
    let store: Arc<dyn CostStore> = store.clone();
    BudgetService::new(store, BudgetLocks::default())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_seventy_percent_utilization() {
        let store = Arc::new(InMemoryCostStore::new());
        let tenant_id = Uuid::new_v4();
        let plan = purchasing_plan(&store, tenant_id).await;

        let status = budget_service(&store).summarize(tenant_id, plan.id).await.unwrap();

        assert_eq!(status.total_spent(), dec("7000000"));
        assert_eq!(status.utilization_rate, Decimal::from(70));
        assert_eq!(status.remaining_budget, dec("3000000"));
        assert!(!status.is_over_budget);
        assert_eq!(status.projected_overrun, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_summarize_does_not_write() {
        let store = Arc::new(InMemoryCostStore::new());
        let tenant_id = Uuid::new_v4();
        let plan = purchasing_plan(&store, tenant_id).await;

        budget_service(&store).summarize(tenant_id, plan.id).await.unwrap();

        assert_eq!(store.write_count().await, 0);
        assert!(store.plan(plan.id).await.unwrap().used_budget.is_none());
    }

    #[tokio::test]
    async fn test_track_persists_plan_figures() {
        let store = Arc::new(InMemoryCostStore::new());
        let tenant_id = Uuid::new_v4();
        let plan = purchasing_plan(&store, tenant_id).await;

        let tracking = budget_service(&store).track(tenant_id, plan.id).await.unwrap();

        let stored = store.plan(plan.id).await.unwrap();
        assert_eq!(stored.used_budget, Some(dec("7000000")));
        assert_eq!(stored.remaining_budget, Some(dec("3000000")));
        let spent = stored.category_spent.unwrap();
        assert_eq!(spent.protein, dec("3000000"));
        assert_eq!(spent.carbohydrate, dec("2500000"));
        assert_eq!(spent.vegetable, dec("1000000"));
        assert_eq!(spent.fruit, dec("500000"));
        assert_eq!(spent.other, Decimal::ZERO);

        assert_eq!(tracking.monthly.spent, dec("7000000"));
        assert_eq!(tracking.monthly.allocated, dec("10000000"));
        assert_eq!(tracking.monthly.plan_count, 1);
    }

    #[tokio::test]
    async fn test_operational_costs_count_toward_spend_only() {
        let fx = kitchen("50000").await;

        let status = budget_service(&fx.store)
            .summarize(fx.tenant_id, fx.plan.id)
            .await
            .unwrap();

        // Chicken purchase in protein; shipping, batch overhead and
        // distribution in the operational total
        assert_eq!(status.spend.category_spent.protein, dec("2000000"));
        assert_eq!(status.spend.procurement_spend, dec("2000000"));
        assert_eq!(status.spend.procurement_logistics, dec("50000"));
        assert_eq!(status.spend.production_overhead, dec("400000"));
        assert_eq!(status.spend.distribution_spend, dec("200000"));
        assert_eq!(status.spend.operational_spend, dec("650000"));
        assert_eq!(status.total_spent(), dec("2650000"));
    }

    #[tokio::test]
    async fn test_over_budget_reports_overrun() {
        let store = Arc::new(InMemoryCostStore::new());
        let tenant_id = Uuid::new_v4();
        let small = plan(tenant_id, "5000000", allocation("1000000", "1000000", "1000000", "1000000", "1000000"));
        store.insert_plan(small.clone()).await;
        store
            .insert_order(order(
                tenant_id,
                Some(small.id),
                Uuid::new_v4(),
                "UD Tani Makmur",
                date(2025, 3, 4),
                "0",
                "0",
                vec![line(None, "Telur", "PROTEIN", "30000", "200")],
            ))
            .await;

        let status = budget_service(&store).summarize(tenant_id, small.id).await.unwrap();

        assert!(status.is_over_budget);
        assert_eq!(status.projected_overrun, dec("1000000"));
        assert_eq!(status.remaining_budget, dec("-1000000"));
        assert_eq!(status.utilization_rate, Decimal::from(120));
    }

    #[tokio::test]
    async fn test_zero_budget_utilization_is_zero() {
        let store = Arc::new(InMemoryCostStore::new());
        let tenant_id = Uuid::new_v4();
        let empty = plan(tenant_id, "0", Default::default());
        store.insert_plan(empty.clone()).await;

        let status = budget_service(&store).summarize(tenant_id, empty.id).await.unwrap();

        assert_eq!(status.utilization_rate, Decimal::ZERO);
        assert!(!status.is_over_budget);
        assert!(status.categories.iter().all(|c| c.utilization_rate.is_zero()));
    }

    #[tokio::test]
    async fn test_monthly_aggregate_upserted_once() {
        let store = Arc::new(InMemoryCostStore::new());
        let tenant_id = Uuid::new_v4();
        let first = purchasing_plan(&store, tenant_id).await;
        let second = purchasing_plan(&store, tenant_id).await;
        let service = budget_service(&store);

        service.track(tenant_id, first.id).await.unwrap();
        service.track(tenant_id, first.id).await.unwrap();
        let latest = service.track(tenant_id, second.id).await.unwrap();

        assert_eq!(store.aggregate_count().await, 1);
        assert_eq!(latest.monthly.plan_count, 2);
        assert_eq!(latest.monthly.spent, dec("14000000"));
        assert_eq!(latest.monthly.allocated, dec("20000000"));
        assert_eq!(latest.monthly.utilization_rate, Decimal::from(70));

        let read_back = service.monthly(tenant_id, march()).await.unwrap();
        assert_eq!(read_back.id, latest.monthly.id);
    }

    #[tokio::test]
    async fn test_concurrent_tracking_keeps_single_aggregate() {
        let store = Arc::new(InMemoryCostStore::new());
        let tenant_id = Uuid::new_v4();
        let mut plan_ids = Vec::new();
        for _ in 0..4 {
            plan_ids.push(purchasing_plan(&store, tenant_id).await.id);
        }
        let service = budget_service(&store);

        let handles: Vec<_> = plan_ids
            .iter()
            .map(|&plan_id| {
                let service = service.clone();
                tokio::spawn(async move { service.track(tenant_id, plan_id).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let monthly = service.monthly(tenant_id, march()).await.unwrap();
        assert_eq!(store.aggregate_count().await, 1);
        assert_eq!(monthly.plan_count, 4);
        assert_eq!(monthly.spent, dec("28000000"));
    }

    #[tokio::test]
    async fn test_monthly_missing_is_not_found() {
        let store = Arc::new(InMemoryCostStore::new());
        let err = budget_service(&store).monthly(Uuid::new_v4(), march()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_plan_of_other_tenant_not_found() {
        let store = Arc::new(InMemoryCostStore::new());
        let plan = purchasing_plan(&store, Uuid::new_v4()).await;

        let err = budget_service(&store).track(Uuid::new_v4(), plan.id).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.write_count().await, 0);
    }

    #[tokio::test]
    async fn test_protein_overspend_is_significant() {
        let store = Arc::new(InMemoryCostStore::new());
        let tenant_id = Uuid::new_v4();
        let plan = purchasing_plan(&store, tenant_id).await;
        let store_dyn: Arc<dyn CostStore> = store.clone();
        let service = VarianceService::new(store_dyn, DEFAULT_SIGNIFICANT_VARIANCE_PERCENT);

        let report = service.analyze_plan(tenant_id, plan.id).await.unwrap();

        let protein = report
            .categories
            .iter()
            .find(|c| c.bucket == CategoryBucket::Protein)
            .unwrap();
        assert_eq!(protein.planned, dec("2000000"));
        assert_eq!(protein.actual, dec("3000000"));
        assert_eq!(protein.variance_percentage, Decimal::from(50));
        assert!(protein.is_significant);
        assert_eq!(report.significant_categories, vec![CategoryBucket::Protein]);

        assert_eq!(report.insights.len(), 2);
        assert!(report.insights[0].starts_with("Significant variance in: protein (+50"));
        assert!(report.insights[1].starts_with("Spending is 3000000"));
    }

    #[tokio::test]
    async fn test_negative_purchase_rejected_before_any_write() {
        let fx = kitchen("0").await;
        fx.store
            .insert_order(order(
                fx.tenant_id,
                Some(fx.plan.id),
                fx.supplier_id,
                "CV Sumber Pangan",
                date(2025, 3, 5),
                "-500000",
                "0",
                vec![line(Some(fx.chicken_id), "Ayam Potong", "PROTEIN", "-30000", "100")],
            ))
            .await;
        let service = budget_service(&fx.store);

        let err = service.track(fx.tenant_id, fx.plan.id).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(fx.store.write_count().await, 0);
        assert_eq!(fx.store.aggregate_count().await, 0);
        assert!(fx.store.plan(fx.plan.id).await.unwrap().used_budget.is_none());
        assert!(matches!(
            service.summarize(fx.tenant_id, fx.plan.id).await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_negative_distribution_cost_blocks_tracking() {
        let fx = kitchen("0").await;
        let mut broken = fx.event.clone();
        broken.packaging_cost = dec("-50000");
        fx.store.insert_event(broken).await;

        let err = budget_service(&fx.store).track(fx.tenant_id, fx.plan.id).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(fx.store.write_count().await, 0);
    }

    #[tokio::test]
    async fn test_over_allocated_plan_rejected_by_variance() {
        let store = Arc::new(InMemoryCostStore::new());
        let tenant_id = Uuid::new_v4();
        let greedy = plan(tenant_id, "1000000", allocation("1000000", "1000000", "0", "0", "0"));
        store.insert_plan(greedy.clone()).await;
        let store_dyn: Arc<dyn CostStore> = store.clone();
        let service = VarianceService::new(store_dyn, DEFAULT_SIGNIFICANT_VARIANCE_PERCENT);

        let err = service.analyze_plan(tenant_id, greedy.id).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_overrun_insight_comes_first() {
        let store = Arc::new(InMemoryCostStore::new());
        let tenant_id = Uuid::new_v4();
        let small = plan(tenant_id, "5000000", allocation("1000000", "1000000", "1000000", "1000000", "1000000"));
        store.insert_plan(small.clone()).await;
        store
            .insert_order(order(
                tenant_id,
                Some(small.id),
                Uuid::new_v4(),
                "UD Tani Makmur",
                date(2025, 3, 4),
                "0",
                "0",
                vec![
                    line(None, "Telur", "PROTEIN", "30000", "200"),
                    line(None, "Beras", "KARBOHIDRAT", "10000", "100"),
                    line(None, "Bayam", "SAYURAN", "5000", "200"),
                    line(None, "Pisang", "BUAH", "5000", "200"),
                ],
            ))
            .await;
        let store_dyn: Arc<dyn CostStore> = store.clone();
        let service = VarianceService::new(store_dyn, DEFAULT_SIGNIFICANT_VARIANCE_PERCENT);

        let report = service.analyze_plan(tenant_id, small.id).await.unwrap();

        // 9,000,000 spent against 5,000,000
        assert_eq!(report.total_actual, dec("9000000"));
        assert_eq!(report.significant_categories, vec![CategoryBucket::Protein]);
        assert_eq!(report.insights.len(), 2);
        assert!(report.insights[0].starts_with("Budget exceeded by"));
        assert!(report.insights[1].starts_with("Significant variance in: protein (+500"));
        assert!(report.insights.iter().all(|i| !i.contains("under plan")));
    }

    #[tokio::test]
    async fn test_stricter_threshold_flags_more_categories() {
        let store = Arc::new(InMemoryCostStore::new());
        let tenant_id = Uuid::new_v4();
        let plan = purchasing_plan(&store, tenant_id).await;
        let store_dyn: Arc<dyn CostStore> = store.clone();

        // every priced category is exactly on plan except protein
        let lenient = VarianceService::new(store_dyn.clone(), Decimal::from(60));
        let report = lenient.analyze_plan(tenant_id, plan.id).await.unwrap();
        assert!(report.significant_categories.is_empty());

        let strict = VarianceService::new(store_dyn, Decimal::from(10));
        let report = strict.analyze_plan(tenant_id, plan.id).await.unwrap();
        assert_eq!(report.significant_categories, vec![CategoryBucket::Protein]);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn category_code() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("PROTEIN".to_string()),
            Just("protein_nabati".to_string()),
            Just("KARBOHIDRAT".to_string()),
            Just("Sayuran".to_string()),
            Just("BUAH".to_string()),
            Just("SUSU_OLAHAN".to_string()),
            Just("BUMBU_REMPAH".to_string()),
            Just("MINYAK_LEMAK".to_string()),
            Just("MINUMAN".to_string()),
            Just("LAINNYA".to_string()),
            "[A-Z_]{1,12}",
        ]
    }

    proptest! {
        /// Every accepted line lands in exactly one bucket, so the buckets
        /// sum to the plan's procurement spend
        #[test]
        fn prop_buckets_are_exhaustive(
            lines in prop::collection::vec(
                (category_code(), 0i64..1_000_000, 0i64..500, any::<bool>()),
                0..20,
            )
        ) {
            let tenant_id = Uuid::new_v4();
            let items = lines
                .iter()
                .map(|(code, price, qty, accepted)| {
                    let mut l = line(None, "Bahan", code, &price.to_string(), &qty.to_string());
                    l.is_accepted = *accepted;
                    l
                })
                .collect::<Vec<_>>();
            let expected: Decimal = items.iter().map(|l| l.spend().unwrap()).sum();
            let o = order(tenant_id, None, Uuid::new_v4(), "Pemasok", date(2025, 3, 1), "0", "0", items);

            let buckets = bucket_spend(&[o]).unwrap();

            prop_assert_eq!(buckets.total().unwrap(), expected);
            let by_bucket: Decimal = CategoryBucket::ALL.iter().map(|&b| buckets.get(b)).sum();
            prop_assert_eq!(by_bucket, expected);
        }

        /// Zero allocations never fail and never divide
        #[test]
        fn prop_zero_allocation_is_safe(spent in 0i64..1_000_000_000) {
            let position = shared::budget::BudgetPosition::evaluate(
                Decimal::ZERO,
                Decimal::from(spent),
            ).unwrap();
            prop_assert_eq!(position.utilization_rate, Decimal::ZERO);
            prop_assert_eq!(position.projected_overrun, Decimal::from(spent));
        }
    }
}
