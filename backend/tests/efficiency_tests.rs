//! Distribution efficiency and plan pipeline tests

mod common;

use std::sync::Arc;

use chrono::Duration;
use common::*;
use meal_program_backend::config::CostingConfig;
use meal_program_backend::error::AppError;
use meal_program_backend::services::{BudgetLocks, CostPipeline, EfficiencyService};
use meal_program_backend::store::{CostStore, InMemoryCostStore};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

fn efficiency(store: &Arc<InMemoryCostStore>) -> EfficiencyService {
    let store: Arc<dyn CostStore> = store.clone();
    EfficiencyService::new(store, Duration::hours(24))
}

fn pipeline(store: &Arc<InMemoryCostStore>) -> CostPipeline {
    let store: Arc<dyn CostStore> = store.clone();
    CostPipeline::new(store, BudgetLocks::default(), &CostingConfig::default())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_late_on_time_and_undated_deliveries() {
        let fx = kitchen("0").await;
        let mut late = event(fx.tenant_id, Some(fx.plan.id), Some(fx.batch.id), "100000", "0", 200, Some(200));
        late.distribution_date = Some(late.created_at + Duration::hours(30));
        let mut undated = event(fx.tenant_id, Some(fx.plan.id), Some(fx.batch.id), "50000", "0", 100, Some(100));
        undated.distribution_date = None;
        let mut early = fx.event.clone();
        early.distribution_date = Some(early.created_at + Duration::hours(18));
        fx.store.insert_event(late).await;
        fx.store.insert_event(undated).await;
        fx.store.insert_event(early).await;

        let metrics = efficiency(&fx.store).compute(fx.tenant_id, fx.plan.id).await.unwrap();

        assert_eq!(metrics.total_distributions, 3);
        assert_eq!(metrics.on_time_count, 1);
        assert_eq!(metrics.late_count, 2);
        assert_eq!(metrics.on_time_percentage, Decimal::ONE / Decimal::from(3) * Decimal::ONE_HUNDRED);
        // 200,000 + 100,000 + 50,000
        assert_eq!(metrics.total_distribution_cost, dec("350000"));
        assert_eq!(metrics.total_meals_delivered, 780);
        assert_eq!(metrics.distribution_cost_per_meal, dec("350000") / dec("780"));
        // nothing composed yet
        assert_eq!(metrics.composed_distributions, 0);
        assert_eq!(metrics.uncomposed_distributions, 3);
        assert_eq!(metrics.overall_cost_per_meal, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_plan_without_distributions_reports_zeroes() {
        let store = Arc::new(InMemoryCostStore::new());
        let tenant_id = Uuid::new_v4();
        let empty = plan(tenant_id, "1000000", allocation("0", "0", "0", "0", "0"));
        store.insert_plan(empty.clone()).await;

        let metrics = efficiency(&store).compute(tenant_id, empty.id).await.unwrap();

        assert_eq!(metrics.total_distributions, 0);
        assert_eq!(metrics.on_time_percentage, Decimal::ZERO);
        assert_eq!(metrics.average_cost_per_distribution, Decimal::ZERO);
        assert_eq!(metrics.distribution_cost_per_meal, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_efficiency_for_missing_plan() {
        let fx = kitchen("0").await;

        let err = efficiency(&fx.store)
            .compute(Uuid::new_v4(), fx.plan.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_pipeline_runs_every_stage() {
        let fx = kitchen("0").await;

        let report = pipeline(&fx.store).run_for_plan(fx.tenant_id, fx.plan.id).await.unwrap();

        assert_eq!(report.plan_id, fx.plan.id);
        assert_eq!(report.cost_flows.len(), 1);
        assert_eq!(report.cost_flows[0].flow.total_cost, dec("2600000"));
        assert!(report.unlinked_distributions.is_empty());
        assert_eq!(report.budget.status.total_spent(), dec("2600000"));
        assert!(!report.budget.status.is_over_budget);
        assert_eq!(report.variance.plan_id, fx.plan.id);
        assert_eq!(report.efficiency.total_distributions, 1);
        assert_eq!(report.efficiency.on_time_count, 1);
        assert_eq!(report.efficiency.composed_distributions, 1);
        assert_eq!(report.efficiency.total_composed_cost, dec("2600000"));
        assert_eq!(report.efficiency.overall_cost_per_meal, dec("2600000") / dec("480"));
        assert_eq!(report.efficiency.distribution_cost_per_meal, dec("200000") / dec("480"));

        let event = fx.store.event(fx.event.id).await.unwrap();
        assert_eq!(event.computed.unwrap().total_cost, dec("2600000"));
        let stored = fx.store.plan(fx.plan.id).await.unwrap();
        assert_eq!(stored.used_budget, Some(dec("2600000")));
        assert_eq!(fx.store.aggregate_count().await, 1);
    }

    #[tokio::test]
    async fn test_pipeline_lists_unlinked_distributions() {
        let fx = kitchen("0").await;
        let orphan = event(fx.tenant_id, Some(fx.plan.id), None, "30000", "0", 50, Some(50));
        fx.store.insert_event(orphan.clone()).await;

        let report = pipeline(&fx.store).run_for_plan(fx.tenant_id, fx.plan.id).await.unwrap();

        assert_eq!(report.cost_flows.len(), 1);
        assert_eq!(report.unlinked_distributions, vec![orphan.id]);
        assert_eq!(report.efficiency.total_distributions, 2);
        assert_eq!(report.efficiency.uncomposed_distributions, 1);
        // only the composed event's meals carry the overall figure
        assert_eq!(report.efficiency.overall_cost_per_meal, dec("2600000") / dec("480"));
        assert!(fx.store.event(orphan.id).await.unwrap().computed.is_none());
    }

    #[tokio::test]
    async fn test_pipeline_validates_every_batch_before_writing() {
        let fx = kitchen("0").await;
        let mut outside = batch(fx.tenant_id, None, vec![], "0", "0", "0");
        outside.labor_cost = dec("-1");
        fx.store.insert_batch(outside.clone()).await;
        fx.store
            .insert_event(event(fx.tenant_id, Some(fx.plan.id), Some(outside.id), "10000", "0", 20, Some(20)))
            .await;

        let err = pipeline(&fx.store)
            .run_for_plan(fx.tenant_id, fx.plan.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(fx.store.write_count().await, 0);
        assert!(fx.store.event(fx.event.id).await.unwrap().computed.is_none());
    }

    #[tokio::test]
    async fn test_pipeline_rejects_invalid_distribution_before_writing() {
        let fx = kitchen("0").await;
        fx.store
            .insert_event(event(fx.tenant_id, Some(fx.plan.id), Some(fx.batch.id), "-10000", "0", 20, Some(20)))
            .await;

        let err = pipeline(&fx.store)
            .run_for_plan(fx.tenant_id, fx.plan.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(fx.store.write_count().await, 0);
    }

    #[tokio::test]
    async fn test_pipeline_stops_on_read_failure() {
        let fx = kitchen("0").await;
        fx.store.fail_reads(Some("connection reset")).await;

        let err = pipeline(&fx.store)
            .run_for_plan(fx.tenant_id, fx.plan.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(fx.store.write_count().await, 0);
        assert_eq!(fx.store.aggregate_count().await, 0);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// On-time and late counts always partition the distributions
        #[test]
        fn prop_on_time_and_late_partition(delays in prop::collection::vec(proptest::option::of(0i64..72), 0..10)) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let store = Arc::new(InMemoryCostStore::new());
                let tenant_id = Uuid::new_v4();
                let p = plan(tenant_id, "1000000", allocation("0", "0", "0", "0", "0"));
                store.insert_plan(p.clone()).await;
                for delay in &delays {
                    let mut e = event(tenant_id, Some(p.id), None, "1000", "0", 10, None);
                    e.distribution_date = delay.map(|h| e.created_at + Duration::hours(h));
                    store.insert_event(e).await;
                }

                let metrics = efficiency(&store).compute(tenant_id, p.id).await.unwrap();

                let expected_on_time = delays.iter().filter(|d| matches!(d, Some(h) if *h <= 24)).count();
                assert_eq!(metrics.total_distributions, delays.len());
                assert_eq!(metrics.on_time_count, expected_on_time);
                assert_eq!(metrics.on_time_count + metrics.late_count, delays.len());
                assert!(metrics.on_time_percentage <= Decimal::from(100));
            });
        }
    }
}
