//! Snapshot vs. master data reconciliation

use std::sync::Arc;

use shared::reconciliation::{reconcile, ReconciliationReport};
use uuid::Uuid;

use crate::error::AppResult;
use crate::store::{CostStore, OrderFilter};

#[derive(Clone)]
pub struct ReconciliationService {
    store: Arc<dyn CostStore>,
}

impl ReconciliationService {
    pub fn new(store: Arc<dyn CostStore>) -> Self {
        Self { store }
    }

    /// Compare every order snapshot matching the filter with current master data
    #[tracing::instrument(skip(self))]
    pub async fn report(&self, tenant_id: Uuid, filter: &OrderFilter) -> AppResult<ReconciliationReport> {
        let orders = self.store.list_procurement_orders(tenant_id, filter).await?;
        let report = reconcile(tenant_id, filter.date_range(), &orders)?;

        let summary = &report.summary;
        if report.has_drift() {
            tracing::warn!(
                "Master data drift: {} name changes, {} price changes, {} contact changes across {} orders",
                summary.total_name_changes,
                summary.total_price_changes,
                summary.supplier_contact_changes,
                summary.orders_examined
            );
        }
        if summary.missing_master_records > 0 {
            tracing::warn!(
                "{} snapshot references have no current master record",
                summary.missing_master_records
            );
        }

        Ok(report)
    }
}
