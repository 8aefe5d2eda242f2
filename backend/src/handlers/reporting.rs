//! Reconciliation report handlers

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::ExportFormat;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{check_permission, CurrentUser, REPORTS_READ};
use crate::services::export::to_csv;
use crate::services::ReconciliationService;
use crate::store::OrderFilter;
use crate::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct ReconciliationQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub supplier_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    #[serde(default)]
    pub format: ExportFormat,
}

impl ReconciliationQuery {
    fn filter(&self) -> AppResult<OrderFilter> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(AppError::Validation {
                    field: "start_date".to_string(),
                    message: "start_date must not be after end_date".to_string(),
                    message_local: "Tanggal mulai tidak boleh setelah tanggal akhir".to_string(),
                });
            }
        }
        Ok(OrderFilter {
            start_date: self.start_date,
            end_date: self.end_date,
            supplier_id: self.supplier_id,
            plan_id: self.plan_id,
        })
    }
}

/// Snapshot vs. master data drift report
pub async fn get_reconciliation_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ReconciliationQuery>,
) -> AppResult<Response> {
    check_permission(&user, REPORTS_READ)?;
    let filter = query.filter()?;

    let service = ReconciliationService::new(state.store.clone());
    let report = service.report(user.tenant_id, &filter).await?;

    match query.format {
        ExportFormat::Csv => {
            let csv = to_csv(&report.rows())?;
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv"),
                    (header::CONTENT_DISPOSITION, "attachment; filename=\"reconciliation.csv\""),
                ],
                csv,
            )
                .into_response())
        }
        ExportFormat::Json => Ok(Json(report).into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_range_rejected() {
        let query = ReconciliationQuery {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 31),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..Default::default()
        };
        assert!(matches!(query.filter(), Err(AppError::Validation { .. })));
    }

    #[test]
    fn test_open_range_passes_through() {
        let query = ReconciliationQuery {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..Default::default()
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert!(filter.date_range().is_none());
    }
}
