//! HTTP handlers

pub mod budget;
pub mod costing;
pub mod health;
pub mod reporting;

pub use budget::*;
pub use costing::*;
pub use health::*;
pub use reporting::*;

use serde::Deserialize;

/// Response format for report endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}
